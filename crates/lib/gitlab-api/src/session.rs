//! Per-connection credential carrier.
//!
//! A [`SessionContext`] is attached once when a stdio session starts and then
//! shared read-only with every tool invocation served on that session.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;

/// Immutable endpoint URL and access token for one served connection.
///
/// A default context is unattached: both accessors return `None`.
#[derive(Clone, Default)]
pub struct SessionContext {
    credentials: Option<Arc<Credentials>>,
}

struct Credentials {
    endpoint_url: Url,
    access_token: String,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context carrying exactly `endpoint_url` and `access_token`.
    ///
    /// The receiver is left untouched, so attaching twice with the same values
    /// yields equal contexts.
    #[must_use]
    pub fn attach(&self, endpoint_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            credentials: Some(Arc::new(Credentials {
                endpoint_url,
                access_token: access_token.into(),
            })),
        }
    }

    #[must_use]
    pub fn endpoint_url(&self) -> Option<&Url> {
        self.credentials.as_ref().map(|creds| &creds.endpoint_url)
    }

    /// The attached token. An empty string means the session is unauthenticated.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .map(|creds| creds.access_token.as_str())
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.credentials.is_some()
    }
}

impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint_url() == other.endpoint_url() && self.access_token() == other.access_token()
    }
}

impl Eq for SessionContext {}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self.access_token() {
            None => "<none>",
            Some("") => "<empty>",
            Some(_) => "<redacted>",
        };
        f.debug_struct("SessionContext")
            .field("endpoint_url", &self.endpoint_url().map(Url::as_str))
            .field("access_token", &token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(value: &str) -> Url {
        Url::parse(value).expect("valid url")
    }

    #[test]
    fn unattached_context_has_no_credentials() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_attached());
        assert!(ctx.endpoint_url().is_none());
        assert!(ctx.access_token().is_none());
    }

    #[test]
    fn attach_exposes_exact_values() {
        let base = SessionContext::new();
        let ctx = base.attach(url("https://gitlab.example.com"), "abc");

        assert_eq!(
            ctx.endpoint_url().map(Url::as_str),
            Some("https://gitlab.example.com/")
        );
        assert_eq!(ctx.access_token(), Some("abc"));
        assert!(!base.is_attached());
    }

    #[test]
    fn attach_is_idempotent() {
        let base = SessionContext::new();
        let first = base.attach(url("https://gitlab.example.com"), "abc");
        let second = base.attach(url("https://gitlab.example.com"), "abc");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_token_is_present_but_empty() {
        let ctx = SessionContext::new().attach(url("https://127.0.0.1"), "");
        assert_eq!(ctx.access_token(), Some(""));
    }

    #[test]
    fn debug_output_redacts_token() {
        let ctx = SessionContext::new().attach(url("https://gitlab.example.com"), "glpat-secret");
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("glpat-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
