use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, HttpTransport, Transport};

const DEFAULT_USER_AGENT: &str = concat!("gitlab-mcp/", env!("CARGO_PKG_VERSION"));

/// Typed GitLab API surface over a [`Transport`].
///
/// Resource wrappers live in [`crate::resources`]; each performs exactly one
/// request and returns GitLab's JSON document unchanged.
#[derive(Clone)]
pub struct GitlabClient {
    transport: Arc<dyn Transport>,
}

impl GitlabClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        self.transport.send(request).await
    }
}

/// Produces clients bound to a session's endpoint and token.
pub trait ClientFactory: Send + Sync {
    /// # Errors
    /// Returns an error when a client cannot be bound to `endpoint`.
    fn client(&self, endpoint: &Url, access_token: &str) -> ApiResult<GitlabClient>;
}

/// Settings for the shared HTTP connection pool.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl HttpClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory backed by one pooled `reqwest::Client`.
///
/// Binding a session is cheap: it only pairs the pool with a URL and token.
#[derive(Clone)]
pub struct HttpClientFactory {
    http: reqwest::Client,
}

impl HttpClientFactory {
    /// # Errors
    /// Returns `InvalidRequest` if the HTTP client cannot be constructed.
    pub fn new(config: &HttpClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::InvalidRequest(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(&self, endpoint: &Url, access_token: &str) -> ApiResult<GitlabClient> {
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "endpoint {endpoint} cannot be used as a base URL"
            )));
        }
        let transport = HttpTransport::new(self.http.clone(), endpoint, access_token);
        Ok(GitlabClient::new(Arc::new(transport)))
    }
}
