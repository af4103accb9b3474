//! HTTP plumbing for the GitLab REST API.
//!
//! [`Transport`] is the seam between typed call wrappers and the network. The
//! production implementation is [`HttpTransport`]; tests substitute canned
//! responders.

use std::fmt;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderValue, RETRY_AFTER};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// True for verbs that change remote state.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// One call against `/api/v4`, described independently of any HTTP client.
///
/// `segments` are raw path segments; each is percent-encoded on its own so a
/// `group/project` path stays a single segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|segment| (*segment).to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments)
    }

    #[must_use]
    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::Post, segments)
    }

    #[must_use]
    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::Put, segments)
    }

    #[must_use]
    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::Delete, segments)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::InvalidRequest(format!("unserializable body: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Path relative to `/api/v4`, unencoded. Used for logging.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Executes API requests and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value>;
}

/// Transport bound to one endpoint and token.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    access_token: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: &Url, access_token: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.clone(),
            access_token: access_token.to_string(),
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the outgoing HTTP request without sending it.
    ///
    /// # Errors
    /// Returns `InvalidRequest` for an unusable endpoint or token.
    pub fn build_request(&self, request: &ApiRequest) -> ApiResult<reqwest::Request> {
        let url = api_url(&self.endpoint, &request.segments, &request.query)?;
        let mut builder = self
            .http
            .request(request.method.into(), url)
            .header(ACCEPT, "application/json");

        if !self.access_token.is_empty() {
            let mut token = HeaderValue::from_str(&self.access_token).map_err(|_| {
                ApiError::InvalidRequest("access token is not a valid header value".to_string())
            })?;
            token.set_sensitive(true);
            builder = builder.header(PRIVATE_TOKEN_HEADER, token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.build().map_err(ApiError::from)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let http_request = self.build_request(&request)?;
        debug!(method = %request.method, path = %request.path(), "sending GitLab request");

        let response = self.http.execute(http_request).await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), path = %request.path(), "GitLab request failed");
            return Err(ApiError::from_status(status.as_u16(), retry_after, &body));
        }
        decode_body(&body)
    }
}

/// Resolves `segments` against `<endpoint>/api/v4`.
///
/// # Errors
/// Returns `InvalidRequest` when the endpoint cannot carry a path.
pub fn api_url(endpoint: &Url, segments: &[String], query: &[(String, String)]) -> ApiResult<Url> {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url.path_segments_mut().map_err(|()| {
            ApiError::InvalidRequest(format!("endpoint {endpoint} cannot be used as a base URL"))
        })?;
        path.pop_if_empty().push("api").push("v4");
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    }
    Ok(url)
}

/// Decodes a successful response body. Empty bodies (e.g. 204) become `null`.
///
/// # Errors
/// Returns `Decode` for bodies that are not JSON.
pub fn decode_body(body: &str) -> ApiResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(endpoint: &str, token: &str) -> HttpTransport {
        let endpoint = Url::parse(endpoint).expect("valid endpoint");
        HttpTransport::new(reqwest::Client::new(), &endpoint, token)
    }

    #[test]
    fn encodes_project_paths_as_single_segment() {
        let endpoint = Url::parse("https://gitlab.example.com").expect("valid endpoint");
        let request = ApiRequest::get(&["projects", "group/sub/project", "issues"])
            .query("state", "opened");
        let url = api_url(&endpoint, &request.segments, &request.query).expect("url");
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fsub%2Fproject/issues?state=opened"
        );
    }

    #[test]
    fn keeps_endpoint_subpath() {
        let endpoint = Url::parse("https://example.com/gitlab/").expect("valid endpoint");
        let url = api_url(&endpoint, &["user".to_string()], &[]).expect("url");
        assert_eq!(url.as_str(), "https://example.com/gitlab/api/v4/user");
    }

    #[test]
    fn sets_private_token_when_present() {
        let transport = transport("https://gitlab.example.com", "abc");
        let request = transport
            .build_request(&ApiRequest::get(&["user"]))
            .expect("request");
        let header = request.headers().get(PRIVATE_TOKEN_HEADER).expect("token header");
        assert_eq!(header.to_str().ok(), Some("abc"));
        assert!(header.is_sensitive());
    }

    #[test]
    fn omits_token_for_anonymous_sessions() {
        let transport = transport("https://gitlab.example.com", "");
        let request = transport
            .build_request(&ApiRequest::get(&["projects"]))
            .expect("request");
        assert!(request.headers().get(PRIVATE_TOKEN_HEADER).is_none());
    }

    #[test]
    fn attaches_json_body_and_method() {
        let transport = transport("https://gitlab.example.com", "abc");
        let request = ApiRequest::post(&["projects", "42", "issues"])
            .json(&serde_json::json!({ "title": "Bug" }))
            .expect("body");
        let built = transport.build_request(&request).expect("request");
        assert_eq!(built.method(), reqwest::Method::POST);
        let body = built.body().and_then(reqwest::Body::as_bytes).expect("buffered body");
        assert_eq!(body, br#"{"title":"Bug"}"#);
    }

    #[test]
    fn decodes_empty_body_as_null() {
        assert_eq!(decode_body("").expect("null"), Value::Null);
        assert!(matches!(decode_body("<html>"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn only_get_is_read_only() {
        assert!(!Method::Get.is_mutating());
        assert!(Method::Post.is_mutating());
        assert!(Method::Put.is_mutating());
        assert!(Method::Delete.is_mutating());
    }
}
