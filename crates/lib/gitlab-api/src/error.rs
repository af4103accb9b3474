use std::error::Error;
use std::fmt;

use serde_json::Value;

/// Failure returned by a GitLab API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound { message: String },
    Unauthorized { message: String },
    Forbidden { message: String },
    RateLimited { retry_after: Option<u64>, message: String },
    Status { status: u16, message: String },
    Transport(String),
    Timeout(String),
    Decode(String),
    InvalidRequest(String),
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    NotFound,
    Unauthorized,
    RateLimited,
    Other,
}

impl ApiErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Other => "upstream",
        }
    }
}

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        match self {
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::Unauthorized { .. } | Self::Forbidden { .. } => ApiErrorKind::Unauthorized,
            Self::RateLimited { .. } => ApiErrorKind::RateLimited,
            Self::Status { .. }
            | Self::Transport(_)
            | Self::Timeout(_)
            | Self::Decode(_)
            | Self::InvalidRequest(_) => ApiErrorKind::Other,
        }
    }

    /// HTTP status of the upstream response, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Maps a non-success HTTP status and its body to an error.
    #[must_use]
    pub fn from_status(status: u16, retry_after: Option<u64>, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| default_message(status));
        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            429 => Self::RateLimited {
                retry_after,
                message,
            },
            _ => Self::Status { status, message },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { message } => write!(f, "not found: {message}"),
            Self::Unauthorized { message } => write!(f, "unauthorized: {message}"),
            Self::Forbidden { message } => write!(f, "forbidden: {message}"),
            Self::RateLimited {
                retry_after: Some(secs),
                message,
            } => write!(f, "rate limited (retry after {secs}s): {message}"),
            Self::RateLimited {
                retry_after: None,
                message,
            } => write!(f, "rate limited: {message}"),
            Self::Status { status, message } => write!(f, "GitLab returned {status}: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Timeout(message) => write!(f, "request timed out: {message}"),
            Self::Decode(message) => write!(f, "malformed response body: {message}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Pulls a human-readable message out of a GitLab error body.
///
/// GitLab uses `message` (string, list, or field map), `error`, and
/// `error_description` depending on the endpoint.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(truncate(trimmed));
    };
    let object = value.as_object()?;
    for key in ["message", "error_description", "error"] {
        if let Some(text) = object.get(key).and_then(flatten_message) {
            return Some(text);
        }
    }
    None
}

fn flatten_message(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_message).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .filter_map(|(field, detail)| {
                    flatten_message(detail).map(|text| format!("{field} {text}"))
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 512;
    if text.len() <= LIMIT {
        return text.to_string();
    }
    let mut end = LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

fn default_message(status: u16) -> String {
    match status {
        401 => "authentication required".to_string(),
        403 => "access denied".to_string(),
        404 => "resource not found".to_string(),
        429 => "too many requests".to_string(),
        _ => format!("HTTP status {status}"),
    }
}
