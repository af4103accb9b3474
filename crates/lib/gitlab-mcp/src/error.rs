use std::error::Error;
use std::fmt;

use gitlab_api::{ApiError, ApiErrorKind};

/// Coarse failure class reported to the calling agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParams,
    NotFound,
    Unauthorized,
    RateLimited,
    Upstream,
    Internal,
    Cancelled,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidParams => "invalid_params",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable per-invocation failure.
#[derive(Debug)]
pub enum ToolError {
    InvalidParams {
        parameter: Option<String>,
        message: String,
    },
    Upstream(ApiError),
    Internal(String),
}

impl ToolError {
    pub fn invalid_param(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            parameter: Some(parameter.into()),
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            parameter: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParams { .. } => ErrorKind::InvalidParams,
            Self::Upstream(err) => match err.kind() {
                ApiErrorKind::NotFound => ErrorKind::NotFound,
                ApiErrorKind::Unauthorized => ErrorKind::Unauthorized,
                ApiErrorKind::RateLimited => ErrorKind::RateLimited,
                ApiErrorKind::Other => ErrorKind::Upstream,
            },
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidParams { parameter, .. } => parameter.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams {
                parameter: Some(parameter),
                message,
            } => write!(f, "invalid parameter `{parameter}`: {message}"),
            Self::InvalidParams {
                parameter: None,
                message,
            } => write!(f, "invalid parameters: {message}"),
            Self::Upstream(err) => write!(f, "{err}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        Self::Upstream(err)
    }
}

/// Startup failure while building the registered tool set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    DuplicateName(String),
    InvalidName(String),
    MalformedSchema { tool: String, reason: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "duplicate tool name: {name}"),
            Self::InvalidName(name) => write!(f, "invalid tool name: {name:?}"),
            Self::MalformedSchema { tool, reason } => {
                write!(f, "malformed parameter schema for {tool}: {reason}")
            }
        }
    }
}

impl Error for RegistrationError {}
