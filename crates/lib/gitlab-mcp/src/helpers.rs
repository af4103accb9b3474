//! Conversion of dispatch outcomes into MCP result and error envelopes.

use std::borrow::Cow;

use gitlab_api::ApiError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ToolError};

/// Server-defined code for missing or rejected credentials.
pub const UNAUTHORIZED: ErrorCode = ErrorCode(-32001);
/// Server-defined code for GitLab rate limiting.
pub const RATE_LIMITED: ErrorCode = ErrorCode(-32029);
/// Server-defined code for any other upstream failure.
pub const UPSTREAM: ErrorCode = ErrorCode(-32050);
/// Server-defined code for calls abandoned because of cancellation.
pub const CANCELLED: ErrorCode = ErrorCode(-32800);

fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>, data: Option<Value>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data,
    }
}

/// JSON-RPC error code reported for `kind`.
#[must_use]
pub const fn error_code(kind: ErrorKind) -> ErrorCode {
    match kind {
        ErrorKind::InvalidParams => ErrorCode::INVALID_PARAMS,
        ErrorKind::NotFound => ErrorCode::RESOURCE_NOT_FOUND,
        ErrorKind::Unauthorized => UNAUTHORIZED,
        ErrorKind::RateLimited => RATE_LIMITED,
        ErrorKind::Upstream => UPSTREAM,
        ErrorKind::Internal => ErrorCode::INTERNAL_ERROR,
        ErrorKind::Cancelled => CANCELLED,
    }
}

fn error_data(kind: ErrorKind) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("kind".to_string(), Value::from(kind.as_str()));
    data
}

/// Error envelope for a failed invocation.
#[must_use]
pub fn tool_error(err: &ToolError) -> ErrorData {
    let kind = err.kind();
    let mut data = error_data(kind);
    if let Some(parameter) = err.parameter() {
        data.insert("parameter".to_string(), Value::from(parameter));
    }
    if let ToolError::Upstream(upstream) = err {
        annotate_upstream(&mut data, upstream);
    }
    mcp_err(error_code(kind), err.to_string(), Some(Value::Object(data)))
}

fn annotate_upstream(data: &mut Map<String, Value>, err: &ApiError) {
    if let Some(status) = err.status() {
        data.insert("status".to_string(), Value::from(status));
    }
    if let Some(seconds) = err.retry_after() {
        data.insert("retry_after_secs".to_string(), Value::from(seconds));
    }
}

/// Error envelope for a name that was never registered.
#[must_use]
pub fn unknown_tool(name: &str) -> ErrorData {
    let mut data = error_data(ErrorKind::InvalidParams);
    data.insert("tool".to_string(), Value::from(name));
    mcp_err(
        ErrorCode::INVALID_PARAMS,
        format!("tool not found: {name}"),
        Some(Value::Object(data)),
    )
}

/// Error envelope for a call abandoned by cancellation or shutdown.
#[must_use]
pub fn cancelled(name: &str) -> ErrorData {
    mcp_err(
        CANCELLED,
        format!("tool call {name} was cancelled"),
        Some(Value::Object(error_data(ErrorKind::Cancelled))),
    )
}

/// Success envelope carrying the GitLab payload as JSON content.
///
/// # Errors
/// Returns an internal error if the payload cannot be rendered.
pub fn success(payload: Value) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::json(payload)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_found_and_unauthorized_use_distinct_codes() {
        let not_found = tool_error(&ToolError::from(ApiError::from_status(404, None, "")));
        let forbidden = tool_error(&ToolError::from(ApiError::from_status(403, None, "")));

        assert_eq!(not_found.code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(forbidden.code, UNAUTHORIZED);
        assert_eq!(not_found.data, Some(json!({ "kind": "not_found", "status": 404 })));
        assert_eq!(forbidden.data, Some(json!({ "kind": "unauthorized", "status": 403 })));
    }

    #[test]
    fn rate_limit_carries_retry_hint() {
        let err = tool_error(&ToolError::from(ApiError::from_status(429, Some(30), "")));
        assert_eq!(err.code, RATE_LIMITED);
        assert_eq!(
            err.data,
            Some(json!({ "kind": "rate_limited", "status": 429, "retry_after_secs": 30 }))
        );
    }

    #[test]
    fn validation_names_parameter() {
        let err = tool_error(&ToolError::invalid_param("issue_iid", "missing required parameter"));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            err.data,
            Some(json!({ "kind": "invalid_params", "parameter": "issue_iid" }))
        );
        assert!(err.message.contains("issue_iid"));
    }

    #[test]
    fn internal_and_cancelled_are_distinguished() {
        let internal = tool_error(&ToolError::Internal("broken".to_string()));
        let stopped = cancelled("list_issues");
        assert_eq!(internal.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(stopped.code, CANCELLED);
        assert_eq!(stopped.data, Some(json!({ "kind": "cancelled" })));
    }

    #[test]
    fn unknown_tool_is_invalid_params() {
        let err = unknown_tool("create_issue");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("tool not found"));
    }
}
