//! MCP server exposing GitLab REST operations as tools.
//!
//! The tool set is fixed when the [`ToolRegistry`] is built; each served
//! session carries its own [`SessionContext`] and every call is dispatched
//! through the registry with that context.

pub mod catalog;
pub mod error;
pub mod helpers;
pub mod registry;
pub mod server;
pub mod tools;
pub mod validate;

use std::sync::Arc;

use gitlab_api::{ClientFactory, SessionContext};
use rmcp::model::{
    CallToolRequestParams,
    CallToolResult,
    JsonObject,
    ListToolsResult,
    PaginatedRequestParams,
    ServerCapabilities,
    ServerInfo,
    Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use catalog::{ToolDescriptor, ToolParams};
pub use error::{ErrorKind, RegistrationError, ToolError};
pub use registry::{ToolRegistry, is_exposed};

const SERVER_INSTRUCTIONS: &str = r"gitlab-mcp provides MCP tools for one GitLab instance.

Identifiers:
- `project_id` is a numeric id or a full `namespace/project` path.
- `issue_iid` and `merge_request_iid` are the project-scoped numbers shown in the GitLab UI (#7, !3).
- `pipeline_id` is the global pipeline id.

Tools:
- Projects: `list_projects`, `get_project`.
- Issues: `list_issues`, `get_issue`, `list_issue_notes`, plus `create_issue`, `update_issue`,
  `create_issue_note` when writes are enabled.
- Merge requests: `list_merge_requests`, `get_merge_request`, `get_merge_request_diffs`, plus
  `create_merge_request`, `update_merge_request`, `merge_merge_request`,
  `create_merge_request_note` when writes are enabled.
- Pipelines: `list_pipelines`, `get_pipeline`, `list_pipeline_jobs`, plus `retry_pipeline`,
  `cancel_pipeline` when writes are enabled.
- Repository: `list_branches`, `get_branch`, `get_file_contents`, `list_repository_tree`,
  `list_commits`, `get_commit`, plus `create_branch` when writes are enabled.
- `get_current_user` shows which account the token belongs to.

Notes:
- The server starts read-only by default; write tools are simply not listed then.
- List tools return one page. Use `page` and `per_page` (max 100) to walk further.
- Errors carry `data.kind`: `invalid_params`, `not_found`, `unauthorized`, `rate_limited`,
  `upstream`, `internal` or `cancelled`. Retry only `rate_limited`, after `retry_after_secs`.";

/// MCP server bound to one session's GitLab credentials.
#[derive(Clone)]
pub struct GitlabMcp {
    registry: Arc<ToolRegistry>,
    clients: Arc<dyn ClientFactory>,
    session: SessionContext,
    shutdown: CancellationToken,
}

impl GitlabMcp {
    /// Creates a server for one session. `session` should already carry the
    /// endpoint and token.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        clients: Arc<dyn ClientFactory>,
        session: SessionContext,
    ) -> Self {
        Self {
            registry,
            clients,
            session,
            shutdown: CancellationToken::new(),
        }
    }

    /// Binds in-flight calls to an external shutdown token.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The registered tools as advertised to clients.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .descriptors()
            .iter()
            .map(ToolDescriptor::to_tool)
            .collect()
    }

    /// Runs one tool call and wraps the outcome in an MCP envelope.
    ///
    /// The call is abandoned, and its HTTP request dropped, as soon as either
    /// `cancel` or the server shutdown token fires.
    ///
    /// # Errors
    /// Returns the error envelope for unknown tools, validation failures,
    /// upstream failures and cancellation.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ErrorData> {
        if !self.registry.contains(name) {
            debug!(tool = name, "call for unregistered tool");
            return Err(helpers::unknown_tool(name));
        }

        let dispatch =
            self.registry
                .dispatch(name, arguments, &self.session, self.clients.as_ref());
        tokio::select! {
            outcome = dispatch => match outcome {
                Ok(payload) => helpers::success(payload),
                Err(err) => Err(helpers::tool_error(&err)),
            },
            () = cancel.cancelled() => {
                debug!(tool = name, "tool call cancelled by client");
                Err(helpers::cancelled(name))
            }
            () = self.shutdown.cancelled() => {
                debug!(tool = name, "tool call cancelled by shutdown");
                Err(helpers::cancelled(name))
            }
        }
    }
}

impl ServerHandler for GitlabMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.tools(),
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.invoke(&request.name, request.arguments, &context.ct)
            .await
    }
}
