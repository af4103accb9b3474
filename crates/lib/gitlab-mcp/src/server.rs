//! MCP server runner for gitlab-mcp.

use std::sync::Arc;

use gitlab_api::{ClientFactory, SessionContext, Url};
use rmcp::ServiceExt;
use rmcp::service::QuitReason;
use rmcp::transport::io::stdio;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::GitlabMcp;
use crate::registry::ToolRegistry;

/// Serves the MCP server over stdio until the peer disconnects or
/// `shutdown` is cancelled.
///
/// The session context is attached here, once, before the first frame is
/// read.
///
/// # Errors
/// Returns any transport or server initialization error.
pub async fn serve_stdio(
    registry: Arc<ToolRegistry>,
    clients: Arc<dyn ClientFactory>,
    endpoint_url: Url,
    access_token: String,
    shutdown: CancellationToken,
) -> Result<QuitReason, Box<dyn std::error::Error + Send + Sync>> {
    let authenticated = !access_token.is_empty();
    let session = SessionContext::new().attach(endpoint_url, access_token);
    info!(
        endpoint = session.endpoint_url().map(Url::as_str),
        authenticated,
        tools = registry.len(),
        readonly = registry.readonly(),
        "serving MCP over stdio"
    );

    let service = GitlabMcp::new(registry, clients, session).with_shutdown(shutdown.clone());
    let running = service.serve_with_ct(stdio(), shutdown).await?;
    let reason = running.waiting().await?;
    info!(?reason, "MCP session ended");
    Ok(reason)
}
