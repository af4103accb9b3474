use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::catalog::{ToolDescriptor, ToolParams};

/// `get_current_user` takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetCurrentUserParams {}

impl ToolParams for GetCurrentUserParams {}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::read_only(
        "get_current_user",
        "Get the user the configured access token belongs to.",
        |client, _params: GetCurrentUserParams| async move { client.current_user().await },
    )]
}
