use gitlab_api::Page;
use gitlab_api::resources::ProjectListQuery;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{check_paging, require_not_blank, wire_name};
use crate::catalog::{ToolDescriptor, ToolParams};
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectOrder {
    Id,
    Name,
    Path,
    CreatedAt,
    UpdatedAt,
    LastActivityAt,
}

/// Parameters for listing projects visible to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListProjectsParams {
    /// Match against project name or path.
    pub search: Option<String>,
    /// Only projects owned by the current user.
    pub owned: Option<bool>,
    /// Only projects the current user is a member of.
    pub membership: Option<bool>,
    pub starred: Option<bool>,
    pub visibility: Option<Visibility>,
    pub order_by: Option<ProjectOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListProjectsParams {
    fn validate(&self) -> Result<(), ToolError> {
        check_paging(self.page, self.per_page)
    }
}

/// Parameters for fetching a single project.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetProjectParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
}

impl ToolParams for GetProjectParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)
    }
}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::read_only(
            "list_projects",
            "List projects visible to the authenticated user. Returns one page.",
            |client, params: ListProjectsParams| async move {
                let query = ProjectListQuery {
                    search: params.search,
                    owned: params.owned,
                    membership: params.membership,
                    starred: params.starred,
                    visibility: params.visibility.as_ref().and_then(wire_name),
                    order_by: params.order_by.as_ref().and_then(wire_name),
                    page: Page::new(params.page, params.per_page),
                };
                client.list_projects(&query).await
            },
        ),
        ToolDescriptor::read_only(
            "get_project",
            "Get a project by numeric id or namespace path.",
            |client, params: GetProjectParams| async move {
                client.get_project(&params.project_id).await
            },
        ),
    ]
}
