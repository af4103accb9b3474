use gitlab_api::Page;
use gitlab_api::resources::{MergeOptions, MergeRequestListQuery, MergeRequestUpdate, NewMergeRequest};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{StateEvent, check_optional_title, check_paging, require_iid, require_not_blank, wire_name};
use crate::catalog::{ToolDescriptor, ToolParams};
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Locked,
    Merged,
    All,
}

/// Parameters for listing a project's merge requests.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListMergeRequestsParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub state: Option<MergeRequestState>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub labels: Option<Vec<String>>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListMergeRequestsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters addressing one merge request.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetMergeRequestParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Project-scoped merge request number.
    pub merge_request_iid: String,
}

impl ToolParams for GetMergeRequestParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("merge_request_iid", &self.merge_request_iid)
    }
}

/// Parameters for listing the file diffs of a merge request.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetMergeRequestDiffsParams {
    pub project_id: String,
    pub merge_request_iid: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for GetMergeRequestDiffsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("merge_request_iid", &self.merge_request_iid)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters for opening a merge request.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateMergeRequestParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    /// Markdown body.
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<u64>>,
    /// Delete the source branch once merged.
    pub remove_source_branch: Option<bool>,
    pub squash: Option<bool>,
}

impl ToolParams for CreateMergeRequestParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("source_branch", &self.source_branch)?;
        require_not_blank("target_branch", &self.target_branch)?;
        require_not_blank("title", &self.title)
    }
}

/// Parameters for editing a merge request. Omitted fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateMergeRequestParams {
    pub project_id: String,
    pub merge_request_iid: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_branch: Option<String>,
    /// Replaces the label set.
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<u64>>,
    pub state_event: Option<StateEvent>,
}

impl ToolParams for UpdateMergeRequestParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("merge_request_iid", &self.merge_request_iid)?;
        check_optional_title(self.title.as_deref())
    }
}

/// Parameters for accepting a merge request.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergeMergeRequestParams {
    pub project_id: String,
    pub merge_request_iid: String,
    pub merge_commit_message: Option<String>,
    pub squash: Option<bool>,
    pub should_remove_source_branch: Option<bool>,
    /// Merge only if the source branch head still matches this commit.
    pub sha: Option<String>,
}

impl ToolParams for MergeMergeRequestParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("merge_request_iid", &self.merge_request_iid)
    }
}

/// Parameters for commenting on a merge request.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateMergeRequestNoteParams {
    pub project_id: String,
    pub merge_request_iid: String,
    /// Markdown comment text.
    pub body: String,
}

impl ToolParams for CreateMergeRequestNoteParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("merge_request_iid", &self.merge_request_iid)?;
        require_not_blank("body", &self.body)
    }
}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::read_only(
            "list_merge_requests",
            "List merge requests in a project, optionally filtered by state, branches or labels.",
            |client, params: ListMergeRequestsParams| async move {
                let query = MergeRequestListQuery {
                    state: params.state.as_ref().and_then(wire_name),
                    source_branch: params.source_branch,
                    target_branch: params.target_branch,
                    labels: params.labels.unwrap_or_default(),
                    search: params.search,
                    page: Page::new(params.page, params.per_page),
                };
                client.list_merge_requests(&params.project_id, &query).await
            },
        ),
        ToolDescriptor::read_only(
            "get_merge_request",
            "Get a single merge request by its project-scoped iid.",
            |client, params: GetMergeRequestParams| async move {
                client
                    .get_merge_request(&params.project_id, &params.merge_request_iid)
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "get_merge_request_diffs",
            "List the per-file diffs of a merge request.",
            |client, params: GetMergeRequestDiffsParams| async move {
                client
                    .get_merge_request_diffs(
                        &params.project_id,
                        &params.merge_request_iid,
                        Page::new(params.page, params.per_page),
                    )
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "create_merge_request",
            "Open a merge request from source_branch into target_branch.",
            |client, params: CreateMergeRequestParams| async move {
                let merge_request = NewMergeRequest {
                    source_branch: params.source_branch,
                    target_branch: params.target_branch,
                    title: params.title,
                    description: params.description,
                    labels: params.labels,
                    assignee_ids: params.assignee_ids,
                    remove_source_branch: params.remove_source_branch,
                    squash: params.squash,
                };
                client
                    .create_merge_request(&params.project_id, &merge_request)
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "update_merge_request",
            "Edit a merge request, or close/reopen it with state_event.",
            |client, params: UpdateMergeRequestParams| async move {
                let update = MergeRequestUpdate {
                    title: params.title,
                    description: params.description,
                    target_branch: params.target_branch,
                    labels: params.labels,
                    assignee_ids: params.assignee_ids,
                    state_event: params.state_event.as_ref().and_then(wire_name),
                };
                client
                    .update_merge_request(&params.project_id, &params.merge_request_iid, &update)
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "merge_merge_request",
            "Accept and merge a merge request.",
            |client, params: MergeMergeRequestParams| async move {
                let options = MergeOptions {
                    merge_commit_message: params.merge_commit_message,
                    squash: params.squash,
                    should_remove_source_branch: params.should_remove_source_branch,
                    sha: params.sha,
                };
                client
                    .merge_merge_request(&params.project_id, &params.merge_request_iid, &options)
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "create_merge_request_note",
            "Add a comment to a merge request.",
            |client, params: CreateMergeRequestNoteParams| async move {
                client
                    .create_merge_request_note(
                        &params.project_id,
                        &params.merge_request_iid,
                        &params.body,
                    )
                    .await
            },
        ),
    ]
}
