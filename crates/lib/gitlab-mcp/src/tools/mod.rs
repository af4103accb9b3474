//! The GitLab tool catalog.
//!
//! Each submodule declares parameter types and descriptors for one resource
//! family. Handlers translate parameters into a single `GitlabClient` call.

mod issues;
mod merge_requests;
mod pipelines;
mod projects;
mod repository;
mod users;

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ToolDescriptor;
use crate::error::ToolError;

pub use issues::{
    CreateIssueNoteParams,
    CreateIssueParams,
    GetIssueParams,
    IssueState,
    ListIssueNotesParams,
    ListIssuesParams,
    UpdateIssueParams,
};
pub use merge_requests::{
    CreateMergeRequestNoteParams,
    CreateMergeRequestParams,
    GetMergeRequestDiffsParams,
    GetMergeRequestParams,
    ListMergeRequestsParams,
    MergeMergeRequestParams,
    MergeRequestState,
    UpdateMergeRequestParams,
};
pub use pipelines::{
    JobScope,
    ListPipelineJobsParams,
    ListPipelinesParams,
    PipelineParams,
    PipelineStatus,
};
pub use projects::{GetProjectParams, ListProjectsParams, ProjectOrder, Visibility};
pub use repository::{
    CreateBranchParams,
    GetBranchParams,
    GetCommitParams,
    GetFileContentsParams,
    ListBranchesParams,
    ListCommitsParams,
    ListRepositoryTreeParams,
};
pub use users::GetCurrentUserParams;

/// Largest page size GitLab accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Every tool this server declares, in declaration order, before any
/// read-only filtering.
#[must_use]
pub fn catalog() -> Vec<ToolDescriptor> {
    [
        projects::descriptors(),
        issues::descriptors(),
        merge_requests::descriptors(),
        pipelines::descriptors(),
        repository::descriptors(),
        users::descriptors(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// State transition for issues and merge requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StateEvent {
    Close,
    Reopen,
}

pub(crate) fn require_not_blank(parameter: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid_param(parameter, "must not be blank"));
    }
    Ok(())
}

/// Project-scoped ids (`iid`s) and pipeline ids are positive integers.
pub(crate) fn require_iid(parameter: &str, value: &str) -> Result<(), ToolError> {
    match value.parse::<u64>() {
        Ok(iid) if iid > 0 => Ok(()),
        _ => Err(ToolError::invalid_param(parameter, "must be a positive integer")),
    }
}

pub(crate) fn check_paging(page: Option<u32>, per_page: Option<u32>) -> Result<(), ToolError> {
    if page == Some(0) {
        return Err(ToolError::invalid_param("page", "must be at least 1"));
    }
    if let Some(per_page) = per_page
        && !(1..=MAX_PER_PAGE).contains(&per_page)
    {
        return Err(ToolError::invalid_param(
            "per_page",
            format!("must be between 1 and {MAX_PER_PAGE}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_optional_title(title: Option<&str>) -> Result<(), ToolError> {
    title.map_or(Ok(()), |title| require_not_blank("title", title))
}

/// The wire spelling of a unit enum variant, as serde renames it.
pub(crate) fn wire_name<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value) {
        Ok(Value::String(name)) => Some(name),
        _ => None,
    }
}
