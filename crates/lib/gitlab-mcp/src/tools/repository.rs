use gitlab_api::Page;
use gitlab_api::resources::{CommitListQuery, TreeQuery};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{check_paging, require_not_blank};
use crate::catalog::{ToolDescriptor, ToolParams};
use crate::error::ToolError;

/// Ref used for file reads when none is given.
const DEFAULT_REF: &str = "HEAD";

/// Parameters for listing branches.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListBranchesParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Match against branch names.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListBranchesParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetBranchParams {
    pub project_id: String,
    pub branch: String,
}

impl ToolParams for GetBranchParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("branch", &self.branch)
    }
}

/// Parameters for creating a branch.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateBranchParams {
    pub project_id: String,
    /// Name of the new branch.
    pub branch: String,
    /// Branch, tag or commit sha to branch from.
    #[serde(rename = "ref")]
    pub ref_name: String,
}

impl ToolParams for CreateBranchParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("branch", &self.branch)?;
        require_not_blank("ref", &self.ref_name)
    }
}

/// Parameters for reading one file from the repository.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetFileContentsParams {
    pub project_id: String,
    /// Path of the file relative to the repository root.
    pub file_path: String,
    /// Branch, tag or commit sha. Defaults to `HEAD`.
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
}

impl ToolParams for GetFileContentsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("file_path", &self.file_path)
    }
}

/// Parameters for listing a directory of the repository.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListRepositoryTreeParams {
    pub project_id: String,
    /// Directory to list; the root when omitted.
    pub path: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub recursive: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListRepositoryTreeParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters for listing commits.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListCommitsParams {
    pub project_id: String,
    /// Branch, tag or commit sha to walk from.
    pub ref_name: Option<String>,
    /// Only commits touching this path.
    pub path: Option<String>,
    /// ISO 8601 lower bound.
    pub since: Option<String>,
    /// ISO 8601 upper bound.
    pub until: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListCommitsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetCommitParams {
    pub project_id: String,
    /// Commit sha, or a branch or tag name.
    pub sha: String,
}

impl ToolParams for GetCommitParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("sha", &self.sha)
    }
}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::read_only(
            "list_branches",
            "List repository branches.",
            |client, params: ListBranchesParams| async move {
                client
                    .list_branches(
                        &params.project_id,
                        params.search.as_deref(),
                        Page::new(params.page, params.per_page),
                    )
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "get_branch",
            "Get a single branch and its head commit.",
            |client, params: GetBranchParams| async move {
                client.get_branch(&params.project_id, &params.branch).await
            },
        ),
        ToolDescriptor::mutating(
            "create_branch",
            "Create a branch from an existing ref.",
            |client, params: CreateBranchParams| async move {
                client
                    .create_branch(&params.project_id, &params.branch, &params.ref_name)
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "get_file_contents",
            "Read a file from the repository. Text files include decoded_content.",
            |client, params: GetFileContentsParams| async move {
                let ref_name = params.ref_name.as_deref().unwrap_or(DEFAULT_REF);
                client
                    .get_file_contents(&params.project_id, &params.file_path, ref_name)
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "list_repository_tree",
            "List files and directories in the repository.",
            |client, params: ListRepositoryTreeParams| async move {
                let query = TreeQuery {
                    path: params.path,
                    ref_name: params.ref_name,
                    recursive: params.recursive,
                    page: Page::new(params.page, params.per_page),
                };
                client.list_repository_tree(&params.project_id, &query).await
            },
        ),
        ToolDescriptor::read_only(
            "list_commits",
            "List commits, newest first.",
            |client, params: ListCommitsParams| async move {
                let query = CommitListQuery {
                    ref_name: params.ref_name,
                    path: params.path,
                    since: params.since,
                    until: params.until,
                    page: Page::new(params.page, params.per_page),
                };
                client.list_commits(&params.project_id, &query).await
            },
        ),
        ToolDescriptor::read_only(
            "get_commit",
            "Get a single commit with its stats.",
            |client, params: GetCommitParams| async move {
                client.get_commit(&params.project_id, &params.sha).await
            },
        ),
    ]
}
