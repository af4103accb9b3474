use gitlab_api::Page;
use gitlab_api::resources::{IssueListQuery, IssueUpdate, NewIssue};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{StateEvent, check_optional_title, check_paging, require_iid, require_not_blank, wire_name};
use crate::catalog::{ToolDescriptor, ToolParams};
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Opened,
    Closed,
    All,
}

/// Parameters for listing a project's issues.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListIssuesParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub state: Option<IssueState>,
    /// Issues must carry every listed label.
    pub labels: Option<Vec<String>>,
    /// Match against title and description.
    pub search: Option<String>,
    pub assignee_username: Option<String>,
    /// Milestone title.
    pub milestone: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListIssuesParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters addressing one issue.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetIssueParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Project-scoped issue number.
    pub issue_iid: String,
}

impl ToolParams for GetIssueParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("issue_iid", &self.issue_iid)
    }
}

/// Parameters for opening an issue.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateIssueParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub title: String,
    /// Markdown body.
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<u64>>,
    pub milestone_id: Option<u64>,
    pub confidential: Option<bool>,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
}

impl ToolParams for CreateIssueParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_not_blank("title", &self.title)
    }
}

/// Parameters for editing an issue. Omitted fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateIssueParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Project-scoped issue number.
    pub issue_iid: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replaces the label set.
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<u64>>,
    pub state_event: Option<StateEvent>,
    pub due_date: Option<String>,
}

impl ToolParams for UpdateIssueParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("issue_iid", &self.issue_iid)?;
        check_optional_title(self.title.as_deref())
    }
}

/// Parameters for listing comments on an issue.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListIssueNotesParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Project-scoped issue number.
    pub issue_iid: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListIssueNotesParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("issue_iid", &self.issue_iid)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters for commenting on an issue.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateIssueNoteParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    /// Project-scoped issue number.
    pub issue_iid: String,
    /// Markdown comment text.
    pub body: String,
}

impl ToolParams for CreateIssueNoteParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("issue_iid", &self.issue_iid)?;
        require_not_blank("body", &self.body)
    }
}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::read_only(
            "list_issues",
            "List issues in a project, optionally filtered by state, labels, assignee or milestone.",
            |client, params: ListIssuesParams| async move {
                let query = IssueListQuery {
                    state: params.state.as_ref().and_then(wire_name),
                    labels: params.labels.unwrap_or_default(),
                    search: params.search,
                    assignee_username: params.assignee_username,
                    milestone: params.milestone,
                    page: Page::new(params.page, params.per_page),
                };
                client.list_issues(&params.project_id, &query).await
            },
        ),
        ToolDescriptor::read_only(
            "get_issue",
            "Get a single issue by its project-scoped iid.",
            |client, params: GetIssueParams| async move {
                client.get_issue(&params.project_id, &params.issue_iid).await
            },
        ),
        ToolDescriptor::mutating(
            "create_issue",
            "Open a new issue in a project.",
            |client, params: CreateIssueParams| async move {
                let issue = NewIssue {
                    title: params.title,
                    description: params.description,
                    labels: params.labels,
                    assignee_ids: params.assignee_ids,
                    milestone_id: params.milestone_id,
                    confidential: params.confidential,
                    due_date: params.due_date,
                };
                client.create_issue(&params.project_id, &issue).await
            },
        ),
        ToolDescriptor::mutating(
            "update_issue",
            "Edit an issue, or close/reopen it with state_event.",
            |client, params: UpdateIssueParams| async move {
                let update = IssueUpdate {
                    title: params.title,
                    description: params.description,
                    labels: params.labels,
                    assignee_ids: params.assignee_ids,
                    state_event: params.state_event.as_ref().and_then(wire_name),
                    due_date: params.due_date,
                };
                client
                    .update_issue(&params.project_id, &params.issue_iid, &update)
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "list_issue_notes",
            "List comments on an issue.",
            |client, params: ListIssueNotesParams| async move {
                client
                    .list_issue_notes(
                        &params.project_id,
                        &params.issue_iid,
                        Page::new(params.page, params.per_page),
                    )
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "create_issue_note",
            "Add a comment to an issue.",
            |client, params: CreateIssueNoteParams| async move {
                client
                    .create_issue_note(&params.project_id, &params.issue_iid, &params.body)
                    .await
            },
        ),
    ]
}
