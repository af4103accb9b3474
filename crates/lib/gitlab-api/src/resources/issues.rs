use serde::Serialize;
use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::resources::{NoteBody, Page, comma_list, serialize_labels};
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct IssueListQuery {
    pub state: Option<String>,
    pub labels: Vec<String>,
    pub search: Option<String>,
    pub assignee_username: Option<String>,
    pub milestone: Option<String>,
    pub page: Page,
}

/// Body for `POST /projects/:id/issues`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_labels")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidential: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Body for `PUT /projects/:id/issues/:iid`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_labels")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl GitlabClient {
    /// `GET /projects/:id/issues`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_issues(&self, project: &str, query: &IssueListQuery) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "issues"])
            .query_opt("state", query.state.as_deref())
            .query_opt("labels", comma_list(&query.labels))
            .query_opt("search", query.search.as_deref())
            .query_opt("assignee_username", query.assignee_username.as_deref())
            .query_opt("milestone", query.milestone.as_deref());
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id/issues/:iid`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_issue(&self, project: &str, issue_iid: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&["projects", project, "issues", issue_iid]))
            .await
    }

    /// `POST /projects/:id/issues`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn create_issue(&self, project: &str, issue: &NewIssue) -> ApiResult<Value> {
        let request = ApiRequest::post(&["projects", project, "issues"]).json(issue)?;
        self.send(request).await
    }

    /// `PUT /projects/:id/issues/:iid`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn update_issue(
        &self,
        project: &str,
        issue_iid: &str,
        update: &IssueUpdate,
    ) -> ApiResult<Value> {
        let request =
            ApiRequest::put(&["projects", project, "issues", issue_iid]).json(update)?;
        self.send(request).await
    }

    /// `GET /projects/:id/issues/:iid/notes`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_issue_notes(
        &self,
        project: &str,
        issue_iid: &str,
        page: Page,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "issues", issue_iid, "notes"]);
        self.send(page.apply(request)).await
    }

    /// `POST /projects/:id/issues/:iid/notes`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn create_issue_note(
        &self,
        project: &str,
        issue_iid: &str,
        body: &str,
    ) -> ApiResult<Value> {
        let request = ApiRequest::post(&["projects", project, "issues", issue_iid, "notes"])
            .json(&NoteBody { body })?;
        self.send(request).await
    }
}
