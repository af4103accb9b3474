use serde::Serialize;
use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::resources::{NoteBody, Page, comma_list, serialize_labels};
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct MergeRequestListQuery {
    pub state: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub labels: Vec<String>,
    pub search: Option<String>,
    pub page: Page,
}

/// Body for `POST /projects/:id/merge_requests`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMergeRequest {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_labels")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_source_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash: Option<bool>,
}

/// Body for `PUT /projects/:id/merge_requests/:iid`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeRequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_labels")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<String>,
}

/// Body for `PUT /projects/:id/merge_requests/:iid/merge`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_remove_source_branch: Option<bool>,
    /// Merge only if the source branch head still matches this SHA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl GitlabClient {
    /// `GET /projects/:id/merge_requests`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_merge_requests(
        &self,
        project: &str,
        query: &MergeRequestListQuery,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "merge_requests"])
            .query_opt("state", query.state.as_deref())
            .query_opt("source_branch", query.source_branch.as_deref())
            .query_opt("target_branch", query.target_branch.as_deref())
            .query_opt("labels", comma_list(&query.labels))
            .query_opt("search", query.search.as_deref());
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id/merge_requests/:iid`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_merge_request(&self, project: &str, mr_iid: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&["projects", project, "merge_requests", mr_iid]))
            .await
    }

    /// `GET /projects/:id/merge_requests/:iid/diffs`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_merge_request_diffs(
        &self,
        project: &str,
        mr_iid: &str,
        page: Page,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "merge_requests", mr_iid, "diffs"]);
        self.send(page.apply(request)).await
    }

    /// `POST /projects/:id/merge_requests`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn create_merge_request(
        &self,
        project: &str,
        merge_request: &NewMergeRequest,
    ) -> ApiResult<Value> {
        let request =
            ApiRequest::post(&["projects", project, "merge_requests"]).json(merge_request)?;
        self.send(request).await
    }

    /// `PUT /projects/:id/merge_requests/:iid`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn update_merge_request(
        &self,
        project: &str,
        mr_iid: &str,
        update: &MergeRequestUpdate,
    ) -> ApiResult<Value> {
        let request =
            ApiRequest::put(&["projects", project, "merge_requests", mr_iid]).json(update)?;
        self.send(request).await
    }

    /// `PUT /projects/:id/merge_requests/:iid/merge`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn merge_merge_request(
        &self,
        project: &str,
        mr_iid: &str,
        options: &MergeOptions,
    ) -> ApiResult<Value> {
        let request = ApiRequest::put(&["projects", project, "merge_requests", mr_iid, "merge"])
            .json(options)?;
        self.send(request).await
    }

    /// `POST /projects/:id/merge_requests/:iid/notes`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn create_merge_request_note(
        &self,
        project: &str,
        mr_iid: &str,
        body: &str,
    ) -> ApiResult<Value> {
        let request =
            ApiRequest::post(&["projects", project, "merge_requests", mr_iid, "notes"])
                .json(&NoteBody { body })?;
        self.send(request).await
    }
}
