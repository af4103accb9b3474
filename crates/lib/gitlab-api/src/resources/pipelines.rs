use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::resources::Page;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct PipelineListQuery {
    pub status: Option<String>,
    pub ref_name: Option<String>,
    pub sha: Option<String>,
    pub source: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct JobListQuery {
    pub scope: Vec<String>,
    pub page: Page,
}

impl GitlabClient {
    /// `GET /projects/:id/pipelines`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_pipelines(
        &self,
        project: &str,
        query: &PipelineListQuery,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "pipelines"])
            .query_opt("status", query.status.as_deref())
            .query_opt("ref", query.ref_name.as_deref())
            .query_opt("sha", query.sha.as_deref())
            .query_opt("source", query.source.as_deref());
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id/pipelines/:pipeline_id`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_pipeline(&self, project: &str, pipeline_id: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&["projects", project, "pipelines", pipeline_id]))
            .await
    }

    /// `GET /projects/:id/pipelines/:pipeline_id/jobs`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_pipeline_jobs(
        &self,
        project: &str,
        pipeline_id: &str,
        query: &JobListQuery,
    ) -> ApiResult<Value> {
        let mut request = ApiRequest::get(&["projects", project, "pipelines", pipeline_id, "jobs"]);
        for scope in &query.scope {
            request = request.query("scope[]", scope);
        }
        self.send(query.page.apply(request)).await
    }

    /// `POST /projects/:id/pipelines/:pipeline_id/retry`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn retry_pipeline(&self, project: &str, pipeline_id: &str) -> ApiResult<Value> {
        self.send(ApiRequest::post(&[
            "projects",
            project,
            "pipelines",
            pipeline_id,
            "retry",
        ]))
        .await
    }

    /// `POST /projects/:id/pipelines/:pipeline_id/cancel`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn cancel_pipeline(&self, project: &str, pipeline_id: &str) -> ApiResult<Value> {
        self.send(ApiRequest::post(&[
            "projects",
            project,
            "pipelines",
            pipeline_id,
            "cancel",
        ]))
        .await
    }
}
