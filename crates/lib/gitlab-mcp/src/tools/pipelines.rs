use gitlab_api::Page;
use gitlab_api::resources::{JobListQuery, PipelineListQuery};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::{check_paging, require_iid, require_not_blank, wire_name};
use crate::catalog::{ToolDescriptor, ToolParams};
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobScope {
    Created,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    WaitingForResource,
    Manual,
}

/// Parameters for listing a project's pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListPipelinesParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub status: Option<PipelineStatus>,
    /// Branch or tag name.
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub sha: Option<String>,
    /// Trigger source such as `push`, `web`, `schedule` or `merge_request_event`.
    pub source: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListPipelinesParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        check_paging(self.page, self.per_page)
    }
}

/// Parameters addressing one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PipelineParams {
    /// Numeric project id or `namespace/project` path.
    pub project_id: String,
    pub pipeline_id: String,
}

impl ToolParams for PipelineParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("pipeline_id", &self.pipeline_id)
    }
}

/// Parameters for listing the jobs of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListPipelineJobsParams {
    pub project_id: String,
    pub pipeline_id: String,
    /// Only jobs in these states.
    pub scope: Option<Vec<JobScope>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ToolParams for ListPipelineJobsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_not_blank("project_id", &self.project_id)?;
        require_iid("pipeline_id", &self.pipeline_id)?;
        check_paging(self.page, self.per_page)
    }
}

pub(crate) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::read_only(
            "list_pipelines",
            "List CI/CD pipelines in a project, newest first.",
            |client, params: ListPipelinesParams| async move {
                let query = PipelineListQuery {
                    status: params.status.as_ref().and_then(wire_name),
                    ref_name: params.ref_name,
                    sha: params.sha,
                    source: params.source,
                    page: Page::new(params.page, params.per_page),
                };
                client.list_pipelines(&params.project_id, &query).await
            },
        ),
        ToolDescriptor::read_only(
            "get_pipeline",
            "Get a single pipeline.",
            |client, params: PipelineParams| async move {
                client
                    .get_pipeline(&params.project_id, &params.pipeline_id)
                    .await
            },
        ),
        ToolDescriptor::read_only(
            "list_pipeline_jobs",
            "List the jobs of a pipeline, optionally filtered by job state.",
            |client, params: ListPipelineJobsParams| async move {
                let query = JobListQuery {
                    scope: params
                        .scope
                        .unwrap_or_default()
                        .iter()
                        .filter_map(wire_name)
                        .collect(),
                    page: Page::new(params.page, params.per_page),
                };
                client
                    .list_pipeline_jobs(&params.project_id, &params.pipeline_id, &query)
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "retry_pipeline",
            "Retry the failed or canceled jobs of a pipeline.",
            |client, params: PipelineParams| async move {
                client
                    .retry_pipeline(&params.project_id, &params.pipeline_id)
                    .await
            },
        ),
        ToolDescriptor::mutating(
            "cancel_pipeline",
            "Cancel the running jobs of a pipeline.",
            |client, params: PipelineParams| async move {
                client
                    .cancel_pipeline(&params.project_id, &params.pipeline_id)
                    .await
            },
        ),
    ]
}
