//! Typed call wrappers, grouped by GitLab resource.

pub mod issues;
pub mod merge_requests;
pub mod pipelines;
pub mod projects;
pub mod repository;
pub mod users;

use serde::{Serialize, Serializer};

use crate::transport::ApiRequest;

pub use issues::{IssueListQuery, IssueUpdate, NewIssue};
pub use merge_requests::{MergeOptions, MergeRequestListQuery, MergeRequestUpdate, NewMergeRequest};
pub use pipelines::{JobListQuery, PipelineListQuery};
pub use projects::ProjectListQuery;
pub use repository::{CommitListQuery, TreeQuery};

/// Single-page selector for list endpoints. No page following is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Page {
    #[must_use]
    pub const fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self { page, per_page }
    }

    pub(crate) fn apply(self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("page", self.page)
            .query_opt("per_page", self.per_page)
    }
}

/// Body shared by the issue and merge request note endpoints.
#[derive(Serialize)]
pub(crate) struct NoteBody<'a> {
    pub body: &'a str,
}

/// GitLab takes label lists as a comma-separated string.
pub(crate) fn comma_list(values: &[String]) -> Option<String> {
    let joined = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

#[allow(clippy::ref_option)]
pub(crate) fn serialize_labels<S: Serializer>(
    labels: &Option<Vec<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match labels {
        Some(values) => serializer.serialize_str(&comma_list(values).unwrap_or_default()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_list_skips_blank_entries() {
        let labels = vec!["bug".to_string(), " ".to_string(), " ui ".to_string()];
        assert_eq!(comma_list(&labels).as_deref(), Some("bug,ui"));
        assert_eq!(comma_list(&[]), None);
    }

    #[test]
    fn page_adds_only_present_values() {
        let request = Page::new(None, Some(50)).apply(ApiRequest::get(&["projects"]));
        assert_eq!(request.query, vec![("per_page".to_string(), "50".to_string())]);
    }
}
