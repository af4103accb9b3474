use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::resources::Page;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct ProjectListQuery {
    pub search: Option<String>,
    pub owned: Option<bool>,
    pub membership: Option<bool>,
    pub starred: Option<bool>,
    pub visibility: Option<String>,
    pub order_by: Option<String>,
    pub page: Page,
}

impl GitlabClient {
    /// `GET /projects`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_projects(&self, query: &ProjectListQuery) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects"])
            .query_opt("search", query.search.as_deref())
            .query_opt("owned", query.owned)
            .query_opt("membership", query.membership)
            .query_opt("starred", query.starred)
            .query_opt("visibility", query.visibility.as_deref())
            .query_opt("order_by", query.order_by.as_deref());
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_project(&self, project: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&["projects", project])).await
    }
}
