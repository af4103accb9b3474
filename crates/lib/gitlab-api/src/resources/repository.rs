use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::resources::Page;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Default)]
pub struct TreeQuery {
    pub path: Option<String>,
    pub ref_name: Option<String>,
    pub recursive: Option<bool>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct CommitListQuery {
    pub ref_name: Option<String>,
    pub path: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub page: Page,
}

impl GitlabClient {
    /// `GET /projects/:id/repository/branches`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_branches(
        &self,
        project: &str,
        search: Option<&str>,
        page: Page,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "repository", "branches"])
            .query_opt("search", search);
        self.send(page.apply(request)).await
    }

    /// `GET /projects/:id/repository/branches/:branch`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_branch(&self, project: &str, branch: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&[
            "projects",
            project,
            "repository",
            "branches",
            branch,
        ]))
        .await
    }

    /// `POST /projects/:id/repository/branches`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn create_branch(
        &self,
        project: &str,
        branch: &str,
        from_ref: &str,
    ) -> ApiResult<Value> {
        let request = ApiRequest::post(&["projects", project, "repository", "branches"])
            .query("branch", branch)
            .query("ref", from_ref);
        self.send(request).await
    }

    /// `GET /projects/:id/repository/files/:file_path`
    ///
    /// Text files additionally get a `decoded_content` field.
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_file_contents(
        &self,
        project: &str,
        file_path: &str,
        ref_name: &str,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "repository", "files", file_path])
            .query("ref", ref_name);
        let mut file = self.send(request).await?;
        attach_decoded_content(&mut file);
        Ok(file)
    }

    /// `GET /projects/:id/repository/tree`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_repository_tree(&self, project: &str, query: &TreeQuery) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "repository", "tree"])
            .query_opt("path", query.path.as_deref())
            .query_opt("ref", query.ref_name.as_deref())
            .query_opt("recursive", query.recursive);
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id/repository/commits`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn list_commits(&self, project: &str, query: &CommitListQuery) -> ApiResult<Value> {
        let request = ApiRequest::get(&["projects", project, "repository", "commits"])
            .query_opt("ref_name", query.ref_name.as_deref())
            .query_opt("path", query.path.as_deref())
            .query_opt("since", query.since.as_deref())
            .query_opt("until", query.until.as_deref());
        self.send(query.page.apply(request)).await
    }

    /// `GET /projects/:id/repository/commits/:sha`
    ///
    /// # Errors
    /// Returns the classified upstream failure.
    pub async fn get_commit(&self, project: &str, sha: &str) -> ApiResult<Value> {
        self.send(ApiRequest::get(&[
            "projects",
            project,
            "repository",
            "commits",
            sha,
        ]))
        .await
    }
}

fn attach_decoded_content(file: &mut Value) {
    let Some(object) = file.as_object_mut() else {
        return;
    };
    if object.get("encoding").and_then(Value::as_str) != Some("base64") {
        return;
    }
    let Some(encoded) = object.get("content").and_then(Value::as_str) else {
        return;
    };
    let compact: String = encoded.split_whitespace().collect();
    let text = STANDARD
        .decode(compact)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());
    if let Some(text) = text {
        object.insert("decoded_content".to_string(), Value::String(text));
    }
}
