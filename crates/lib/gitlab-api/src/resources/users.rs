use serde_json::Value;

use crate::client::GitlabClient;
use crate::error::ApiResult;
use crate::transport::ApiRequest;

impl GitlabClient {
    /// `GET /user`, the account the session token belongs to.
    ///
    /// # Errors
    /// Returns the classified upstream failure; anonymous sessions get `Unauthorized`.
    pub async fn current_user(&self) -> ApiResult<Value> {
        self.send(ApiRequest::get(&["user"])).await
    }
}
