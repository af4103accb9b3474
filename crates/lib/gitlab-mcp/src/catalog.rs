//! Tool descriptors: name, description, parameter schema, mutating flag, and
//! a type-erased handler.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use gitlab_api::{ApiResult, GitlabClient};
use rmcp::model::{JsonObject, Tool};
use rmcp::schemars::{self, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;

/// Typed parameters for one tool.
pub trait ToolParams: DeserializeOwned + JsonSchema + Send + 'static {
    /// Constraints the JSON schema does not express.
    ///
    /// # Errors
    /// Returns `InvalidParams` naming the offending parameter.
    fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

type InvokeFn =
    Arc<dyn Fn(JsonObject, GitlabClient) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// Static description of one callable GitLab operation.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
    mutating: bool,
    schema: Arc<JsonObject>,
    invoke: InvokeFn,
}

impl ToolDescriptor {
    /// A tool whose upstream call only reads GitLab state.
    pub fn read_only<P, F, Fut>(name: &'static str, description: &'static str, handler: F) -> Self
    where
        P: ToolParams,
        F: Fn(GitlabClient, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        Self::new(name, description, false, handler)
    }

    /// A tool whose upstream call creates, updates, or deletes GitLab state.
    pub fn mutating<P, F, Fut>(name: &'static str, description: &'static str, handler: F) -> Self
    where
        P: ToolParams,
        F: Fn(GitlabClient, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        Self::new(name, description, true, handler)
    }

    fn new<P, F, Fut>(
        name: &'static str,
        description: &'static str,
        mutating: bool,
        handler: F,
    ) -> Self
    where
        P: ToolParams,
        F: Fn(GitlabClient, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let invoke: InvokeFn = Arc::new(move |arguments, client| {
            let handler = handler.clone();
            Box::pin(async move {
                let params = decode::<P>(arguments)?;
                params.validate()?;
                (*handler)(client, params).await.map_err(ToolError::Upstream)
            })
        });
        Self {
            name,
            description,
            mutating,
            schema: Arc::new(schema_for::<P>()),
            invoke,
        }
    }

    /// Replaces the generated schema.
    #[must_use]
    pub fn with_schema(mut self, schema: JsonObject) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        self.mutating
    }

    #[must_use]
    pub fn schema(&self) -> &JsonObject {
        &self.schema
    }

    /// The tool as advertised to MCP clients.
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, self.schema.clone())
    }

    /// Decodes `arguments` and runs the handler. Schema checks happen before this.
    pub(crate) async fn invoke(
        &self,
        arguments: JsonObject,
        client: GitlabClient,
    ) -> Result<Value, ToolError> {
        (self.invoke)(arguments, client).await
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("mutating", &self.mutating)
            .finish_non_exhaustive()
    }
}

fn decode<P: DeserializeOwned>(arguments: JsonObject) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|err| ToolError::invalid_params(err.to_string()))
}

/// JSON schema for `P` as a bare object, without the `$schema` marker.
fn schema_for<P: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(P);
    match serde_json::to_value(schema) {
        Ok(Value::Object(mut object)) => {
            object.remove("$schema");
            object
        }
        _ => JsonObject::new(),
    }
}
