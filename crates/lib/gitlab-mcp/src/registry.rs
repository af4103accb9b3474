//! Registered tool set and per-invocation dispatch.
//!
//! The read-only policy is applied once, when the registry is built: a
//! mutating tool is either registered or absent, never rejected per call.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use gitlab_api::{ClientFactory, SessionContext};
use rmcp::model::JsonObject;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::catalog::ToolDescriptor;
use crate::error::{ErrorKind, RegistrationError, ToolError};
use crate::validate::check_arguments;

/// Whether `descriptor` is exposed under the given read-only flag.
#[must_use]
pub const fn is_exposed(descriptor: &ToolDescriptor, readonly: bool) -> bool {
    !readonly || !descriptor.is_mutating()
}

/// Immutable set of tools exposed for one process run.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
    readonly: bool,
}

impl ToolRegistry {
    /// Validates the whole catalog, then keeps the tools the policy exposes,
    /// in declaration order.
    ///
    /// # Errors
    /// Returns the first invalid name, duplicate name, or malformed schema.
    pub fn build(
        catalog: Vec<ToolDescriptor>,
        readonly: bool,
    ) -> Result<Self, RegistrationError> {
        let mut seen = HashSet::new();
        for descriptor in &catalog {
            check_name(descriptor.name())?;
            if !seen.insert(descriptor.name()) {
                return Err(RegistrationError::DuplicateName(descriptor.name().to_string()));
            }
            check_schema(descriptor)?;
        }

        let declared = catalog.len();
        let tools: Vec<ToolDescriptor> = catalog
            .into_iter()
            .filter(|descriptor| is_exposed(descriptor, readonly))
            .collect();
        let index = tools
            .iter()
            .enumerate()
            .map(|(position, descriptor)| (descriptor.name(), position))
            .collect();

        info!(
            registered = tools.len(),
            withheld = declared - tools.len(),
            readonly,
            "tool registry built"
        );
        Ok(Self {
            tools,
            index,
            readonly,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|position| &self.tools[*position])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered tools in declaration order.
    #[must_use]
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(ToolDescriptor::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub const fn readonly(&self) -> bool {
        self.readonly
    }

    /// Runs one invocation: lookup, schema check, credential extraction,
    /// handler call.
    ///
    /// # Errors
    /// Returns a validation, upstream, or internal error; never panics on
    /// caller input.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        session: &SessionContext,
        clients: &dyn ClientFactory,
    ) -> Result<Value, ToolError> {
        let Some(descriptor) = self.get(name) else {
            error!(tool = name, "dispatch reached a tool that was never registered");
            return Err(ToolError::Internal(format!("tool {name} is not registered")));
        };

        let arguments = arguments.unwrap_or_default();
        check_arguments(descriptor.schema(), &arguments)?;

        let Some(endpoint) = session.endpoint_url() else {
            error!(tool = name, "session context has no attached credentials");
            return Err(ToolError::Internal(
                "session credentials were never attached".to_string(),
            ));
        };
        let token = session.access_token().unwrap_or_default();
        let client = clients.client(endpoint, token)?;

        debug!(tool = name, "dispatching tool call");
        let started = Instant::now();
        let outcome = descriptor.invoke(arguments, client).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Ok(_) => info!(tool = name, elapsed_ms, "tool call succeeded"),
            Err(err) if err.kind() == ErrorKind::InvalidParams => {
                debug!(tool = name, error = %err, "tool call rejected");
            }
            Err(err) => {
                warn!(tool = name, kind = %err.kind(), error = %err, elapsed_ms, "tool call failed");
            }
        }
        outcome
    }
}

fn check_name(name: &str) -> Result<(), RegistrationError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_');
    if valid {
        Ok(())
    } else {
        Err(RegistrationError::InvalidName(name.to_string()))
    }
}

fn check_schema(descriptor: &ToolDescriptor) -> Result<(), RegistrationError> {
    let malformed = |reason: &str| RegistrationError::MalformedSchema {
        tool: descriptor.name().to_string(),
        reason: reason.to_string(),
    };
    let schema = descriptor.schema();

    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(malformed("root type must be \"object\""));
    }

    let properties = match schema.get("properties") {
        None => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(_) => return Err(malformed("properties must be an object")),
    };

    match schema.get("required") {
        None => Ok(()),
        Some(Value::Array(required)) => {
            for entry in required {
                let Some(name) = entry.as_str() else {
                    return Err(malformed("required entries must be strings"));
                };
                if !properties.is_some_and(|properties| properties.contains_key(name)) {
                    return Err(malformed(&format!("required parameter {name} is not declared")));
                }
            }
            Ok(())
        }
        Some(_) => Err(malformed("required must be an array")),
    }
}
