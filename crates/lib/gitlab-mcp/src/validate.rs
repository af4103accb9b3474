//! Checks raw invocation arguments against a tool's JSON schema.
//!
//! Covers the subset of JSON Schema that generated parameter schemas use:
//! `required`, `type`, `enum`, `const`, `minimum`/`maximum`, integer
//! `format`s, `items`, `anyOf`/`oneOf`, and local `$ref`s.

use rmcp::model::JsonObject;
use serde_json::Value;

use crate::error::ToolError;

/// Validates `arguments` against `schema`, stopping at the first violation.
///
/// # Errors
/// Returns `InvalidParams` naming the offending parameter.
pub fn check_arguments(schema: &JsonObject, arguments: &JsonObject) -> Result<(), ToolError> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if arguments.get(name).is_none_or(Value::is_null) {
                return Err(ToolError::invalid_param(name, "missing required parameter"));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (name, value) in arguments {
        // Unknown keys are ignored, matching serde's default.
        let Some(property) = properties.get(name) else {
            continue;
        };
        check_value(schema, property, value)
            .map_err(|reason| ToolError::invalid_param(name.as_str(), reason))?;
    }
    Ok(())
}

fn check_value(root: &JsonObject, schema: &Value, value: &Value) -> Result<(), String> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let target = resolve_ref(root, reference)
            .ok_or_else(|| format!("unresolvable schema reference {reference}"))?;
        check_value(root, target, value)?;
    }

    if let Some(expected) = schema.get("type") {
        check_type(expected, value)?;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
        && !allowed.contains(value)
    {
        return Err(format!("expected one of {}", render_list(allowed)));
    }

    if let Some(expected) = schema.get("const")
        && expected != value
    {
        return Err(format!("expected {expected}"));
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64)
            && number < min
        {
            return Err(format!("must be at least {min}"));
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64)
            && number > max
        {
            return Err(format!("must be at most {max}"));
        }
    }

    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        check_integer_format(format, value)?;
    }

    if let (Some(items), Some(values)) = (schema.get("items"), value.as_array()) {
        for (index, item) in values.iter().enumerate() {
            check_value(root, items, item).map_err(|reason| format!("item {index}: {reason}"))?;
        }
    }

    if let Some(branches) = schema.get("anyOf").and_then(Value::as_array) {
        let mut first_failure = None;
        let matched = branches.iter().any(|branch| match check_value(root, branch, value) {
            Ok(()) => true,
            Err(reason) => {
                first_failure.get_or_insert(reason);
                false
            }
        });
        if !matched {
            return Err(first_failure.unwrap_or_else(|| "matches no allowed form".to_string()));
        }
    }

    if let Some(branches) = schema.get("oneOf").and_then(Value::as_array) {
        let mut first_failure = None;
        let mut matched = 0_usize;
        for branch in branches {
            match check_value(root, branch, value) {
                Ok(()) => matched += 1,
                Err(reason) => {
                    first_failure.get_or_insert(reason);
                }
            }
        }
        match matched {
            1 => {}
            0 => {
                return Err(first_failure.unwrap_or_else(|| "matches no allowed form".to_string()));
            }
            _ => return Err("matches more than one allowed form".to_string()),
        }
    }

    Ok(())
}

/// Range implied by the integer `format`s generated for Rust integer fields.
fn integer_bounds(format: &str) -> Option<(i128, i128)> {
    let bounds = match format {
        "uint8" => (0, i128::from(u8::MAX)),
        "uint16" => (0, i128::from(u16::MAX)),
        "uint32" => (0, i128::from(u32::MAX)),
        "uint64" | "uint" => (0, i128::from(u64::MAX)),
        "int8" => (i128::from(i8::MIN), i128::from(i8::MAX)),
        "int16" => (i128::from(i16::MIN), i128::from(i16::MAX)),
        "int32" => (i128::from(i32::MIN), i128::from(i32::MAX)),
        "int64" | "int" => (i128::from(i64::MIN), i128::from(i64::MAX)),
        _ => return None,
    };
    Some(bounds)
}

fn check_integer_format(format: &str, value: &Value) -> Result<(), String> {
    let Some((min, max)) = integer_bounds(format) else {
        return Ok(());
    };
    let number = value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from));
    match number {
        Some(number) if number < min || number > max => {
            Err(format!("must be between {min} and {max}"))
        }
        _ => Ok(()),
    }
}

fn check_type(expected: &Value, value: &Value) -> Result<(), String> {
    let allowed: Vec<&str> = match expected {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => return Ok(()),
    };
    if allowed.iter().any(|name| matches_type(name, value)) {
        return Ok(());
    }
    Err(format!(
        "expected {}, got {}",
        allowed.join(" or "),
        type_name(value)
    ))
}

fn matches_type(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn resolve_ref<'a>(root: &'a JsonObject, reference: &str) -> Option<&'a Value> {
    let path = reference.strip_prefix("#/")?;
    let mut segments = path.split('/');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn render_list(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn schema() -> JsonObject {
        object(json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string" },
                "issue_iid": { "type": "string" },
                "per_page": { "type": ["integer", "null"], "format": "uint32", "minimum": 0 },
                "milestone_id": { "type": ["integer", "null"], "format": "int64" },
                "labels": { "type": ["array", "null"], "items": { "type": "string" } },
                "state": { "anyOf": [{ "$ref": "#/$defs/IssueState" }, { "type": "null" }] }
            },
            "required": ["project_id", "issue_iid"],
            "$defs": {
                "IssueState": { "type": "string", "enum": ["opened", "closed", "all"] }
            }
        }))
    }

    fn check(arguments: Value) -> Result<(), ToolError> {
        check_arguments(&schema(), &object(arguments))
    }

    #[test]
    fn accepts_valid_arguments() {
        check(json!({
            "project_id": "42",
            "issue_iid": "7",
            "per_page": 20,
            "labels": ["bug"],
            "state": "opened"
        }))
        .expect("valid");
    }

    #[test]
    fn reports_missing_required_parameter() {
        let err = check(json!({ "project_id": "42" })).expect_err("missing iid");
        assert_eq!(err.parameter(), Some("issue_iid"));
    }

    #[test]
    fn null_counts_as_missing() {
        let err = check(json!({ "project_id": null, "issue_iid": "7" })).expect_err("null");
        assert_eq!(err.parameter(), Some("project_id"));
    }

    #[test]
    fn reports_wrong_type() {
        let err = check(json!({ "project_id": 42, "issue_iid": "7" })).expect_err("type");
        assert_eq!(err.parameter(), Some("project_id"));
        assert!(err.to_string().contains("expected string, got number"));
    }

    #[test]
    fn enforces_minimum() {
        let err = check(json!({ "project_id": "42", "issue_iid": "7", "per_page": -1 }))
            .expect_err("negative");
        assert_eq!(err.parameter(), Some("per_page"));
    }

    #[test]
    fn enforces_integer_format_range() {
        let oversized = json!({ "project_id": "42", "issue_iid": "7", "per_page": 10_000_000_000_u64 });
        let err = check(oversized).expect_err("wider than u32");
        assert_eq!(err.parameter(), Some("per_page"));
        assert!(err.to_string().contains("4294967295"));

        let err = check(json!({ "project_id": "42", "issue_iid": "7", "milestone_id": u64::MAX }))
            .expect_err("wider than i64");
        assert_eq!(err.parameter(), Some("milestone_id"));

        check(json!({ "project_id": "42", "issue_iid": "7", "per_page": u32::MAX })).expect("fits");
    }

    #[test]
    fn one_of_rejects_ambiguous_matches() {
        let schema = object(json!({
            "type": "object",
            "properties": {
                "id": { "oneOf": [{ "type": "integer" }, { "type": "number" }] }
            }
        }));

        let err = check_arguments(&schema, &object(json!({ "id": 3 }))).expect_err("both match");
        assert_eq!(err.parameter(), Some("id"));
        assert!(err.to_string().contains("more than one"));
        check_arguments(&schema, &object(json!({ "id": 1.5 }))).expect("only number matches");
    }

    #[test]
    fn checks_array_items() {
        let err = check(json!({ "project_id": "42", "issue_iid": "7", "labels": ["ok", 3] }))
            .expect_err("item type");
        assert_eq!(err.parameter(), Some("labels"));
        assert!(err.to_string().contains("item 1"));
    }

    #[test]
    fn resolves_enum_through_ref() {
        let err = check(json!({ "project_id": "42", "issue_iid": "7", "state": "merged" }))
            .expect_err("bad state");
        assert_eq!(err.parameter(), Some("state"));
        assert!(err.to_string().contains("\"opened\""));
        check(json!({ "project_id": "42", "issue_iid": "7", "state": null })).expect("null ok");
    }

    #[test]
    fn ignores_unknown_keys() {
        check(json!({ "project_id": "42", "issue_iid": "7", "extra": true })).expect("lenient");
    }
}
