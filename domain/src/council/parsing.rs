//! Result payload parsing.
//!
//! Capabilities return their terminal result either as a JSON object or as
//! model text that contains one (often wrapped in a markdown fence). These
//! helpers turn both shapes into a JSON object map. Pure domain logic, no I/O.

use crate::core::error::DomainError;
use serde_json::{Map, Value};

/// Find the outermost JSON object embedded in free-form text.
///
/// # Examples
///
/// ```
/// use tribunal_domain::council::parsing::extract_json_object;
///
/// let value = extract_json_object("Sure! {\"decision\": \"FOR\"} Hope that helps.").unwrap();
/// assert_eq!(value["decision"], "FOR");
/// assert!(extract_json_object("no json here").is_none());
/// ```
pub fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// Normalize a capability payload into a JSON object map.
pub fn extract_json_payload(payload: &Value) -> Result<Map<String, Value>, DomainError> {
    match payload {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => match extract_json_object(text) {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(DomainError::schema("result text does not contain a JSON object")),
        },
        other => Err(DomainError::schema(format!(
            "result must be a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

/// Read a required string field.
pub fn string_field(object: &Map<String, Value>, name: &str) -> Result<String, DomainError> {
    object
        .get(name)
        .ok_or_else(|| DomainError::schema(format!("missing field `{}`", name)))?
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| DomainError::schema(format!("`{}` must be a string", name)))
}

/// Read a list of strings; a single string is accepted as a one-item list.
pub fn string_list_field(object: &Map<String, Value>, name: &str) -> Result<Vec<String>, DomainError> {
    match object.get(name) {
        None => Err(DomainError::schema(format!("missing field `{}`", name))),
        Some(Value::String(s)) => Ok(vec![s.trim().to_string()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| DomainError::schema(format!("`{}` must hold strings", name)))
            })
            .collect(),
        Some(_) => Err(DomainError::schema(format!("`{}` must be a list", name))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
