//! Decoding of loosely typed tool arguments into typed params structs.
//!
//! MCP clients are not consistent about JSON types: IDs arrive as integers,
//! floats or strings, and structured payloads as native JSON or as a JSON
//! document embedded in a string. The helpers here accept those shapes and
//! fail closed on anything else.

use azdo_core::WorkItemId;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::protocol::ToolCallResult;

/// Decode `arguments` into the params struct of `tool`.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: Option<Value>,
) -> Result<T, ToolCallResult> {
    let value = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };

    serde_json::from_value(value)
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Interpret a JSON value as a work item ID.
pub(crate) fn id_from_value(value: &Value) -> Result<WorkItemId, String> {
    match value {
        Value::Number(n) => {
            if let Some(id) = n.as_u64() {
                return WorkItemId::try_from(id).map_err(|_| format!("ID out of range: {}", n));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(WorkItemId::MAX) => {
                    Ok(f as WorkItemId)
                }
                _ => Err(format!("Invalid ID format: {}", n)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<WorkItemId>()
            .map_err(|_| format!("Invalid ID format: {}", s)),
        other => Err(format!("Invalid ID format: {}", other)),
    }
}

/// `deserialize_with` for work item IDs.
pub(crate) fn work_item_id<'de, D>(deserializer: D) -> Result<WorkItemId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).map_err(de::Error::custom)
}

/// `deserialize_with` for scalar values that should be treated as text.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}

/// Optional variant of [`text`]; `null` and absence are both `None`.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string, got {}",
            other
        ))),
    }
}

/// Structured payload given natively or as a JSON document in a string.
pub(crate) fn embedded_json<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = match Value::deserialize(deserializer)? {
        Value::String(s) => serde_json::from_str(&s)
            .map_err(|e| de::Error::custom(format!("Invalid JSON format: {}", e)))?,
        other => other,
    };
    serde_json::from_value(value).map_err(de::Error::custom)
}
