use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed tool argument or result value.
///
/// Tool calls arrive as `{name, args}` with arguments of unknown shape ahead
/// of time; rather than pass `serde_json::Value` around the whole runtime
/// (and have every crate take a direct dependency on `serde_json`'s value
/// representation), we wrap the shapes tool schemas actually use. Validation
/// against a tool's input schema happens at the backend that owns the tool,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, kept as the original JSON number to avoid float/int drift.
    Number(serde_json::Number),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed mapping. `BTreeMap` keeps argument output stable for
    /// logging and for tests that assert on serialized tool calls.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a [`Value::Map`] from a `serde_json::Value`'s top-level object.
    ///
    /// Returns [`Value::Null`] if `json` is not an object.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to a `serde_json::Value`, e.g. to hand arguments to an
    /// MCP backend or a JSON-RPC peer.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Borrow this value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow this value as a map, if it is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrips_object_through_json() {
        let json = json!({"name": "x", "count": 3, "flags": [true, false], "nested": {"a": 1}});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn non_object_becomes_non_map() {
        let value = Value::from_json(&json!("hello"));
        assert_eq!(value.as_str(), Some("hello"));
        assert!(value.as_map().is_none());
    }

    #[test]
    fn display_for_scalar_values() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(true).to_string(), "true");
    }
}
