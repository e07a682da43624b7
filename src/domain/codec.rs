//! Usage: JSON / TOML document codecs (full parse + full rewrite).

use serde_json::{Map, Value};

use crate::shared::error::ConfigError;

pub fn parse_json(text: &str, hint: &str) -> Result<Value, ConfigError> {
    serde_json::from_str::<Value>(text).map_err(|e| ConfigError::parse(hint, e))
}

/// Parse JSON text whose root must be an object (arrays/scalars are rejected).
pub fn parse_json_object(text: &str, hint: &str) -> Result<Map<String, Value>, ConfigError> {
    match parse_json(text, hint)? {
        Value::Object(obj) => Ok(obj),
        other => Err(ConfigError::parse(
            hint,
            format!("root must be a JSON object, got {}", value_kind(&other)),
        )),
    }
}

pub fn json_root_from_bytes(bytes: Option<Vec<u8>>) -> Value {
    match bytes {
        Some(b) => serde_json::from_slice::<Value>(&b).unwrap_or_else(|_| serde_json::json!({})),
        None => serde_json::json!({}),
    }
}

/// Pretty JSON with 2-space indentation.
pub fn to_pretty_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail: map keys are always strings.
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn json_to_bytes(value: &Value) -> Vec<u8> {
    let mut out = to_pretty_json(value).into_bytes();
    out.push(b'\n');
    out
}

/// Parse a TOML document into a tree. Blank text is an empty table.
pub fn parse_toml_document(text: &str) -> Result<Value, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let table = toml::from_str::<toml::Table>(text).map_err(|e| ConfigError::parse("toml", e))?;
    Ok(toml_to_json(toml::Value::Table(table)))
}

pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Serialize a tree as a TOML document. `null` values are dropped (TOML has no null).
pub fn toml_to_string(value: &Value) -> Result<String, ConfigError> {
    let Some(table) = json_to_toml(value).and_then(|v| match v {
        toml::Value::Table(t) => Some(t),
        _ => None,
    }) else {
        return Err(ConfigError::parse(
            "toml",
            "document root must be a table",
        ));
    };
    toml::to_string(&table).map_err(|e| ConfigError::parse("toml", e))
}

fn json_to_toml(value: &Value) -> Option<toml::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(toml::Value::Integer)
            .or_else(|| n.as_f64().map(toml::Value::Float)),
        Value::String(s) => Some(toml::Value::String(s.clone())),
        Value::Array(items) => Some(toml::Value::Array(
            items.iter().filter_map(json_to_toml).collect(),
        )),
        Value::Object(obj) => Some(toml::Value::Table(
            obj.iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
    }
}

/// Empty text is valid; otherwise the root must parse as a TOML table.
pub fn validate_toml(text: &str) -> Result<(), ConfigError> {
    parse_toml_document(text).map(|_| ())
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
