//! Usage: Read / write one scalar at a dotted path (e.g. `env.ANTHROPIC_AUTH_TOKEN`) in JSON settings.
//!
//! Writes never invent fields unless asked to: a missing parent or leaf is a
//! silent no-op when `create_if_missing` is false.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::codec::{parse_json_object, to_pretty_json};
use crate::shared::error::ConfigError;

pub const API_KEY_PATH: &str = "env.ANTHROPIC_AUTH_TOKEN";
pub const BASE_URL_PATH: &str = "env.ANTHROPIC_BASE_URL";
const CO_AUTHORED_KEY: &str = "includeCoAuthoredBy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::invalid_input(format!("invalid field path: {raw:?}")));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn split_leaf(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((leaf, parents)) => (parents, leaf.as_str()),
            None => (&[], ""),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetFieldOptions {
    pub create_if_missing: bool,
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &FieldPath) -> Option<&'a Value> {
    let (parents, leaf) = path.split_leaf();
    let mut node = root;
    for key in parents {
        node = node.get(key)?.as_object()?;
    }
    node.get(leaf)
}

pub fn get_field_at_path(doc: &str, path: &str) -> Option<Value> {
    let path = FieldPath::parse(path).ok()?;
    let root = parse_json_object(doc, "config").ok()?;
    lookup(&root, &path).cloned()
}

/// Empty string when the field is missing or not a string.
pub fn get_string_at_path(doc: &str, path: &str) -> String {
    match get_field_at_path(doc, path) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

pub fn has_field_at_path(doc: &str, path: &str) -> bool {
    get_field_at_path(doc, path).is_some()
}

/// Returns `doc` unchanged when it does not parse, the path is invalid, or the
/// field is absent and `create_if_missing` is false.
pub fn set_field_at_path(doc: &str, path: &str, value: Value, options: SetFieldOptions) -> String {
    let Ok(path) = FieldPath::parse(path) else {
        return doc.to_string();
    };
    let Ok(mut root) = parse_json_object(doc, "config") else {
        return doc.to_string();
    };

    let (parents, leaf) = path.split_leaf();
    let mut node = &mut root;
    for key in parents {
        if !node.contains_key(key) {
            if !options.create_if_missing {
                return doc.to_string();
            }
            node.insert(key.clone(), Value::Object(Map::new()));
        }
        node = match node.get_mut(key) {
            Some(Value::Object(child)) => child,
            _ => return doc.to_string(),
        };
    }

    if !node.contains_key(leaf) && !options.create_if_missing {
        return doc.to_string();
    }
    node.insert(leaf.to_string(), value);
    to_pretty_json(&Value::Object(root))
}

pub fn get_api_key(doc: &str) -> String {
    get_string_at_path(doc, API_KEY_PATH)
}

pub fn has_api_key_field(doc: &str) -> bool {
    has_field_at_path(doc, API_KEY_PATH)
}

pub fn set_api_key(doc: &str, api_key: &str, options: SetFieldOptions) -> String {
    set_field_at_path(doc, API_KEY_PATH, Value::String(api_key.to_string()), options)
}

fn api_host_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://api\.").ok()).as_ref()
}

/// Website derived from `env.ANTHROPIC_BASE_URL` with the `api.` host prefix dropped.
pub fn extract_website_url(doc: &str) -> String {
    let base_url = get_string_at_path(doc, BASE_URL_PATH);
    if base_url.is_empty() {
        return String::new();
    }
    match api_host_prefix() {
        Some(re) => re.replace(&base_url, "https://").into_owned(),
        None => base_url,
    }
}

/// `true` writes `includeCoAuthoredBy: false`; `false` removes the key.
pub fn set_co_authored_disabled(doc: &str, disable: bool) -> String {
    let Ok(mut root) = parse_json_object(doc, "config") else {
        return doc.to_string();
    };
    if disable {
        root.insert(CO_AUTHORED_KEY.to_string(), Value::Bool(false));
    } else {
        root.shift_remove(CO_AUTHORED_KEY);
    }
    to_pretty_json(&Value::Object(root))
}

pub fn is_co_authored_disabled(doc: &str) -> bool {
    matches!(
        get_field_at_path(doc, CO_AUTHORED_KEY),
        Some(Value::Bool(false))
    )
}
