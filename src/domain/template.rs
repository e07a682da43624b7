//! Usage: `${KEY}` placeholder substitution for preset configs, plus surgical re-application
//! of changed values onto a document the user may have edited since.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::codec::{parse_json_object, to_pretty_json};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub type ValuePath = Vec<PathSegment>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateValueConfig {
    pub label: String,
    pub placeholder: String,
    pub default_value: Option<String>,
    pub editor_value: String,
}

impl TemplateValueConfig {
    /// Trimmed editor input, else the default, else empty.
    pub fn effective_value(&self) -> String {
        let edited = self.editor_value.trim();
        if !edited.is_empty() {
            return edited.to_string();
        }
        self.default_value.clone().unwrap_or_default()
    }
}

pub fn template_values_from_configs(
    configs: &BTreeMap<String, TemplateValueConfig>,
) -> BTreeMap<String, String> {
    configs
        .iter()
        .map(|(key, config)| (key.clone(), config.effective_value()))
        .collect()
}

fn placeholder(key: &str) -> String {
    format!("${{{key}}}")
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").ok()).as_ref()
}

fn substitute(text: &str, values: &BTreeMap<String, String>) -> String {
    let Some(re) = placeholder_pattern() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        values.get(&caps[1]).cloned().unwrap_or_default()
    })
    .into_owned()
}

/// Replace every `${KEY}` in every string leaf with `values[KEY]`; keys without
/// a value become empty.
pub fn apply_template_values(tree: &Value, values: &BTreeMap<String, String>) -> Value {
    match tree {
        Value::String(s) => Value::String(substitute(s, values)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| apply_template_values(item, values))
                .collect(),
        ),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), apply_template_values(v, values)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Paths of string leaves containing at least one `${KEY}` for the given keys.
pub fn locate_placeholder_paths<S: AsRef<str>>(tree: &Value, keys: &[S]) -> Vec<ValuePath> {
    let tokens: Vec<String> = keys.iter().map(|k| placeholder(k.as_ref())).collect();
    let mut out = Vec::new();
    let mut current = Vec::new();
    collect_paths(tree, &tokens, &mut current, &mut out);
    out
}

fn collect_paths(
    node: &Value,
    tokens: &[String],
    current: &mut ValuePath,
    out: &mut Vec<ValuePath>,
) {
    match node {
        Value::String(s) => {
            if tokens.iter().any(|t| s.contains(t.as_str())) {
                out.push(current.clone());
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                current.push(PathSegment::Index(idx));
                collect_paths(item, tokens, current, out);
                current.pop();
            }
        }
        Value::Object(obj) => {
            for (key, value) in obj {
                current.push(PathSegment::Key(key.clone()));
                collect_paths(value, tokens, current, out);
                current.pop();
            }
        }
        _ => {}
    }
}

pub fn get_value_at_path<'a>(tree: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, segment| match (node, segment) {
        (Value::Object(obj), PathSegment::Key(key)) => obj.get(key),
        (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
        _ => None,
    })
}

/// Write `value` at `path`. Parents must already exist; an object leaf may be new,
/// an array index must be in range. Returns whether anything was written.
pub fn set_value_at_path(tree: &mut Value, path: &[PathSegment], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return true;
    };

    let mut node = tree;
    for segment in parents {
        let next = match (node, segment) {
            (Value::Object(obj), PathSegment::Key(key)) => obj.get_mut(key),
            (Value::Array(items), PathSegment::Index(idx)) => items.get_mut(*idx),
            _ => None,
        };
        let Some(next) = next else {
            return false;
        };
        node = next;
    }

    match (node, last) {
        (Value::Object(obj), PathSegment::Key(key)) => {
            obj.insert(key.clone(), value);
            true
        }
        (Value::Array(items), PathSegment::Index(idx)) => match items.get_mut(*idx) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateUpdate {
    pub updated_doc: String,
    pub error: Option<String>,
}

/// Re-substitute `template` and copy the results into `current_doc` only at
/// `paths`; every other part of the current document is kept.
pub fn reapply_template_values(
    current_doc: &str,
    template: &Value,
    paths: &[ValuePath],
    values: &BTreeMap<String, String>,
) -> TemplateUpdate {
    let mut doc = match parse_json_object(current_doc, "config") {
        Ok(obj) => Value::Object(obj),
        Err(err) => {
            return TemplateUpdate {
                updated_doc: current_doc.to_string(),
                error: Some(err.to_string()),
            }
        }
    };

    let substituted = apply_template_values(template, values);
    for path in paths {
        if let Some(value) = get_value_at_path(&substituted, path) {
            set_value_at_path(&mut doc, path, value.clone());
        }
    }

    TemplateUpdate {
        updated_doc: to_pretty_json(&doc),
        error: None,
    }
}
