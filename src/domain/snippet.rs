//! Usage: Toggle a "common config" snippet in or out of a provider's JSON settings.

use serde::Serialize;
use serde_json::{Map, Value};

use super::codec::{parse_json_object, to_pretty_json};
use super::merge::{is_subset, merged, removed};
use crate::shared::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnippetUpdate {
    pub updated_doc: String,
    pub error: Option<String>,
}

/// Blank text reads as an empty object.
fn parse_doc(text: &str) -> Result<Map<String, Value>, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    parse_json_object(text, "config")
}

fn parse_snippet(text: &str) -> Result<Option<Value>, ConfigError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_json_object(text, "snippet").map(|obj| Some(Value::Object(obj)))
}

/// Pretty JSON when `doc` parses as an object, the original text otherwise.
fn best_effort(doc: &str) -> String {
    match parse_doc(doc) {
        Ok(obj) => to_pretty_json(&Value::Object(obj)),
        Err(_) => doc.to_string(),
    }
}

pub fn toggle_snippet(doc: &str, snippet: &str, enabled: bool) -> SnippetUpdate {
    let fail = |err: ConfigError| SnippetUpdate {
        updated_doc: best_effort(doc),
        error: Some(err.to_string()),
    };

    let doc_obj = match parse_doc(doc) {
        Ok(obj) => Value::Object(obj),
        Err(err) => return fail(err),
    };
    let snippet_value = match parse_snippet(snippet) {
        Ok(Some(value)) => value,
        Ok(None) => {
            return SnippetUpdate {
                updated_doc: to_pretty_json(&doc_obj),
                error: None,
            }
        }
        Err(err) => return fail(err),
    };

    let next = if enabled {
        merged(&doc_obj, &snippet_value)
    } else {
        removed(&doc_obj, &snippet_value)
    };

    SnippetUpdate {
        updated_doc: to_pretty_json(&next),
        error: None,
    }
}

/// Never fails: parse errors and an empty snippet read as "not present".
pub fn has_snippet(doc: &str, snippet: &str) -> bool {
    let (Ok(doc_obj), Ok(Some(snippet_value))) = (parse_doc(doc), parse_snippet(snippet)) else {
        return false;
    };
    is_subset(&Value::Object(doc_obj), &snippet_value)
}
