//! Usage: Compute minimal text edits that set or delete one property path in a JSONC document.

use serde::Serialize;
use serde_json::Value;

use super::tree::{self, Node, NodeKind};
use crate::shared::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub length: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingOptions {
    pub insert_spaces: bool,
    pub tab_size: usize,
    pub eol: String,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            insert_spaces: true,
            tab_size: 2,
            eol: "\n".to_string(),
        }
    }
}

impl FormattingOptions {
    fn indent_unit(&self) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }
}

/// Edits that set `path` to `value`, or delete it when `value` is `None`.
///
/// Missing intermediate objects are created on set. Deleting a path that does
/// not exist yields no edits.
pub fn modify(
    text: &str,
    path: &[&str],
    value: Option<&Value>,
    options: &FormattingOptions,
) -> Result<Vec<Edit>, ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::invalid_input("jsonc path is required"));
    }

    let root = tree::parse_tree(text).map_err(|e| ConfigError::parse("jsonc", e))?;
    let Some(root) = root else {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        let wrapped = wrap_in_objects(&path[1..], value.clone());
        let mut doc = serde_json::Map::new();
        doc.insert(path[0].to_string(), wrapped);
        return Ok(vec![Edit {
            offset: 0,
            length: 0,
            content: pretty(&Value::Object(doc), "", options)?,
        }]);
    };

    // Walk up until an existing parent is found, nesting the value as we go.
    let mut depth = path.len();
    let mut pending = value.cloned();
    let parent = loop {
        if let Some(parent) = tree::find_node_at_location(&root, &path[..depth - 1]) {
            break parent;
        }
        let Some(inner) = pending.take() else {
            return Ok(Vec::new());
        };
        pending = Some(wrap_in_objects(&path[depth - 1..depth], inner));
        depth -= 1;
    };
    let key = path[depth - 1];

    if parent.kind != NodeKind::Object {
        return Err(ConfigError::shape(format!(
            "cannot set property '{key}' on a non-object value"
        )));
    }

    match (parent.find_property(key), pending) {
        (Some((index, _)), None) => Ok(vec![delete_property(text, parent, index)]),
        (Some((_, prop)), Some(value)) => {
            let Some(existing) = prop.property_value() else {
                return Err(ConfigError::shape(format!("malformed property '{key}'")));
            };
            let indent = line_indent(text, prop.offset);
            Ok(vec![Edit {
                offset: existing.offset,
                length: existing.length,
                content: pretty(&value, &indent, options)?,
            }])
        }
        (None, None) => Ok(Vec::new()),
        (None, Some(value)) => Ok(vec![insert_property(text, parent, key, &value, options)?]),
    }
}

/// Apply non-overlapping edits; out-of-range edits are skipped.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut out = text.to_string();
    for edit in sorted {
        let end = edit.offset + edit.length;
        if end > out.len() || !out.is_char_boundary(edit.offset) || !out.is_char_boundary(end) {
            continue;
        }
        out.replace_range(edit.offset..end, &edit.content);
    }
    out
}

fn delete_property(text: &str, parent: &Node, index: usize) -> Edit {
    let prop = &parent.children[index];

    let (begin, end) = if index > 0 {
        // Take the separating comma of the previous property along.
        (parent.children[index - 1].end(), prop.end())
    } else if let Some(next) = parent.children.get(1) {
        (prop.offset, next.offset)
    } else {
        let inner_end = parent.end() - 1;
        let before = &text[parent.offset + 1..prop.offset];
        let after = text[prop.end()..inner_end].trim_start();
        let after = after.strip_prefix(',').unwrap_or(after);
        if before.trim().is_empty() && after.trim().is_empty() {
            (parent.offset + 1, inner_end)
        } else {
            // Keep surrounding comments, but never a dangling separator.
            (prop.offset, inner_end - after.len())
        }
    };

    Edit {
        offset: begin,
        length: end - begin,
        content: String::new(),
    }
}

fn insert_property(
    text: &str,
    parent: &Node,
    key: &str,
    value: &Value,
    options: &FormattingOptions,
) -> Result<Edit, ConfigError> {
    let key_json = serde_json::to_string(key).map_err(|e| ConfigError::parse("jsonc", e))?;
    let eol = &options.eol;

    if let Some(prev) = parent.children.last() {
        let single_line = !text[parent.offset..prev.offset].contains('\n');
        let content = if single_line {
            let compact =
                serde_json::to_string(value).map_err(|e| ConfigError::parse("jsonc", e))?;
            format!(", {key_json}: {compact}")
        } else {
            let indent = line_indent(text, prev.offset);
            format!(",{eol}{indent}{key_json}: {}", pretty(value, &indent, options)?)
        };
        return Ok(Edit {
            offset: prev.end(),
            length: 0,
            content,
        });
    }

    let parent_indent = line_indent(text, parent.offset);
    let child_indent = format!("{parent_indent}{}", options.indent_unit());
    let inner = &text[parent.offset + 1..parent.end() - 1];
    let length = if inner.trim().is_empty() { inner.len() } else { 0 };
    Ok(Edit {
        offset: parent.offset + 1,
        length,
        content: format!(
            "{eol}{child_indent}{key_json}: {}{eol}{parent_indent}",
            pretty(value, &child_indent, options)?
        ),
    })
}

fn wrap_in_objects(path: &[&str], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, key| {
        let mut obj = serde_json::Map::new();
        obj.insert((*key).to_string(), inner);
        Value::Object(obj)
    })
}

/// Leading whitespace of the line that contains `offset`.
fn line_indent(text: &str, offset: usize) -> String {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Pretty JSON whose continuation lines are shifted by `indent`.
fn pretty(value: &Value, indent: &str, options: &FormattingOptions) -> Result<String, ConfigError> {
    let unit = options.indent_unit();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(unit.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| ConfigError::parse("jsonc", e))?;
    let text = String::from_utf8(buf).map_err(|e| ConfigError::parse("jsonc", e))?;
    Ok(text.replace('\n', &format!("{}{indent}", options.eol)))
}
