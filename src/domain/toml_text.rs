//! Usage: Hand-built TOML text fragments (escaping, keys, arrays, table-block removal).
//!
//! Line-level writers keep untouched parts of a user's `config.toml` intact,
//! which a full parse + re-serialize would not.

use std::collections::BTreeMap;

pub(crate) fn escape_basic_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xFFFF {
                    out.push_str(&format!("\\u{code:04X}"));
                } else {
                    out.push_str(&format!("\\U{code:08X}"));
                }
            }
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn basic_string(value: &str) -> String {
    format!("\"{}\"", escape_basic_string(value))
}

/// Literal `'...'` strings read better for secrets and paths; fall back when they can't hold the value.
pub(crate) fn string_prefer_single_quotes(value: &str) -> String {
    if !value.chars().any(|c| c == '\'' || c.is_control()) {
        return format!("'{value}'");
    }
    basic_string(value)
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

pub(crate) fn key(key: &str) -> String {
    if is_bare_key(key) {
        key.to_string()
    } else {
        basic_string(key)
    }
}

pub(crate) fn string_array(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| basic_string(v)).collect();
    format!("[{}]", items.join(", "))
}

/// `[header]` followed by one `key = 'value'` line per entry.
pub(crate) fn string_table(header: &str, map: &BTreeMap<String, String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(map.len() + 1);
    lines.push(format!("[{header}]"));
    for (k, v) in map {
        lines.push(format!("{} = {}", key(k), string_prefer_single_quotes(v)));
    }
    lines
}

/// Remove the first `[table]` block (header through the line before the next header).
pub(crate) fn remove_table_block(lines: &mut Vec<String>, table_header: &str) -> bool {
    let Some(start) = lines.iter().position(|line| line.trim() == table_header) else {
        return false;
    };

    let end = lines[start + 1..]
        .iter()
        .position(|line| line.trim().starts_with('['))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    lines.drain(start..end);
    true
}
