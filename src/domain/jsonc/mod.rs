//! Usage: JSON-with-comments support for editor settings files.
//!
//! Reads tolerate comments and trailing commas; writes are expressed as text
//! edits so untouched bytes (comments included) survive verbatim.

mod edit;
mod scanner;
mod tree;

pub use edit::{apply_edits, modify, Edit, FormattingOptions};

use serde_json::Value;

use crate::shared::error::ConfigError;

/// Parse JSONC text. A blank or comment-only document is `Value::Null`.
pub fn parse(text: &str) -> Result<Value, ConfigError> {
    let root = tree::parse_tree(text).map_err(|e| ConfigError::parse("jsonc", e))?;
    Ok(root.map(|node| node.to_value()).unwrap_or(Value::Null))
}

/// Convenience wrapper: compute and apply the edits for one path.
pub fn set_path(
    text: &str,
    path: &[&str],
    value: Option<&Value>,
    options: &FormattingOptions,
) -> Result<String, ConfigError> {
    let edits = modify(text, path, value, options)?;
    Ok(apply_edits(text, &edits))
}

#[cfg(test)]
mod tests;
