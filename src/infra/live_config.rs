//! Usage: Write a chosen provider profile onto the live CLI config files, and read them back.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::config_paths::ConfigPaths;
use crate::domain::codec::{json_to_bytes, parse_json};
use crate::domain::codex_toml::validate_config_toml;
use crate::domain::editor_settings;
use crate::shared::error::ConfigError;
use crate::shared::fs::{
    is_symlink, read_optional_file, read_text_or_empty, remove_file_if_exists, write_file_atomic,
    write_file_atomic_if_changed,
};

const PLUGIN_PRIMARY_API_KEY: &str = "primaryApiKey";
const PLUGIN_MANAGED_VALUE: &str = "any";

fn ensure_not_symlink(path: &Path) -> Result<(), ConfigError> {
    if path.exists() && is_symlink(path)? {
        return Err(ConfigError::invalid_input(format!(
            "refusing to modify symlink path={}",
            path.display()
        )));
    }
    Ok(())
}

fn file_hint(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("config")
        .to_string()
}

/// Missing file reads as `{}`; invalid JSON is an error.
fn read_json_or_empty(path: &Path) -> Result<Value, ConfigError> {
    match read_optional_file(path)? {
        Some(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            if text.trim().is_empty() {
                return Ok(Value::Object(Map::new()));
            }
            parse_json(&text, &file_hint(path))
        }
        None => Ok(Value::Object(Map::new())),
    }
}

fn write_json_object(path: &Path, value: &Value) -> Result<(), ConfigError> {
    if !value.is_object() {
        return Err(ConfigError::parse(
            file_hint(path),
            "root must be a JSON object",
        ));
    }
    ensure_not_symlink(path)?;
    write_file_atomic(path, &json_to_bytes(value))
}

pub fn read_claude_settings(paths: &ConfigPaths) -> Result<Value, ConfigError> {
    read_json_or_empty(&paths.claude_settings())
}

pub fn write_claude_settings(paths: &ConfigPaths, settings: &Value) -> Result<(), ConfigError> {
    let path = paths.claude_settings();
    write_json_object(&path, settings)?;
    tracing::info!(path = %path.display(), "claude settings written");
    Ok(())
}

/// Write `auth.json` then `config.toml`; when the second write fails the first
/// is restored (or removed if it did not exist).
pub fn write_codex_live_atomic(
    paths: &ConfigPaths,
    auth: &Value,
    config_text: Option<&str>,
) -> Result<(), ConfigError> {
    let auth_path = paths.codex_auth();
    let config_path = paths.codex_config();
    let config_text = config_text.unwrap_or("");

    validate_config_toml(config_text)?;
    ensure_not_symlink(&config_path)?;

    let old_auth = read_optional_file(&auth_path)?;
    write_json_object(&auth_path, auth)?;

    if let Err(err) = write_file_atomic(&config_path, config_text.as_bytes()) {
        let rollback = match &old_auth {
            Some(bytes) => write_file_atomic(&auth_path, bytes),
            None => remove_file_if_exists(&auth_path).map(|_| ()),
        };
        if let Err(rollback_err) = rollback {
            tracing::warn!(
                path = %auth_path.display(),
                "auth.json rollback failed: {rollback_err}"
            );
        } else {
            tracing::warn!(
                path = %config_path.display(),
                "config.toml write failed, auth.json rolled back: {err}"
            );
        }
        return Err(err);
    }

    tracing::info!(dir = %paths.codex_dir.display(), "codex live config written");
    Ok(())
}

/// `{ "auth": <auth.json or {}>, "config": <config.toml text or ""> }`.
pub fn read_codex_live(paths: &ConfigPaths) -> Result<Value, ConfigError> {
    let auth = read_json_or_empty(&paths.codex_auth())?;
    let config = read_text_or_empty(&paths.codex_config())?;
    Ok(json!({ "auth": auth, "config": config }))
}

/// Rewrite the Codex keys of the editor's `settings.json`. Returns whether the
/// file changed. Nothing is created when there is nothing to add.
pub fn sync_vscode_settings(
    paths: &ConfigPaths,
    base_url: Option<&str>,
    is_official: bool,
) -> Result<bool, ConfigError> {
    let Some(path) = paths.vscode_settings.as_deref() else {
        return Ok(false);
    };
    ensure_not_symlink(path)?;

    let current = read_optional_file(path)?;
    let text = current
        .as_deref()
        .map(|b| String::from_utf8_lossy(b).to_string())
        .unwrap_or_default();
    let next = editor_settings::apply_provider(&text, base_url, is_official);

    if current.is_none() && next.trim().is_empty() {
        return Ok(false);
    }
    let changed = write_file_atomic_if_changed(path, next.as_bytes())?;
    if changed {
        tracing::info!(path = %path.display(), is_official, "editor settings synced");
    }
    Ok(changed)
}

pub fn is_claude_plugin_config_applied(paths: &ConfigPaths) -> Result<bool, ConfigError> {
    let Some(bytes) = read_optional_file(&paths.claude_plugin_config())? else {
        return Ok(false);
    };
    Ok(serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|v| {
            v.get(PLUGIN_PRIMARY_API_KEY)
                .and_then(Value::as_str)
                .map(|s| s == PLUGIN_MANAGED_VALUE)
        })
        .unwrap_or(false))
}

/// Set `primaryApiKey = "any"` in the plugin `config.json`, keeping other fields.
/// An unparsable file is replaced. Returns whether anything was written.
pub fn apply_claude_plugin_config(paths: &ConfigPaths) -> Result<bool, ConfigError> {
    let path = paths.claude_plugin_config();
    let existing = read_optional_file(&path)?;
    let mut root = match existing
        .as_deref()
        .and_then(|b| serde_json::from_slice::<Value>(b).ok())
    {
        Some(Value::Object(obj)) => obj,
        _ => Map::new(),
    };

    let already = root.get(PLUGIN_PRIMARY_API_KEY).and_then(Value::as_str)
        == Some(PLUGIN_MANAGED_VALUE);
    if already && existing.is_some() {
        return Ok(false);
    }
    root.insert(
        PLUGIN_PRIMARY_API_KEY.to_string(),
        Value::String(PLUGIN_MANAGED_VALUE.to_string()),
    );
    write_json_object(&path, &Value::Object(root))?;
    tracing::info!(path = %path.display(), "claude plugin config applied");
    Ok(true)
}

/// Remove `primaryApiKey`. Missing or unparsable files are left alone.
pub fn clear_claude_plugin_config(paths: &ConfigPaths) -> Result<bool, ConfigError> {
    let path = paths.claude_plugin_config();
    let Some(bytes) = read_optional_file(&path)? else {
        return Ok(false);
    };
    let Ok(Value::Object(mut root)) = serde_json::from_slice::<Value>(&bytes) else {
        return Ok(false);
    };
    if root.shift_remove(PLUGIN_PRIMARY_API_KEY).is_none() {
        return Ok(false);
    }
    write_json_object(&path, &Value::Object(root))?;
    tracing::info!(path = %path.display(), "claude plugin config cleared");
    Ok(true)
}
