//! Usage: Project managed MCP servers into `~/.claude.json` (`mcpServers`) and the Codex
//! `config.toml` (`[mcp_servers.<key>]`), leaving unmanaged entries untouched.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::config_paths::ConfigPaths;
use crate::domain::codec::{
    json_root_from_bytes, json_to_bytes, parse_json_object, parse_toml_document,
};
use crate::domain::mcp_spec::{
    validate_server_key, validate_server_spec_json, McpServerSpec, Transport,
};
use crate::domain::toml_text;
use crate::shared::error::ConfigError;
use crate::shared::fs::{
    read_optional_file, read_text_or_empty, write_file_atomic, write_file_atomic_if_changed,
};

const ENABLE_ALL_PROJECT_MCP: &str = "enableAllProjectMcpServers";

/// Replace `managed_keys` (and every key in `next`) inside `mcpServers`.
pub fn patch_claude_mcp_servers(
    root: Value,
    managed_keys: &[String],
    next: &[(String, Value)],
) -> Value {
    let mut root_obj = match root {
        Value::Object(obj) => obj,
        _ => Map::new(),
    };

    let servers_value = root_obj
        .entry("mcpServers".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !servers_value.is_object() {
        *servers_value = Value::Object(Map::new());
    }
    if let Value::Object(servers) = servers_value {
        for key in managed_keys {
            servers.shift_remove(key);
        }
        for (key, value) in next {
            servers.insert(key.to_string(), value.clone());
        }
    }

    Value::Object(root_obj)
}

fn claude_server_json(spec: &McpServerSpec) -> Result<Value, ConfigError> {
    spec.validate()?;
    serde_json::to_value(spec.for_transport())
        .map_err(|e| ConfigError::shape(format!("failed to serialize MCP server: {e}")))
}

fn validate_servers(servers: &[(String, McpServerSpec)]) -> Result<(), ConfigError> {
    for (key, spec) in servers {
        validate_server_key(key)?;
        spec.validate()?;
    }
    Ok(())
}

pub fn build_claude_mcp_json(
    current: Option<Vec<u8>>,
    managed_keys: &[String],
    servers: &[(String, McpServerSpec)],
) -> Result<Vec<u8>, ConfigError> {
    validate_servers(servers)?;
    let mut next = Vec::with_capacity(servers.len());
    for (key, spec) in servers {
        next.push((key.trim().to_string(), claude_server_json(spec)?));
    }
    let patched = patch_claude_mcp_servers(json_root_from_bytes(current), managed_keys, &next);
    Ok(json_to_bytes(&patched))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn push_codex_server(lines: &mut Vec<String>, key: &str, spec: &McpServerSpec) {
    lines.push(format!("[mcp_servers.{key}]"));
    lines.push(format!("type = {}", toml_text::basic_string(spec.transport.as_str())));
    match spec.transport {
        Transport::Stdio => {
            if let Some(command) = non_empty(spec.command.as_ref()) {
                lines.push(format!("command = {}", toml_text::basic_string(command)));
            }
            if let Some(args) = spec.args.as_ref().filter(|a| !a.is_empty()) {
                lines.push(format!("args = {}", toml_text::string_array(args)));
            }
            if let Some(cwd) = non_empty(spec.cwd.as_ref()) {
                lines.push(format!("cwd = {}", toml_text::basic_string(cwd)));
            }
            if let Some(env) = spec.env.as_ref().filter(|m| !m.is_empty()) {
                lines.push(String::new());
                lines.extend(toml_text::string_table(&format!("mcp_servers.{key}.env"), env));
            }
        }
        Transport::Http => {
            if let Some(url) = non_empty(spec.url.as_ref()) {
                lines.push(format!("url = {}", toml_text::basic_string(url)));
            }
            if let Some(headers) = spec.headers.as_ref().filter(|m| !m.is_empty()) {
                lines.push(String::new());
                lines.extend(toml_text::string_table(
                    &format!("mcp_servers.{key}.http_headers"),
                    headers,
                ));
            }
        }
    }
    lines.push(String::new());
}

/// Rewrite the `[mcp_servers.*]` blocks for managed and incoming keys; every
/// other line of `current` is kept as written.
pub fn build_codex_mcp_toml(
    current: &str,
    managed_keys: &[String],
    servers: &[(String, McpServerSpec)],
) -> Result<String, ConfigError> {
    validate_servers(servers)?;

    let mut lines: Vec<String> = current.lines().map(str::to_string).collect();

    let mut keys_to_purge: Vec<&str> = managed_keys
        .iter()
        .map(|k| k.trim())
        .chain(servers.iter().map(|(k, _)| k.trim()))
        .collect();
    keys_to_purge.sort_unstable();
    keys_to_purge.dedup();

    for key in keys_to_purge {
        for sub in ["env", "http_headers"] {
            let header = format!("[mcp_servers.{key}.{sub}]");
            while toml_text::remove_table_block(&mut lines, &header) {}
        }
        while toml_text::remove_table_block(&mut lines, &format!("[mcp_servers.{key}]")) {}
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if !lines.is_empty() && !servers.is_empty() {
        lines.push(String::new());
    }

    for (key, spec) in servers {
        push_codex_server(&mut lines, key.trim(), spec);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return Ok(String::new());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Returns whether `~/.claude.json` changed.
pub fn sync_claude_mcp(
    paths: &ConfigPaths,
    managed_keys: &[String],
    servers: &[(String, McpServerSpec)],
) -> Result<bool, ConfigError> {
    let path = paths.claude_user_mcp();
    let bytes = build_claude_mcp_json(read_optional_file(&path)?, managed_keys, servers)?;
    let changed = write_file_atomic_if_changed(&path, &bytes)?;
    tracing::info!(path = %path.display(), servers = servers.len(), changed, "claude mcp synced");
    Ok(changed)
}

/// Returns whether the Codex `config.toml` changed.
pub fn sync_codex_mcp(
    paths: &ConfigPaths,
    managed_keys: &[String],
    servers: &[(String, McpServerSpec)],
) -> Result<bool, ConfigError> {
    let path = paths.codex_config();
    let current = read_optional_file(&path)?
        .map(|b| String::from_utf8_lossy(&b).to_string())
        .unwrap_or_default();
    let next = build_codex_mcp_toml(&current, managed_keys, servers)?;
    let changed = write_file_atomic_if_changed(&path, next.as_bytes())?;
    tracing::info!(path = %path.display(), servers = servers.len(), changed, "codex mcp synced");
    Ok(changed)
}

/// Entries that do not normalize into a server spec are skipped with a warning.
fn importable(
    source: &str,
    entries: impl IntoIterator<Item = (String, Value)>,
) -> Vec<(String, McpServerSpec)> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match validate_server_spec_json(&value) {
            Ok(spec) => Some((key, spec)),
            Err(err) => {
                tracing::warn!(source, server = %key, "skipping MCP server on import: {err}");
                None
            }
        })
        .collect()
}

/// Servers currently listed under `mcpServers` in `~/.claude.json`.
pub fn read_claude_mcp_servers(
    paths: &ConfigPaths,
) -> Result<Vec<(String, McpServerSpec)>, ConfigError> {
    let path = paths.claude_user_mcp();
    let text = read_text_or_empty(&path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root = parse_json_object(&text, ".claude.json")?;
    let Some(Value::Object(servers)) = root.get("mcpServers") else {
        return Ok(Vec::new());
    };
    Ok(importable(
        "claude",
        servers.iter().map(|(k, v)| (k.clone(), v.clone())),
    ))
}

/// Servers currently declared as `[mcp_servers.<key>]` in the Codex `config.toml`.
pub fn read_codex_mcp_servers(
    paths: &ConfigPaths,
) -> Result<Vec<(String, McpServerSpec)>, ConfigError> {
    let text = read_text_or_empty(&paths.codex_config())?;
    let doc = parse_toml_document(&text)?;
    let Some(Value::Object(servers)) = doc.get("mcp_servers") else {
        return Ok(Vec::new());
    };
    Ok(importable(
        "codex",
        servers.iter().map(|(key, entry)| {
            let mut entry = entry.clone();
            if let Value::Object(obj) = &mut entry {
                if !obj.contains_key("headers") {
                    if let Some(headers) = obj.shift_remove("http_headers") {
                        obj.insert("headers".to_string(), headers);
                    }
                }
            }
            (key.clone(), entry)
        }),
    ))
}

fn read_local_settings(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let text = read_text_or_empty(path)?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    parse_json_object(&text, "settings.local.json")
}

pub fn claude_enable_all_projects(paths: &ConfigPaths) -> Result<bool, ConfigError> {
    let root = read_local_settings(&paths.claude_settings_local())?;
    Ok(root
        .get(ENABLE_ALL_PROJECT_MCP)
        .and_then(Value::as_bool)
        .unwrap_or(false))
}

/// Set `enableAllProjectMcpServers` in `settings.local.json`. Returns whether the
/// file was written.
pub fn set_claude_enable_all_projects(
    paths: &ConfigPaths,
    enable: bool,
) -> Result<bool, ConfigError> {
    let path = paths.claude_settings_local();
    let existed = path.exists();
    let mut root = read_local_settings(&path)?;

    let current = root
        .get(ENABLE_ALL_PROJECT_MCP)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if existed && current == enable {
        return Ok(false);
    }

    root.insert(ENABLE_ALL_PROJECT_MCP.to_string(), Value::Bool(enable));
    write_file_atomic(&path, &json_to_bytes(&Value::Object(root)))?;
    tracing::info!(path = %path.display(), enable, "claude project mcp servers toggled");
    Ok(true)
}

fn executable_extensions() -> Vec<String> {
    if !cfg!(windows) {
        return Vec::new();
    }
    std::env::var("PATHEXT")
        .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string())
        .split(';')
        .map(|ext| ext.trim().to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn command_in_dirs(
    command: &str,
    dirs: impl IntoIterator<Item = PathBuf>,
    extensions: &[String],
) -> bool {
    let command = command.trim();
    if command.is_empty() {
        return false;
    }
    if command.contains(['/', '\\']) {
        return Path::new(command).exists();
    }
    dirs.into_iter().any(|dir| {
        dir.join(command).is_file()
            || extensions
                .iter()
                .any(|ext| dir.join(format!("{command}{ext}")).is_file())
    })
}

/// Whether a stdio `command` resolves without running it: as a path when it
/// contains a separator, else through `PATH` (plus `PATHEXT` on Windows).
pub fn command_in_path(command: &str) -> bool {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    command_in_dirs(
        command,
        std::env::split_paths(&path_var),
        &executable_extensions(),
    )
}
