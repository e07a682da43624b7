//! Usage: MCP server commands (spec <-> TOML text, sync into the live CLI configs, import back).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{load_context, parse_app_kind};
use crate::domain::mcp_spec::{self, McpServerSpec};
use crate::infra::config_paths::ConfigPaths;
use crate::infra::mcp_sync;
use crate::shared::app_kind::AppKind;
use crate::shared::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct McpServerForSync {
    pub server_key: String,
    pub spec: Value,
}

pub fn mcp_server_to_toml(spec: &Value) -> Result<String, String> {
    let spec = mcp_spec::validate_server_spec_json(spec)?;
    Ok(mcp_spec::server_spec_to_toml(&spec)?)
}

pub fn mcp_server_from_toml(text: &str) -> Result<McpServerSpec, String> {
    Ok(mcp_spec::toml_to_server_spec(text)?)
}

pub fn mcp_suggest_server_key(text: &str) -> String {
    mcp_spec::extract_id_from_toml(text)
}

pub fn mcp_sync_with(
    paths: &ConfigPaths,
    app: AppKind,
    managed_keys: &[String],
    servers: &[McpServerForSync],
) -> Result<bool, ConfigError> {
    let mut specs = Vec::with_capacity(servers.len());
    for server in servers {
        specs.push((
            server.server_key.trim().to_string(),
            mcp_spec::validate_server_spec_json(&server.spec)?,
        ));
    }
    match app {
        AppKind::Claude => mcp_sync::sync_claude_mcp(paths, managed_keys, &specs),
        AppKind::Codex => mcp_sync::sync_codex_mcp(paths, managed_keys, &specs),
    }
}

/// Replace the managed servers of one CLI. Returns whether its file changed.
pub fn mcp_sync_servers(
    app_kind: &str,
    managed_keys: Vec<String>,
    servers: Vec<McpServerForSync>,
) -> Result<bool, String> {
    let app = parse_app_kind(app_kind)?;
    let (_, paths) = load_context()?;
    Ok(mcp_sync_with(&paths, app, &managed_keys, &servers)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct McpImport {
    pub servers: Map<String, Value>,
    pub changed: usize,
}

pub fn mcp_import_with(
    paths: &ConfigPaths,
    app: AppKind,
    mut existing: Map<String, Value>,
) -> Result<McpImport, ConfigError> {
    let imported = match app {
        AppKind::Claude => mcp_sync::read_claude_mcp_servers(paths)?,
        AppKind::Codex => mcp_sync::read_codex_mcp_servers(paths)?,
    };
    let changed = mcp_spec::merge_imported_servers(&mut existing, &imported)?;
    tracing::info!(app = %app, found = imported.len(), changed, "mcp servers imported");
    Ok(McpImport {
        servers: existing,
        changed,
    })
}

/// Pull the servers a CLI already has into `existing` (keyed by id).
pub fn mcp_import_from_live(
    app_kind: &str,
    existing: Map<String, Value>,
) -> Result<McpImport, String> {
    let app = parse_app_kind(app_kind)?;
    let (_, paths) = load_context()?;
    Ok(mcp_import_with(&paths, app, existing)?)
}

pub fn mcp_validate_command(command: &str) -> bool {
    mcp_sync::command_in_path(command)
}

pub fn mcp_enable_all_projects() -> Result<bool, String> {
    let (_, paths) = load_context()?;
    Ok(mcp_sync::claude_enable_all_projects(&paths)?)
}

pub fn mcp_set_enable_all_projects(enable: bool) -> Result<bool, String> {
    let (_, paths) = load_context()?;
    Ok(mcp_sync::set_claude_enable_all_projects(&paths, enable)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_spec_to_toml_and_back() {
        let spec = json!({"command": "uvx", "args": ["mcp-server-fetch"], "env": {"PORT": 8080}});
        let text = mcp_server_to_toml(&spec).expect("to toml");
        let back = mcp_server_from_toml(&text).expect("from toml");
        assert_eq!(back.command.as_deref(), Some("uvx"));
        assert_eq!(back.env.expect("env")["PORT"], "8080");
        assert_eq!(mcp_suggest_server_key(&text), "uvx");
    }

    #[test]
    fn errors_carry_codes() {
        let err = mcp_server_to_toml(&json!({"type": "http"})).unwrap_err();
        assert!(err.starts_with("CONFIG_SHAPE_ERROR:"), "{err}");
        let err = mcp_server_from_toml("").unwrap_err();
        assert!(err.starts_with("CONFIG_PARSE_ERROR:"), "{err}");
        let err = mcp_sync_servers("gemini", Vec::new(), Vec::new()).unwrap_err();
        assert!(err.starts_with("SEC_INVALID_INPUT:"), "{err}");
    }

    #[test]
    fn sync_with_routes_by_app() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ConfigPaths::under_home(dir.path());
        let servers = vec![McpServerForSync {
            server_key: "fetch".to_string(),
            spec: json!({"type": "stdio", "command": "uvx"}),
        }];

        assert!(mcp_sync_with(&paths, AppKind::Codex, &[], &servers).expect("codex"));
        let toml_text = std::fs::read_to_string(paths.codex_config()).expect("read");
        assert!(toml_text.contains("[mcp_servers.fetch]"), "{toml_text}");

        assert!(mcp_sync_with(&paths, AppKind::Claude, &[], &servers).expect("claude"));
        let json_text = std::fs::read_to_string(paths.claude_user_mcp()).expect("read");
        assert!(json_text.contains("\"fetch\""), "{json_text}");
    }

    #[test]
    fn import_reads_live_servers_without_overwriting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ConfigPaths::under_home(dir.path());
        let servers = vec![
            McpServerForSync {
                server_key: "fetch".to_string(),
                spec: json!({"command": "uvx", "args": ["mcp-server-fetch"]}),
            },
            McpServerForSync {
                server_key: "docs".to_string(),
                spec: json!({"type": "http", "url": "https://docs"}),
            },
        ];
        mcp_sync_with(&paths, AppKind::Codex, &[], &servers).expect("sync");

        let mut existing = Map::new();
        existing.insert(
            "fetch".to_string(),
            json!({"type": "stdio", "command": "mine", "enabled": false}),
        );
        let out = mcp_import_with(&paths, AppKind::Codex, existing).expect("import");
        assert_eq!(out.changed, 2);
        assert_eq!(out.servers["fetch"]["command"], "mine");
        assert_eq!(out.servers["fetch"]["enabled"], true);
        assert_eq!(
            out.servers["docs"],
            json!({"type": "http", "url": "https://docs", "enabled": true})
        );

        let out = mcp_import_with(&paths, AppKind::Claude, Map::new()).expect("import");
        assert_eq!(out, McpImport::default());
    }

    #[test]
    fn validate_command_rejects_blank_and_missing() {
        assert!(!mcp_validate_command("  "));
        assert!(!mcp_validate_command("/definitely/not/here/provider-switch-tool"));
    }
}
