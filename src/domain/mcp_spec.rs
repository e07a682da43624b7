//! Usage: MCP server definitions and their TOML text form (single server or `[mcp_servers.<id>]`).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::codec::parse_toml_document;
use super::toml_text;
use crate::shared::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerSpec {
    #[serde(rename = "type")]
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl McpServerSpec {
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            transport: Transport::Stdio,
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: Transport::Http,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// `stdio` needs `command`, `http` needs `url`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.transport {
            Transport::Stdio if non_empty(self.command.as_ref()).is_none() => Err(
                ConfigError::shape("stdio MCP server requires `command`"),
            ),
            Transport::Http if non_empty(self.url.as_ref()).is_none() => {
                Err(ConfigError::shape("http MCP server requires `url`"))
            }
            _ => Ok(()),
        }
    }

    /// Copy holding only the fields that belong to its transport.
    pub fn for_transport(&self) -> Self {
        match self.transport {
            Transport::Stdio => Self {
                transport: Transport::Stdio,
                command: self.command.clone(),
                args: self.args.clone(),
                env: self.env.clone(),
                cwd: self.cwd.clone(),
                url: None,
                headers: None,
            },
            Transport::Http => Self {
                transport: Transport::Http,
                url: self.url.clone(),
                headers: self.headers.clone(),
                ..Self::default()
            },
        }
    }
}

/// Key of a managed server table (`[mcp_servers.<key>]`).
pub fn validate_server_key(server_key: &str) -> Result<(), ConfigError> {
    let key = server_key.trim();
    if key.is_empty() {
        return Err(ConfigError::invalid_input("server_key is required"));
    }
    if key.len() > 64 {
        return Err(ConfigError::invalid_input("server_key too long (max 64)"));
    }
    let mut chars = key.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::invalid_input(
            "server_key must start with [A-Za-z0-9]",
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ConfigError::invalid_input(
            "server_key allows only [A-Za-z0-9_-]",
        ));
    }
    Ok(())
}

/// Render one server as TOML text (no trailing newline).
pub fn server_spec_to_toml(spec: &McpServerSpec) -> Result<String, ConfigError> {
    spec.validate()?;

    let mut lines = vec![format!("type = {}", toml_text::basic_string(spec.transport.as_str()))];
    let mut tables: Vec<String> = Vec::new();

    match spec.transport {
        Transport::Stdio => {
            if let Some(command) = &spec.command {
                lines.push(format!("command = {}", toml_text::basic_string(command)));
            }
            if let Some(args) = &spec.args {
                lines.push(format!("args = {}", toml_text::string_array(args)));
            }
            if let Some(cwd) = &spec.cwd {
                lines.push(format!("cwd = {}", toml_text::basic_string(cwd)));
            }
            if let Some(env) = &spec.env {
                tables.push(String::new());
                tables.extend(toml_text::string_table("env", env));
            }
        }
        Transport::Http => {
            if let Some(url) = &spec.url {
                lines.push(format!("url = {}", toml_text::basic_string(url)));
            }
            if let Some(headers) = &spec.headers {
                tables.push(String::new());
                tables.extend(toml_text::string_table("headers", headers));
            }
        }
    }

    lines.extend(tables);
    Ok(lines.join("\n"))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

fn looks_like_server(doc: &Map<String, Value>) -> bool {
    ["type", "command", "url", "args", "env"]
        .iter()
        .any(|key| is_truthy(doc.get(*key)))
}

/// `(id, server)` of the first entry under `[mcp.servers]`, then `[mcp_servers]`.
fn first_named_server(doc: &Map<String, Value>) -> Option<(&String, &Value)> {
    let nested = doc
        .get("mcp")
        .and_then(|mcp| mcp.get("servers"))
        .and_then(Value::as_object)
        .and_then(|servers| servers.iter().next());
    nested.or_else(|| {
        doc.get("mcp_servers")
            .and_then(Value::as_object)
            .and_then(|servers| servers.iter().next())
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_map(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let obj = value?.as_object()?;
    Some(obj.iter().map(|(k, v)| (k.clone(), stringify(v))).collect())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize an untyped server table into a spec. Missing `type` means `stdio`.
pub fn validate_server_spec_json(config: &Value) -> Result<McpServerSpec, ConfigError> {
    let Some(obj) = config.as_object() else {
        return Err(ConfigError::shape("MCP server config must be an object"));
    };

    let transport = match obj.get("type") {
        None | Some(Value::Null) => "stdio".to_string(),
        Some(Value::String(s)) if s.is_empty() => "stdio".to_string(),
        Some(other) => stringify(other),
    };

    match transport.as_str() {
        "stdio" => {
            let command = non_empty_str(obj.get("command"))
                .ok_or_else(|| ConfigError::shape("stdio MCP server requires `command`"))?;
            Ok(McpServerSpec {
                transport: Transport::Stdio,
                command: Some(command),
                args: obj
                    .get("args")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(stringify).collect()),
                env: string_map(obj.get("env")),
                cwd: non_empty_str(obj.get("cwd")),
                ..McpServerSpec::default()
            })
        }
        "http" => {
            let url = non_empty_str(obj.get("url"))
                .ok_or_else(|| ConfigError::shape("http MCP server requires `url`"))?;
            Ok(McpServerSpec {
                transport: Transport::Http,
                url: Some(url),
                headers: string_map(obj.get("headers")),
                ..McpServerSpec::default()
            })
        }
        other => Err(ConfigError::shape(format!(
            "unsupported MCP server type: {other}"
        ))),
    }
}

pub fn toml_to_server_spec(text: &str) -> Result<McpServerSpec, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::parse("mcp server", "TOML content must not be empty"));
    }
    let doc = parse_toml_document(text)?;
    let Some(doc) = doc.as_object() else {
        return Err(ConfigError::parse("mcp server", "TOML root must be a table"));
    };

    if looks_like_server(doc) {
        return validate_server_spec_json(&Value::Object(doc.clone()));
    }
    if let Some((_, server)) = first_named_server(doc) {
        return validate_server_spec_json(server);
    }
    Err(ConfigError::shape(
        "unrecognized TOML shape: expected a single MCP server, or [mcp.servers.<id>] / [mcp_servers.<id>]",
    ))
}

fn script_extension() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(exe|bat|sh|js|py)$").ok())
        .as_ref()
}

/// Suggested id: first named server, else the command's file name without a
/// script/executable extension, else empty.
pub fn extract_id_from_toml(text: &str) -> String {
    let Ok(doc) = parse_toml_document(text) else {
        return String::new();
    };
    let Some(doc) = doc.as_object() else {
        return String::new();
    };

    if let Some((id, _)) = first_named_server(doc) {
        return id.clone();
    }

    let Some(command) = doc.get("command").and_then(Value::as_str) else {
        return String::new();
    };
    let file_name = command.rsplit(['/', '\\']).next().unwrap_or_default();
    match script_extension() {
        Some(re) => re.replace(file_name, "").into_owned(),
        None => file_name.to_string(),
    }
}

/// Fold servers read back from a live config into `existing` (id to server
/// object carrying `enabled`). Unknown ids are added enabled; known ids are only
/// switched on, their other fields stay as stored. Returns how many ids changed.
pub fn merge_imported_servers(
    existing: &mut Map<String, Value>,
    imported: &[(String, McpServerSpec)],
) -> Result<usize, ConfigError> {
    let mut changed = 0;
    for (id, spec) in imported {
        match existing.get_mut(id) {
            None => {
                let mut entry = match serde_json::to_value(spec.for_transport()) {
                    Ok(Value::Object(obj)) => obj,
                    Ok(_) => Map::new(),
                    Err(e) => {
                        return Err(ConfigError::shape(format!(
                            "failed to serialize MCP server {id}: {e}"
                        )))
                    }
                };
                entry.insert("enabled".to_string(), Value::Bool(true));
                existing.insert(id.clone(), Value::Object(entry));
                changed += 1;
            }
            Some(Value::Object(entry)) => {
                if entry.get("enabled").and_then(Value::as_bool) != Some(true) {
                    entry.insert("enabled".to_string(), Value::Bool(true));
                    changed += 1;
                }
            }
            Some(_) => {}
        }
    }
    Ok(changed)
}
