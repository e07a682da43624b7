//! Usage: Provider switching (write the chosen profile onto the live CLI files) and live read-back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{load_context, parse_app_kind};
use crate::domain::codex_toml;
use crate::infra::config_paths::ConfigPaths;
use crate::infra::live_config;
use crate::infra::settings::SwitchSettings;
use crate::shared::app_kind::AppKind;
use crate::shared::error::ConfigError;

/// A stored provider profile. For Codex, `settings_config` is
/// `{ "auth": {..}, "config": "<config.toml text>" }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderProfile {
    pub name: String,
    pub settings_config: Value,
    pub is_official: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SwitchOutcome {
    pub editor_settings_changed: bool,
    pub plugin_config_changed: bool,
}

fn codex_parts(settings_config: &Value) -> Result<(&Value, &str), ConfigError> {
    let auth = settings_config
        .get("auth")
        .filter(|v| v.is_object())
        .ok_or_else(|| ConfigError::shape("codex provider requires an `auth` object"))?;
    let config = match settings_config.get("config") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(_) => return Err(ConfigError::shape("codex `config` must be TOML text")),
    };
    Ok((auth, config))
}

pub fn provider_switch_with(
    settings: &SwitchSettings,
    paths: &ConfigPaths,
    app: AppKind,
    profile: &ProviderProfile,
) -> Result<SwitchOutcome, ConfigError> {
    let mut outcome = SwitchOutcome::default();

    match app {
        AppKind::Claude => {
            live_config::write_claude_settings(paths, &profile.settings_config)?;
            if settings.claude_plugin_integration {
                outcome.plugin_config_changed = if profile.is_official {
                    live_config::clear_claude_plugin_config(paths)?
                } else {
                    live_config::apply_claude_plugin_config(paths)?
                };
            }
        }
        AppKind::Codex => {
            let (auth, config) = codex_parts(&profile.settings_config)?;
            live_config::write_codex_live_atomic(paths, auth, Some(config))?;
            if settings.vscode_sync_enabled {
                let base_url = codex_toml::extract_base_url(config);
                // Editor sync failures never fail the switch.
                match live_config::sync_vscode_settings(
                    paths,
                    base_url.as_deref(),
                    profile.is_official,
                ) {
                    Ok(changed) => outcome.editor_settings_changed = changed,
                    Err(err) => tracing::warn!("editor settings sync failed: {err}"),
                }
            }
        }
    }

    tracing::info!(app = %app, provider = %profile.name, "provider switched");
    Ok(outcome)
}

pub fn provider_switch(app_kind: &str, profile: &ProviderProfile) -> Result<SwitchOutcome, String> {
    let app = parse_app_kind(app_kind)?;
    let (settings, paths) = load_context()?;
    Ok(provider_switch_with(&settings, &paths, app, profile)?)
}

/// Current live config in profile shape (used to backfill the active provider
/// before switching away from it).
pub fn provider_read_live_with(paths: &ConfigPaths, app: AppKind) -> Result<Value, ConfigError> {
    match app {
        AppKind::Claude => live_config::read_claude_settings(paths),
        AppKind::Codex => live_config::read_codex_live(paths),
    }
}

pub fn provider_read_live(app_kind: &str) -> Result<Value, String> {
    let app = parse_app_kind(app_kind)?;
    let (_, paths) = load_context()?;
    Ok(provider_read_live_with(&paths, app)?)
}
