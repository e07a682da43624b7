//! Usage: Locations of the live CLI config files (honoring settings overrides).

use std::path::{Path, PathBuf};

use super::app_paths::home_dir;
use super::settings::SwitchSettings;
use crate::shared::error::ConfigError;

const CLAUDE_DIR: &str = ".claude";
const CODEX_DIR: &str = ".codex";
const CLAUDE_SETTINGS_FILE: &str = "settings.json";
const CLAUDE_LEGACY_SETTINGS_FILE: &str = "claude.json";
const CLAUDE_LOCAL_SETTINGS_FILE: &str = "settings.local.json";
const CLAUDE_PLUGIN_CONFIG_FILE: &str = "config.json";
const CLAUDE_USER_MCP_FILE: &str = ".claude.json";
const CODEX_AUTH_FILE: &str = "auth.json";
const CODEX_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub home_dir: PathBuf,
    pub claude_dir: PathBuf,
    pub codex_dir: PathBuf,
    pub vscode_settings: Option<PathBuf>,
}

impl ConfigPaths {
    /// Default locations under `home`, with no editor settings file.
    pub fn under_home(home: &Path) -> Self {
        Self {
            home_dir: home.to_path_buf(),
            claude_dir: home.join(CLAUDE_DIR),
            codex_dir: home.join(CODEX_DIR),
            vscode_settings: None,
        }
    }

    pub fn resolve(settings: &SwitchSettings) -> Result<Self, ConfigError> {
        let home = home_dir()?;
        let mut paths = Self::under_home(&home);
        if let Some(dir) = settings.claude_override_dir() {
            paths.claude_dir = dir;
        }
        if let Some(dir) = settings.codex_override_dir() {
            paths.codex_dir = dir;
        }
        paths.vscode_settings = settings
            .vscode_override_path()
            .or_else(|| default_vscode_settings_path(&home));
        Ok(paths)
    }

    /// `settings.json`, or the legacy `claude.json` when only that one exists.
    pub fn claude_settings(&self) -> PathBuf {
        let settings = self.claude_dir.join(CLAUDE_SETTINGS_FILE);
        if settings.exists() {
            return settings;
        }
        let legacy = self.claude_dir.join(CLAUDE_LEGACY_SETTINGS_FILE);
        if legacy.exists() {
            return legacy;
        }
        settings
    }

    pub fn claude_settings_local(&self) -> PathBuf {
        self.claude_dir.join(CLAUDE_LOCAL_SETTINGS_FILE)
    }

    pub fn claude_plugin_config(&self) -> PathBuf {
        self.claude_dir.join(CLAUDE_PLUGIN_CONFIG_FILE)
    }

    /// User-level `~/.claude.json` that holds `mcpServers`.
    pub fn claude_user_mcp(&self) -> PathBuf {
        self.home_dir.join(CLAUDE_USER_MCP_FILE)
    }

    pub fn codex_auth(&self) -> PathBuf {
        self.codex_dir.join(CODEX_AUTH_FILE)
    }

    pub fn codex_config(&self) -> PathBuf {
        self.codex_dir.join(CODEX_CONFIG_FILE)
    }
}

/// Stable first, then Insiders, VSCodium and OSS builds.
const VSCODE_PRODUCT_DIRS: [&str; 4] = ["Code", "Code - Insiders", "VSCodium", "Code - OSS"];

fn vscode_user_config_base(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        return home.join("Library").join("Application Support");
    }
    if cfg!(target_os = "windows") {
        return dirs::config_dir().unwrap_or_else(|| home.join("AppData").join("Roaming"));
    }
    home.join(".config")
}

/// User `settings.json` of every known VS Code build, in priority order.
pub fn candidate_settings_paths(home: &Path) -> Vec<PathBuf> {
    let base = vscode_user_config_base(home);
    VSCODE_PRODUCT_DIRS
        .iter()
        .map(|product| base.join(product).join("User").join("settings.json"))
        .collect()
}

pub fn find_existing_settings(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|path| std::fs::metadata(path).is_ok_and(|m| m.is_file()))
        .cloned()
}

/// The first installed build's `settings.json`, else the stable build's path.
pub fn default_vscode_settings_path(home: &Path) -> Option<PathBuf> {
    let candidates = candidate_settings_paths(home);
    find_existing_settings(&candidates).or_else(|| candidates.into_iter().next())
}
