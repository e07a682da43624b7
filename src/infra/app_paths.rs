//! Usage: Resolve the per-user data directory of the switcher and the user's home.

use std::path::{Path, PathBuf};

use crate::shared::error::ConfigError;

pub const APP_DOTDIR_NAME: &str = ".provider-switch";
/// Absolute directory that replaces `~/.provider-switch` (tests, portable installs).
pub const APP_HOME_ENV: &str = "PROVIDER_SWITCH_HOME";

pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or_else(|| ConfigError::Io("failed to resolve home dir".to_string()))
}

fn env_home_override() -> Option<PathBuf> {
    std::env::var(APP_HOME_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
}

/// Directory holding `settings.json` and logs. Created on demand.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match env_home_override() {
        Some(dir) => dir,
        None => home_dir()?.join(APP_DOTDIR_NAME),
    };
    ensure_dir(&dir)?;
    Ok(dir)
}

pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ConfigError::Io(format!("failed to create dir {}: {e}", dir.display())))
}

/// Expand a leading `~`, `~/` or `~\` against the home directory.
pub fn expand_home(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    Some(PathBuf::from(raw))
}
