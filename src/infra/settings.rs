//! Usage: Persisted switcher settings (schema + read/write helpers).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::app_paths;
use crate::domain::endpoints::normalize_endpoint_url;
use crate::shared::app_kind::AppKind;
use crate::shared::error::ConfigError;
use crate::shared::fs::{read_optional_file, write_file_atomic};

pub const SCHEMA_VERSION: u32 = 2;
const SCHEMA_VERSION_ADD_CUSTOM_ENDPOINTS: u32 = 2;
pub const MIN_SPEEDTEST_TIMEOUT_SECS: u64 = 2;
pub const MAX_SPEEDTEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SPEEDTEST_TIMEOUT_SECS: u64 = 8;
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomEndpoint {
    pub url: String,
    /// Unix millis.
    pub added_at: i64,
    pub last_used: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchSettings {
    pub schema_version: u32,
    pub claude_config_dir: Option<String>,
    pub codex_config_dir: Option<String>,
    pub vscode_settings_path: Option<String>,
    pub vscode_sync_enabled: bool,
    pub claude_plugin_integration: bool,
    pub speedtest_timeout_secs: Option<u64>,
    pub common_config_snippets: BTreeMap<AppKind, String>,
    pub custom_endpoints: BTreeMap<AppKind, Vec<CustomEndpoint>>,
}

impl Default for SwitchSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            claude_config_dir: None,
            codex_config_dir: None,
            vscode_settings_path: None,
            vscode_sync_enabled: false,
            claude_plugin_integration: false,
            speedtest_timeout_secs: None,
            common_config_snippets: BTreeMap::new(),
            custom_endpoints: BTreeMap::new(),
        }
    }
}

pub fn now_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub fn clamp_speedtest_timeout(secs: u64) -> u64 {
    secs.clamp(MIN_SPEEDTEST_TIMEOUT_SECS, MAX_SPEEDTEST_TIMEOUT_SECS)
}

fn trim_override(value: &mut Option<String>) -> bool {
    let next = value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    if *value == next {
        return false;
    }
    *value = next;
    true
}

/// `~` is expanded; blank means "use the default location".
pub fn resolve_override_path(raw: Option<&str>) -> Option<PathBuf> {
    app_paths::expand_home(raw?)
}

impl SwitchSettings {
    /// Trim overrides, clamp the timeout and drop blank/duplicate custom endpoints.
    /// Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        changed |= trim_override(&mut self.claude_config_dir);
        changed |= trim_override(&mut self.codex_config_dir);
        changed |= trim_override(&mut self.vscode_settings_path);

        if let Some(secs) = self.speedtest_timeout_secs {
            let clamped = clamp_speedtest_timeout(secs);
            if clamped != secs {
                self.speedtest_timeout_secs = Some(clamped);
                changed = true;
            }
        }

        for list in self.custom_endpoints.values_mut() {
            let before = list.len();
            let mut seen: Vec<String> = Vec::with_capacity(before);
            list.retain_mut(|entry| {
                let url = normalize_endpoint_url(&entry.url);
                if url.is_empty() || seen.contains(&url) {
                    return false;
                }
                if entry.url != url {
                    entry.url = url.clone();
                    changed = true;
                }
                seen.push(url);
                true
            });
            changed |= list.len() != before;
        }
        self.custom_endpoints.retain(|_, list| !list.is_empty());

        changed
    }

    pub fn claude_override_dir(&self) -> Option<PathBuf> {
        resolve_override_path(self.claude_config_dir.as_deref())
    }

    pub fn codex_override_dir(&self) -> Option<PathBuf> {
        resolve_override_path(self.codex_config_dir.as_deref())
    }

    pub fn vscode_override_path(&self) -> Option<PathBuf> {
        resolve_override_path(self.vscode_settings_path.as_deref())
    }

    /// Configured timeout, else the app's default, clamped to the allowed range.
    pub fn speedtest_timeout_for(&self, app: AppKind) -> u64 {
        clamp_speedtest_timeout(
            self.speedtest_timeout_secs
                .unwrap_or_else(|| app.default_speedtest_timeout_secs()),
        )
    }

    pub fn common_config_snippet(&self, app: AppKind) -> &str {
        self.common_config_snippets
            .get(&app)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Blank snippets are removed rather than stored.
    pub fn set_common_config_snippet(&mut self, app: AppKind, snippet: &str) {
        if snippet.trim().is_empty() {
            self.common_config_snippets.remove(&app);
        } else {
            self.common_config_snippets.insert(app, snippet.to_string());
        }
    }

    pub fn custom_endpoints_for(&self, app: AppKind) -> &[CustomEndpoint] {
        self.custom_endpoints
            .get(&app)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns false when the URL is already stored.
    pub fn add_custom_endpoint(&mut self, app: AppKind, url: &str) -> Result<bool, ConfigError> {
        let url = normalize_endpoint_url(url);
        if url.is_empty() {
            return Err(ConfigError::invalid_input("URL is required"));
        }
        let list = self.custom_endpoints.entry(app).or_default();
        if list.iter().any(|e| e.url == url) {
            return Ok(false);
        }
        list.push(CustomEndpoint {
            url,
            added_at: now_unix_millis(),
            last_used: None,
        });
        Ok(true)
    }

    pub fn remove_custom_endpoint(&mut self, app: AppKind, url: &str) -> bool {
        let url = normalize_endpoint_url(url);
        let Some(list) = self.custom_endpoints.get_mut(&app) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.url != url);
        let removed = list.len() != before;
        if list.is_empty() {
            self.custom_endpoints.remove(&app);
        }
        removed
    }

    pub fn touch_custom_endpoint(&mut self, app: AppKind, url: &str) -> bool {
        let url = normalize_endpoint_url(url);
        let entry = self
            .custom_endpoints
            .get_mut(&app)
            .and_then(|list| list.iter_mut().find(|e| e.url == url));
        match entry {
            Some(entry) => {
                entry.last_used = Some(now_unix_millis());
                true
            }
            None => false,
        }
    }
}

fn migrate_add_custom_endpoints(settings: &mut SwitchSettings, schema_version_present: bool) -> bool {
    if schema_version_present && settings.schema_version >= SCHEMA_VERSION_ADD_CUSTOM_ENDPOINTS {
        return false;
    }
    settings.schema_version = SCHEMA_VERSION;
    true
}

pub fn settings_path() -> Result<PathBuf, ConfigError> {
    Ok(app_paths::app_data_dir()?.join(SETTINGS_FILE_NAME))
}

fn parse_settings_json(content: &[u8]) -> Result<(SwitchSettings, bool), ConfigError> {
    let raw: serde_json::Value = serde_json::from_slice(content)
        .map_err(|e| ConfigError::parse(SETTINGS_FILE_NAME, e))?;
    let schema_version_present = raw.get("schema_version").is_some();
    let settings: SwitchSettings =
        serde_json::from_value(raw).map_err(|e| ConfigError::parse(SETTINGS_FILE_NAME, e))?;
    Ok((settings, schema_version_present))
}

/// Missing file reads as defaults. Repaired values are written back best-effort.
pub fn read(path: &Path) -> Result<SwitchSettings, ConfigError> {
    let Some(content) = read_optional_file(path)? else {
        return Ok(SwitchSettings::default());
    };

    let (mut settings, schema_version_present) = parse_settings_json(&content)?;

    let mut repaired = false;
    repaired |= migrate_add_custom_endpoints(&mut settings, schema_version_present);
    repaired |= settings.normalize();
    if repaired {
        if let Err(err) = write(path, &settings) {
            tracing::warn!(path = %path.display(), "settings repair write failed: {err}");
        }
    }

    Ok(settings)
}

pub fn write(path: &Path, settings: &SwitchSettings) -> Result<SwitchSettings, ConfigError> {
    if let Some(secs) = settings.speedtest_timeout_secs {
        if !(MIN_SPEEDTEST_TIMEOUT_SECS..=MAX_SPEEDTEST_TIMEOUT_SECS).contains(&secs) {
            return Err(ConfigError::invalid_input(format!(
                "speedtest_timeout_secs must be between {MIN_SPEEDTEST_TIMEOUT_SECS} and {MAX_SPEEDTEST_TIMEOUT_SECS}"
            )));
        }
    }

    let mut next = settings.clone();
    next.schema_version = SCHEMA_VERSION;
    next.normalize();

    let mut bytes = serde_json::to_vec_pretty(&next)
        .map_err(|e| ConfigError::Io(format!("failed to serialize settings: {e}")))?;
    bytes.push(b'\n');
    write_file_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), "settings written");

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = read(&dir.path().join("settings.json")).expect("read");
        assert_eq!(settings, SwitchSettings::default());
        assert!(!dir.path().join("settings.json").exists());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{nope").expect("write");
        let err = read(&path).unwrap_err();
        assert!(err.is_parse(), "{err}");
    }

    #[test]
    fn legacy_file_without_schema_is_repaired_on_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"claude_config_dir": "  ~/custom  ", "speedtest_timeout_secs": 90}"#,
        )
        .expect("write");

        let settings = read(&path).expect("read");
        assert_eq!(settings.schema_version, SCHEMA_VERSION);
        assert_eq!(settings.claude_config_dir.as_deref(), Some("~/custom"));
        assert_eq!(settings.speedtest_timeout_secs, Some(MAX_SPEEDTEST_TIMEOUT_SECS));

        let persisted = std::fs::read_to_string(&path).expect("read back");
        assert!(persisted.contains("\"schema_version\": 2"), "{persisted}");
        assert!(persisted.ends_with('\n'), "{persisted}");
    }

    #[test]
    fn write_rejects_out_of_range_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = SwitchSettings {
            speedtest_timeout_secs: Some(1),
            ..SwitchSettings::default()
        };
        let err = write(&dir.path().join("settings.json"), &settings).unwrap_err();
        assert!(err.to_string().starts_with("SEC_INVALID_INPUT:"), "{err}");
    }

    #[test]
    fn write_then_read_keeps_snippets_and_endpoints() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = SwitchSettings::default();
        settings.set_common_config_snippet(AppKind::Claude, r#"{"includeCoAuthoredBy": false}"#);
        settings.set_common_config_snippet(AppKind::Codex, "   ");
        assert!(settings
            .add_custom_endpoint(AppKind::Codex, "https://relay.example/v1/")
            .expect("add"));
        assert!(!settings
            .add_custom_endpoint(AppKind::Codex, "https://relay.example/v1")
            .expect("add"));
        write(&path, &settings).expect("write");

        let back = read(&path).expect("read");
        assert_eq!(back, settings);
        assert_eq!(back.common_config_snippet(AppKind::Codex), "");
        assert_eq!(
            back.custom_endpoints_for(AppKind::Codex)[0].url,
            "https://relay.example/v1"
        );
    }

    #[test]
    fn custom_endpoint_touch_and_remove() {
        let mut settings = SwitchSettings::default();
        assert!(settings.add_custom_endpoint(AppKind::Claude, "").is_err());
        settings
            .add_custom_endpoint(AppKind::Claude, "https://a.example")
            .expect("add");
        assert!(settings.touch_custom_endpoint(AppKind::Claude, "https://a.example/"));
        assert!(settings.custom_endpoints_for(AppKind::Claude)[0]
            .last_used
            .is_some());
        assert!(!settings.touch_custom_endpoint(AppKind::Codex, "https://a.example"));
        assert!(settings.remove_custom_endpoint(AppKind::Claude, "https://a.example"));
        assert!(settings.custom_endpoints.is_empty());
        assert!(!settings.remove_custom_endpoint(AppKind::Claude, "https://a.example"));
    }

    #[test]
    fn speedtest_timeout_defaults_per_app() {
        let mut settings = SwitchSettings::default();
        assert_eq!(settings.speedtest_timeout_for(AppKind::Claude), 8);
        assert_eq!(settings.speedtest_timeout_for(AppKind::Codex), 12);
        settings.speedtest_timeout_secs = Some(20);
        assert_eq!(settings.speedtest_timeout_for(AppKind::Claude), 20);
    }

    #[test]
    fn normalize_dedupes_endpoints_and_drops_blank_overrides() {
        let mut settings = SwitchSettings {
            codex_config_dir: Some("   ".to_string()),
            ..SwitchSettings::default()
        };
        settings.custom_endpoints.insert(
            AppKind::Claude,
            vec![
                CustomEndpoint {
                    url: "https://a/".to_string(),
                    ..CustomEndpoint::default()
                },
                CustomEndpoint {
                    url: "https://a".to_string(),
                    ..CustomEndpoint::default()
                },
                CustomEndpoint::default(),
            ],
        );
        assert!(settings.normalize());
        assert_eq!(settings.codex_config_dir, None);
        assert_eq!(settings.custom_endpoints_for(AppKind::Claude).len(), 1);
        assert!(!settings.normalize());
    }
}
