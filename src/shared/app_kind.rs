//! Usage: Supported CLI app kinds (single source of truth for `claude` / `codex` keys).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

pub const SUPPORTED_APP_KINDS: [&str; 2] = ["claude", "codex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    Claude,
    Codex,
}

impl AppKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
        }
    }

    /// Speed-test timeout the switcher uses for this app's endpoints.
    pub fn default_speedtest_timeout_secs(self) -> u64 {
        match self {
            Self::Claude => 8,
            Self::Codex => 12,
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            _ => Err(ConfigError::invalid_input(format!("unknown app_kind={raw}"))),
        }
    }
}

pub fn is_supported_app_kind(raw: &str) -> bool {
    SUPPORTED_APP_KINDS.contains(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_supported_app_kind_accepts_supported() {
        for key in SUPPORTED_APP_KINDS {
            assert!(is_supported_app_kind(key));
            assert_eq!(key.parse::<AppKind>().expect("parse").as_str(), key);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" Codex ".parse::<AppKind>().expect("parse"), AppKind::Codex);
    }

    #[test]
    fn parse_rejects_unknown_with_sec_invalid_input() {
        let err = "gemini".parse::<AppKind>().unwrap_err();
        assert_eq!(err.to_string(), "SEC_INVALID_INPUT: unknown app_kind=gemini");
        assert!(!is_supported_app_kind(""));
    }
}
