//! Usage: Targeted `base_url = "..."` read/replace inside Codex `config.toml` text.
//!
//! This is a text patch bound to a single key, not a TOML editor: comments and
//! layout of a hand-edited file survive because nothing else is re-serialized.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::codec::validate_toml;
use super::toml_text::escape_basic_string;
use crate::shared::error::ConfigError;

fn base_url_assignment() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^(?P<prefix>[ \t]*base_url[ \t]*=[ \t]*)(?:"(?P<dq>[^"\r\n]*)"|'(?P<sq>[^'\r\n]*)')"#)
            .ok()
    })
    .as_ref()
}

fn first_assignment(text: &str) -> Option<Captures<'_>> {
    base_url_assignment()?.captures(text)
}

/// Escape sequences of a basic string body; the raw body when it does not decode.
fn decode_basic_string(raw: &str) -> String {
    format!("v = \"{raw}\"")
        .parse::<toml::Table>()
        .ok()
        .and_then(|table| table.get("v").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

/// Value of the first `base_url` assignment (single or double quoted).
pub fn extract_base_url(text: &str) -> Option<String> {
    let caps = first_assignment(text)?;
    if let Some(dq) = caps.name("dq") {
        return Some(decode_basic_string(dq.as_str()));
    }
    caps.name("sq").map(|m| m.as_str().to_string())
}

/// Replace the first `base_url` value, keeping its quote style. Text without an
/// assignment is returned unchanged.
pub fn set_base_url(text: &str, url: &str) -> String {
    let Some(caps) = first_assignment(text) else {
        return text.to_string();
    };
    let (Some(whole), Some(prefix)) = (caps.get(0), caps.name("prefix")) else {
        return text.to_string();
    };

    let single_quoted = caps.name("sq").is_some() && !url.contains('\'');
    let value = if single_quoted {
        format!("'{url}'")
    } else {
        format!("\"{}\"", escape_basic_string(url))
    };

    let mut out = String::with_capacity(text.len() + url.len());
    out.push_str(&text[..whole.start()]);
    out.push_str(prefix.as_str());
    out.push_str(&value);
    out.push_str(&text[whole.end()..]);
    out
}

pub fn validate_config_toml(text: &str) -> Result<(), ConfigError> {
    validate_toml(text).map_err(|err| match err {
        ConfigError::Parse { message, .. } => ConfigError::parse("config.toml", message),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"# relay settings
model_provider = "relay"
model = "gpt-5-codex"

[model_providers.relay]
name = "relay"
base_url = "https://relay.example/v1" # keep
wire_api = "responses"
"#;

    #[test]
    fn extract_reads_double_and_single_quotes() {
        assert_eq!(
            extract_base_url(CONFIG).as_deref(),
            Some("https://relay.example/v1")
        );
        assert_eq!(
            extract_base_url("  base_url='http://x'\n").as_deref(),
            Some("http://x")
        );
        assert_eq!(extract_base_url("model = \"m\""), None);
        assert_eq!(extract_base_url("# base_url = \"commented\""), None);
    }

    #[test]
    fn extract_decodes_basic_string_escapes() {
        assert_eq!(
            extract_base_url(r#"base_url = "https://\u0041.example/v1""#).as_deref(),
            Some("https://A.example/v1")
        );
        assert_eq!(
            extract_base_url(r#"base_url = "https://bad\q""#).as_deref(),
            Some(r"https://bad\q")
        );
        assert_eq!(
            extract_base_url(r"base_url = 'C:\relay\u0041'").as_deref(),
            Some(r"C:\relay\u0041")
        );
    }

    #[test]
    fn set_replaces_only_the_value() {
        let out = set_base_url(CONFIG, "https://other.example/v2");
        assert_eq!(
            out,
            CONFIG.replace("https://relay.example/v1", "https://other.example/v2")
        );
        assert_eq!(
            extract_base_url(&out).as_deref(),
            Some("https://other.example/v2")
        );
    }

    #[test]
    fn set_keeps_single_quote_style() {
        assert_eq!(set_base_url("base_url = 'a'\n", "b"), "base_url = 'b'\n");
        assert_eq!(set_base_url("base_url = 'a'\n", "it's"), "base_url = \"it's\"\n");
    }

    #[test]
    fn set_without_assignment_is_noop() {
        let text = "model = \"m\"\n";
        assert_eq!(set_base_url(text, "https://x"), text);
    }

    #[test]
    fn set_touches_first_assignment_only() {
        let text = "base_url = \"a\"\n[x]\nbase_url = \"b\"\n";
        assert_eq!(set_base_url(text, "z"), "base_url = \"z\"\n[x]\nbase_url = \"b\"\n");
    }

    #[test]
    fn validate_config_toml_labels_errors() {
        assert!(validate_config_toml("").is_ok());
        assert!(validate_config_toml(CONFIG).is_ok());
        let err = validate_config_toml("[broken").unwrap_err();
        assert!(
            err.to_string().starts_with("CONFIG_PARSE_ERROR: config.toml:"),
            "{err}"
        );
    }
}
