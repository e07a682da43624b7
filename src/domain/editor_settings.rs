//! Usage: Manage the two Codex keys inside the VS Code `settings.json` (JSONC) without
//! disturbing anything else in the file.

use serde::Serialize;
use serde_json::{json, Value};

use super::codec::to_pretty_json;
use super::jsonc::{self, FormattingOptions};

pub const KEY_API_BASE: &str = "chatgpt.apiBase";
pub const KEY_CONFIG: &str = "chatgpt.config";
pub const KEY_PREFERRED_AUTH_METHOD: &str = "preferred_auth_method";
pub const AUTH_METHOD_API_KEY: &str = "apikey";

// Older builds wrote the auth method under a nested `chatgpt` -> `config` object.
const LEGACY_AUTH_PATH: [&str; 3] = ["chatgpt", "config", KEY_PREFERRED_AUTH_METHOD];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedCheck {
    pub has_api_base: bool,
    pub api_base: Option<String>,
    pub has_preferred_auth_method: bool,
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Unparsable text reports nothing applied.
pub fn detect_applied(text: &str) -> AppliedCheck {
    let Ok(data) = jsonc::parse(text) else {
        return AppliedCheck::default();
    };

    let api_base = data
        .get(KEY_API_BASE)
        .and_then(Value::as_str)
        .map(str::to_string);
    let has_preferred_auth_method = data
        .get(KEY_CONFIG)
        .and_then(|config| config.get(KEY_PREFERRED_AUTH_METHOD))
        .is_some_and(Value::is_string);

    AppliedCheck {
        has_api_base: api_base.is_some(),
        api_base,
        has_preferred_auth_method,
    }
}

fn delete_path(text: &str, path: &[&str], options: &FormattingOptions) -> String {
    jsonc::set_path(text, path, None, options).unwrap_or_else(|_| text.to_string())
}

/// Drop `parent` when it is left as an empty object (or holds a non-object value and `strict`).
fn drop_leftover(text: &str, parent: &[&str], strict: bool, options: &FormattingOptions) -> String {
    let Ok(data) = jsonc::parse(text) else {
        return text.to_string();
    };
    let leftover = parent.iter().try_fold(&data, |node, key| node.get(*key));
    let should_remove = match leftover {
        None => false,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => strict,
    };
    if should_remove {
        delete_path(text, parent, options)
    } else {
        text.to_string()
    }
}

/// Remove every key this tool manages. Blank text is returned unchanged.
pub fn remove_managed_keys(text: &str) -> String {
    if is_blank(text) {
        return text.to_string();
    }
    let options = FormattingOptions::default();

    let mut out = delete_path(text, &[KEY_API_BASE], &options);
    out = delete_path(&out, &[KEY_CONFIG, KEY_PREFERRED_AUTH_METHOD], &options);
    out = delete_path(&out, &LEGACY_AUTH_PATH, &options);

    out = drop_leftover(&out, &[KEY_CONFIG], true, &options);
    out = drop_leftover(&out, &LEGACY_AUTH_PATH[..2], false, &options);
    drop_leftover(&out, &LEGACY_AUTH_PATH[..1], false, &options)
}

/// Rewrite the managed keys for the selected provider.
///
/// Official providers (or a missing base URL) only get the managed keys removed.
pub fn apply_provider(text: &str, base_url: Option<&str>, is_official: bool) -> String {
    let out = remove_managed_keys(text);

    let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) else {
        return out;
    };
    if is_official {
        return out;
    }
    let api_base = normalize_base_url(base_url.trim());

    if is_blank(&out) {
        let doc = json!({
            KEY_API_BASE: api_base,
            KEY_CONFIG: { KEY_PREFERRED_AUTH_METHOD: AUTH_METHOD_API_KEY },
        });
        return format!("{}\n", to_pretty_json(&doc));
    }

    let options = FormattingOptions::default();
    let with_base = match jsonc::set_path(&out, &[KEY_API_BASE], Some(&json!(api_base)), &options)
    {
        Ok(next) => next,
        Err(_) => return out,
    };
    jsonc::set_path(
        &with_base,
        &[KEY_CONFIG, KEY_PREFERRED_AUTH_METHOD],
        Some(&json!(AUTH_METHOD_API_KEY)),
        &options,
    )
    .unwrap_or(with_base)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_DOC: &str = "{\n  // keep me\n  \"foo\": 1\n}";

    #[test]
    fn apply_then_remove_is_byte_identical() {
        let applied = apply_provider(USER_DOC, Some("https://relay.example/v1/"), false);
        assert!(applied.contains("// keep me"), "{applied}");
        assert!(applied.contains("\"foo\": 1"), "{applied}");

        let check = detect_applied(&applied);
        assert_eq!(
            check,
            AppliedCheck {
                has_api_base: true,
                api_base: Some("https://relay.example/v1".to_string()),
                has_preferred_auth_method: true,
            }
        );

        assert_eq!(remove_managed_keys(&applied), USER_DOC);
        assert_eq!(apply_provider(&applied, None, false), USER_DOC);
    }

    #[test]
    fn apply_twice_is_stable() {
        let once = apply_provider(USER_DOC, Some("https://a"), false);
        let twice = apply_provider(&once, Some("https://a"), false);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_document_gets_two_key_object() {
        let out = apply_provider("", Some("https://x/"), false);
        assert_eq!(
            out,
            "{\n  \"chatgpt.apiBase\": \"https://x\",\n  \"chatgpt.config\": {\n    \"preferred_auth_method\": \"apikey\"\n  }\n}\n"
        );
    }

    #[test]
    fn official_provider_only_removes_keys() {
        let applied = apply_provider(USER_DOC, Some("https://a"), false);
        assert_eq!(apply_provider(&applied, Some("https://a"), true), USER_DOC);
        assert_eq!(apply_provider("", Some("https://a"), true), "");
    }

    #[test]
    fn remove_cleans_scalar_and_empty_config() {
        let text = "{\n  \"a\": 1,\n  \"chatgpt.config\": null\n}";
        assert_eq!(remove_managed_keys(text), "{\n  \"a\": 1\n}");

        let text = "{\n  \"a\": 1,\n  \"chatgpt.config\": {\n    \"other\": true,\n    \"preferred_auth_method\": \"apikey\"\n  }\n}";
        let out = remove_managed_keys(text);
        assert_eq!(
            out,
            "{\n  \"a\": 1,\n  \"chatgpt.config\": {\n    \"other\": true\n  }\n}"
        );
    }

    #[test]
    fn commented_lone_key_stays_valid_jsonc() {
        let text = "{\n  // my settings\n  \"chatgpt.apiBase\": \"https://old\",\n}\n";
        let removed = remove_managed_keys(text);
        assert!(removed.contains("// my settings"), "{removed}");
        assert_eq!(jsonc::parse(&removed).expect("parse"), json!({}));

        let applied = apply_provider(text, Some("https://new"), false);
        assert_eq!(
            jsonc::parse(&applied).expect("parse"),
            json!({
                "chatgpt.apiBase": "https://new",
                "chatgpt.config": {"preferred_auth_method": "apikey"}
            })
        );
    }

    #[test]
    fn remove_cleans_legacy_nested_form() {
        let text = "{\n  \"a\": 1,\n  \"chatgpt\": {\n    \"config\": {\n      \"preferred_auth_method\": \"apikey\"\n    }\n  }\n}";
        assert_eq!(remove_managed_keys(text), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn remove_leaves_unparsable_text_alone() {
        let text = "{ \"chatgpt.apiBase\": ";
        assert_eq!(remove_managed_keys(text), text);
        assert_eq!(detect_applied(text), AppliedCheck::default());
        assert_eq!(remove_managed_keys("  \n"), "  \n");
    }

    #[test]
    fn detect_ignores_non_string_values() {
        let check = detect_applied("{\"chatgpt.apiBase\": 1, \"chatgpt.config\": {\"preferred_auth_method\": 2}}");
        assert!(!check.has_api_base);
        assert!(!check.has_preferred_auth_method);
    }

    #[test]
    fn normalize_base_url_strips_trailing_slashes() {
        assert_eq!(normalize_base_url("https://a/v1///"), "https://a/v1");
        assert_eq!(normalize_base_url("https://a"), "https://a");
    }
}
