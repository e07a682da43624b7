//! Usage: Live-editing commands for provider settings text (snippets, fields, templates, TOML base_url).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::codec::parse_json;
use crate::domain::editor_settings::{self, AppliedCheck};
use crate::domain::field_path::{self, FieldPath, SetFieldOptions};
use crate::domain::snippet::{self, SnippetUpdate};
use crate::domain::template::{self, TemplateUpdate, TemplateValueConfig};
use crate::domain::{codex_toml, codec};

pub fn config_toggle_common_snippet(doc: &str, snippet: &str, enabled: bool) -> SnippetUpdate {
    snippet::toggle_snippet(doc, snippet, enabled)
}

pub fn config_has_common_snippet(doc: &str, snippet: &str) -> bool {
    snippet::has_snippet(doc, snippet)
}

/// Rejects malformed paths; an unparsable document comes back unchanged.
pub fn config_set_field(
    doc: &str,
    path: &str,
    value: Value,
    create_if_missing: bool,
) -> Result<String, String> {
    FieldPath::parse(path)?;
    Ok(field_path::set_field_at_path(
        doc,
        path,
        value,
        SetFieldOptions { create_if_missing },
    ))
}

pub fn config_get_field(doc: &str, path: &str) -> Option<Value> {
    field_path::get_field_at_path(doc, path)
}

pub fn config_set_api_key(doc: &str, api_key: &str, create_if_missing: bool) -> String {
    field_path::set_api_key(doc, api_key, SetFieldOptions { create_if_missing })
}

pub fn config_get_api_key(doc: &str) -> String {
    field_path::get_api_key(doc)
}

pub fn config_website_url(doc: &str) -> String {
    field_path::extract_website_url(doc)
}

pub fn config_set_co_authored_disabled(doc: &str, disable: bool) -> String {
    field_path::set_co_authored_disabled(doc, disable)
}

fn parse_template(template_text: &str) -> Result<Value, String> {
    Ok(parse_json(template_text, "template")?)
}

/// Substitute a preset's template with the current form values (pretty JSON).
pub fn config_apply_template(
    template_text: &str,
    values: &BTreeMap<String, TemplateValueConfig>,
) -> Result<String, String> {
    let template = parse_template(template_text)?;
    let resolved = template::template_values_from_configs(values);
    Ok(codec::to_pretty_json(&template::apply_template_values(
        &template, &resolved,
    )))
}

/// Push changed form values into a document the user may have edited by hand.
pub fn config_reapply_template(
    current_doc: &str,
    template_text: &str,
    values: &BTreeMap<String, TemplateValueConfig>,
) -> Result<TemplateUpdate, String> {
    let template = parse_template(template_text)?;
    let keys: Vec<&str> = values.keys().map(String::as_str).collect();
    let paths = template::locate_placeholder_paths(&template, &keys);
    let resolved = template::template_values_from_configs(values);
    Ok(template::reapply_template_values(
        current_doc,
        &template,
        &paths,
        &resolved,
    ))
}

pub fn codex_config_base_url(config_text: &str) -> Option<String> {
    codex_toml::extract_base_url(config_text)
}

pub fn codex_config_set_base_url(config_text: &str, url: &str) -> String {
    codex_toml::set_base_url(config_text, url)
}

pub fn codex_config_validate(config_text: &str) -> Result<(), String> {
    Ok(codex_toml::validate_config_toml(config_text)?)
}

pub fn editor_settings_apply(text: &str, base_url: Option<&str>, is_official: bool) -> String {
    editor_settings::apply_provider(text, base_url, is_official)
}

pub fn editor_settings_detect(text: &str) -> AppliedCheck {
    editor_settings::detect_applied(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(key: &str, editor_value: &str) -> BTreeMap<String, TemplateValueConfig> {
        BTreeMap::from([(
            key.to_string(),
            TemplateValueConfig {
                label: key.to_string(),
                editor_value: editor_value.to_string(),
                ..TemplateValueConfig::default()
            },
        )])
    }

    #[test]
    fn set_field_rejects_bad_path_with_code() {
        let err = config_set_field("{}", "env..X", json!("1"), true).unwrap_err();
        assert!(err.starts_with("SEC_INVALID_INPUT:"), "{err}");

        let out = config_set_field("{}", "env.X", json!("1"), true).expect("set");
        assert_eq!(config_get_field(&out, "env.X"), Some(json!("1")));
    }

    #[test]
    fn template_apply_and_reapply() {
        let template = r#"{"env": {"ANTHROPIC_BASE_URL": "${ENDPOINT}", "ANTHROPIC_AUTH_TOKEN": ""}}"#;
        let applied = config_apply_template(template, &form("ENDPOINT", "https://a")).expect("apply");
        assert!(applied.contains("\"ANTHROPIC_BASE_URL\": \"https://a\""), "{applied}");

        let edited = config_set_api_key(&applied, "sk-user", false);
        let update = config_reapply_template(&edited, template, &form("ENDPOINT", "https://b"))
            .expect("reapply");
        assert!(update.error.is_none(), "{:?}", update.error);
        assert_eq!(config_get_api_key(&update.updated_doc), "sk-user");
        assert_eq!(
            config_get_field(&update.updated_doc, "env.ANTHROPIC_BASE_URL"),
            Some(json!("https://b"))
        );
    }

    #[test]
    fn invalid_template_is_a_parse_error() {
        let err = config_apply_template("{", &BTreeMap::new()).unwrap_err();
        assert!(err.starts_with("CONFIG_PARSE_ERROR: template:"), "{err}");
    }

    #[test]
    fn codex_validate_flattens_error() {
        assert!(codex_config_validate("").is_ok());
        let err = codex_config_validate("x = ").unwrap_err();
        assert!(err.starts_with("CONFIG_PARSE_ERROR: config.toml:"), "{err}");
    }
}
