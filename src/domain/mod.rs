//! Usage: Pure config patch engine (merge, codecs, targeted edits, templates, endpoint ranking).

pub mod codec;
pub mod codex_toml;
pub mod editor_settings;
pub mod endpoints;
pub mod field_path;
pub mod jsonc;
pub mod mcp_spec;
pub mod merge;
pub mod snippet;
pub mod template;
pub(crate) mod toml_text;
