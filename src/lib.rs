//! Provider profile switching for Claude Code and Codex CLI configs: a JSON/TOML/JSONC
//! patch engine plus thin adapters that write the result onto the live config files.

pub mod app;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod shared;
