//! Usage: Command facades for the desktop shell (`Result<T, String>` with coded error prefixes).

pub mod config_edit;
pub mod endpoints;
pub mod mcp;
pub mod switch;

use crate::infra::config_paths::ConfigPaths;
use crate::infra::settings::{self, SwitchSettings};
use crate::shared::app_kind::AppKind;
use crate::shared::error::ConfigError;

pub use config_edit::*;
pub use endpoints::*;
pub use mcp::*;
pub use switch::*;

fn parse_app_kind(raw: &str) -> Result<AppKind, String> {
    raw.parse::<AppKind>().map_err(String::from)
}

/// Current settings plus the live config locations they resolve to.
fn load_context() -> Result<(SwitchSettings, ConfigPaths), ConfigError> {
    let settings = settings::read(&settings::settings_path()?)?;
    let paths = ConfigPaths::resolve(&settings)?;
    Ok((settings, paths))
}
