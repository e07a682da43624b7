//! Usage: Infrastructure adapters (filesystem paths, persistence, live CLI files, network probes).

pub mod app_paths;
pub mod config_paths;
pub mod endpoint_probe;
pub mod live_config;
pub mod mcp_sync;
pub mod settings;
