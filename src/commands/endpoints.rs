//! Usage: Endpoint speed-test commands and persisted custom endpoints.

use crate::domain::endpoints::{self, EndpointCandidate, EndpointEntry, EndpointLatency};
use crate::infra::endpoint_probe;
use crate::infra::settings::{self, CustomEndpoint, SwitchSettings};
use crate::shared::app_kind::AppKind;

use super::{load_context, parse_app_kind};

/// Probe `urls`. Without an explicit timeout the app's configured one is used.
pub async fn endpoints_test(
    app_kind: &str,
    urls: Vec<String>,
    timeout_secs: Option<u64>,
) -> Result<Vec<EndpointLatency>, String> {
    let app = parse_app_kind(app_kind)?;
    let timeout = match timeout_secs {
        Some(secs) => secs,
        None => load_context()
            .map(|(settings, _)| settings.speedtest_timeout_for(app))
            .unwrap_or_else(|err| {
                tracing::warn!("settings unavailable, using default speed-test timeout: {err}");
                app.default_speedtest_timeout_secs()
            }),
    };
    Ok(endpoint_probe::measure_latency(urls, Some(timeout)).await?)
}

/// Full speed-test pass over a candidate list: measure, rank, and pick the
/// fastest URL when it differs from `selected`.
pub async fn endpoints_rank(
    app_kind: &str,
    candidates: Vec<EndpointCandidate>,
    selected: String,
    timeout_secs: Option<u64>,
) -> Result<(Vec<EndpointEntry>, Option<String>), String> {
    let mut entries = endpoints::build_initial_entries(&candidates, &selected);
    let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
    let results = endpoints_test(app_kind, urls, timeout_secs).await?;

    endpoints::reset_results(&mut entries);
    endpoints::apply_latency_results(&mut entries, &results);
    endpoints::sort_entries(&mut entries);
    Ok((entries, endpoints::auto_select(&results, &selected)))
}

fn update_custom_endpoints(
    app_kind: &str,
    update: impl FnOnce(&mut SwitchSettings, AppKind) -> Result<(), String>,
) -> Result<Vec<CustomEndpoint>, String> {
    let app = parse_app_kind(app_kind)?;
    let path = settings::settings_path()?;
    let mut current = settings::read(&path)?;
    update(&mut current, app)?;
    let saved = settings::write(&path, &current)?;
    Ok(saved.custom_endpoints_for(app).to_vec())
}

pub fn endpoints_custom_list(app_kind: &str) -> Result<Vec<CustomEndpoint>, String> {
    let app = parse_app_kind(app_kind)?;
    let (settings, _) = load_context()?;
    Ok(settings.custom_endpoints_for(app).to_vec())
}

/// Validates against `existing` (the URLs currently shown) before persisting.
pub fn endpoints_custom_add(
    app_kind: &str,
    existing: Vec<EndpointCandidate>,
    url: &str,
) -> Result<Vec<CustomEndpoint>, String> {
    let entries = endpoints::build_initial_entries(&existing, "");
    let url = endpoints::validate_custom_url(&entries, url)?;
    update_custom_endpoints(app_kind, |settings, app| {
        settings.add_custom_endpoint(app, &url)?;
        Ok(())
    })
}

pub fn endpoints_custom_remove(app_kind: &str, url: &str) -> Result<Vec<CustomEndpoint>, String> {
    update_custom_endpoints(app_kind, |settings, app| {
        settings.remove_custom_endpoint(app, url);
        Ok(())
    })
}

pub fn endpoints_custom_touch(app_kind: &str, url: &str) -> Result<Vec<CustomEndpoint>, String> {
    update_custom_endpoints(app_kind, |settings, app| {
        settings.touch_custom_endpoint(app, url);
        Ok(())
    })
}
