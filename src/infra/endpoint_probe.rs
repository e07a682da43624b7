//! Usage: Endpoint latency probe (warm-up request, then one timed GET per URL, in parallel).

use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::domain::endpoints::EndpointLatency;
use crate::infra::settings::{clamp_speedtest_timeout, DEFAULT_SPEEDTEST_TIMEOUT_SECS};
use crate::shared::error::ConfigError;

const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = concat!("provider-switch-speedtest/", env!("CARGO_PKG_VERSION"));

pub fn effective_timeout_secs(timeout_secs: Option<u64>) -> u64 {
    clamp_speedtest_timeout(timeout_secs.unwrap_or(DEFAULT_SPEEDTEST_TIMEOUT_SECS))
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ConfigError::Io(format!("failed to build http client: {e}")))
}

fn failed(url: String, status: Option<u16>, error: impl Into<String>) -> EndpointLatency {
    EndpointLatency {
        url,
        latency_ms: None,
        status,
        error: Some(error.into()),
    }
}

fn describe_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    }
}

async fn probe_endpoint(client: &reqwest::Client, raw_url: String) -> EndpointLatency {
    let trimmed = raw_url.trim().to_string();
    if trimmed.is_empty() {
        return failed(raw_url, None, "URL is required");
    }
    let url = match reqwest::Url::parse(&trimmed) {
        Ok(url) => url,
        Err(e) => return failed(trimmed, None, format!("invalid URL: {e}")),
    };

    // Warm-up; only the second request is timed.
    let _ = client.get(url.clone()).send().await;

    let started = Instant::now();
    match client.get(url).send().await {
        Ok(resp) => EndpointLatency {
            url: trimmed,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            status: Some(resp.status().as_u16()),
            error: None,
        },
        Err(e) => failed(trimmed, e.status().map(|s| s.as_u16()), describe_error(&e)),
    }
}

/// Probe every URL concurrently. Results keep the input order; per-URL failures
/// are reported in `error`, never as an `Err`.
pub async fn measure_latency(
    urls: Vec<String>,
    timeout_secs: Option<u64>,
) -> Result<Vec<EndpointLatency>, ConfigError> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let timeout = effective_timeout_secs(timeout_secs);
    let client = build_client(timeout)?;
    let total = urls.len();

    let mut tasks = JoinSet::new();
    for (idx, url) in urls.iter().cloned().enumerate() {
        let client = client.clone();
        tasks.spawn(async move { (idx, probe_endpoint(&client, url).await) });
    }

    let mut slots: Vec<Option<EndpointLatency>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(err) => tracing::warn!("endpoint probe task failed: {err}"),
        }
    }

    let results: Vec<EndpointLatency> = slots
        .into_iter()
        .zip(urls)
        .map(|(slot, url)| slot.unwrap_or_else(|| failed(url, None, "probe task aborted")))
        .collect();

    let ok = results.iter().filter(|r| r.latency_ms.is_some()).count();
    tracing::info!(total, ok, timeout_secs = timeout, "endpoint speed test finished");
    Ok(results)
}
