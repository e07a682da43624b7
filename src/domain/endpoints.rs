//! Usage: Endpoint candidates for a speed-test session (normalize, dedupe, rank).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::shared::error::ConfigError;

pub const NO_RESULT_ERROR: &str = "no result returned";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCandidate {
    pub url: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl EndpointCandidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_custom: false,
        }
    }

    pub fn custom(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_custom: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointEntry {
    pub url: String,
    pub is_custom: bool,
    pub latency_ms: Option<u64>,
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// One probe outcome. `latency_ms` is `None` when the request failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointLatency {
    pub url: String,
    pub latency_ms: Option<u64>,
    pub status: Option<u16>,
    pub error: Option<String>,
}

pub fn normalize_endpoint_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn push_candidate(entries: &mut Vec<EndpointEntry>, candidate: &EndpointCandidate) -> bool {
    let url = normalize_endpoint_url(&candidate.url);
    if url.is_empty() || entries.iter().any(|e| e.url == url) {
        return false;
    }
    entries.push(EndpointEntry {
        url,
        is_custom: candidate.is_custom,
        ..EndpointEntry::default()
    });
    true
}

/// Deduplicated entries in candidate order; `selected` is appended as a custom
/// entry when no candidate matches it.
pub fn build_initial_entries(candidates: &[EndpointCandidate], selected: &str) -> Vec<EndpointEntry> {
    let mut entries = Vec::with_capacity(candidates.len() + 1);
    merge_candidates(&mut entries, candidates);
    push_candidate(&mut entries, &EndpointCandidate::custom(selected));
    entries
}

/// Append candidates not yet present. Returns whether anything was added.
pub fn merge_candidates(entries: &mut Vec<EndpointEntry>, candidates: &[EndpointCandidate]) -> bool {
    let mut changed = false;
    for candidate in candidates {
        changed |= push_candidate(entries, candidate);
    }
    changed
}

/// Validate a user-typed endpoint; returns its normalized form.
pub fn validate_custom_url(entries: &[EndpointEntry], raw: &str) -> Result<String, ConfigError> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return Err(ConfigError::invalid_input("URL is required"));
    }
    let parsed = reqwest::Url::parse(candidate)
        .map_err(|e| ConfigError::invalid_input(format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_input("only http/https URLs are supported"));
    }

    let url = normalize_endpoint_url(parsed.as_str());
    if entries.iter().any(|e| e.url == url) {
        return Err(ConfigError::invalid_input(format!("endpoint already exists: {url}")));
    }
    Ok(url)
}

/// Remove the entry for `url`. When it was the selected one, returns the
/// replacement selection (first remaining entry, or empty).
pub fn remove_entry(entries: &mut Vec<EndpointEntry>, url: &str, selected: &str) -> Option<String> {
    let url = normalize_endpoint_url(url);
    entries.retain(|e| e.url != url);
    if url != normalize_endpoint_url(selected) {
        return None;
    }
    Some(entries.first().map(|e| e.url.clone()).unwrap_or_default())
}

/// Drop previous measurements before a new run.
pub fn reset_results(entries: &mut [EndpointEntry]) {
    for entry in entries {
        entry.latency_ms = None;
        entry.status = None;
        entry.error = None;
    }
}

pub fn apply_latency_results(entries: &mut [EndpointEntry], results: &[EndpointLatency]) {
    for entry in entries {
        let matched = results
            .iter()
            .find(|r| normalize_endpoint_url(&r.url) == entry.url);
        match matched {
            Some(result) => {
                entry.latency_ms = result.latency_ms;
                entry.status = result.status;
                entry.error = result.error.clone();
            }
            None => {
                entry.latency_ms = None;
                entry.status = None;
                entry.error = Some(NO_RESULT_ERROR.to_string());
            }
        }
    }
}

/// Fastest first; unmeasured entries last; ties broken by URL.
pub fn sort_entries(entries: &mut [EndpointEntry]) {
    entries.sort_by(|a, b| match (a.latency_ms, b.latency_ms) {
        (Some(x), Some(y)) if x != y => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => a.url.cmp(&b.url),
    });
}

pub fn fastest(results: &[EndpointLatency]) -> Option<&EndpointLatency> {
    results
        .iter()
        .filter(|r| r.latency_ms.is_some())
        .min_by_key(|r| r.latency_ms)
}

/// URL to switch to after a run, if the fastest endpoint differs from `selected`.
pub fn auto_select(results: &[EndpointLatency], selected: &str) -> Option<String> {
    let best = normalize_endpoint_url(&fastest(results)?.url);
    (!best.is_empty() && best != normalize_endpoint_url(selected)).then_some(best)
}

/// Deduplicated URLs of custom entries, in order.
pub fn custom_urls(entries: &[EndpointEntry]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in entries.iter().filter(|e| e.is_custom) {
        let url = normalize_endpoint_url(&entry.url);
        if !url.is_empty() && !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latency(url: &str, ms: Option<u64>) -> EndpointLatency {
        EndpointLatency {
            url: url.to_string(),
            latency_ms: ms,
            status: ms.map(|_| 200),
            error: None,
        }
    }

    #[test]
    fn trailing_slash_variants_collapse_to_one_entry() {
        let entries = build_initial_entries(
            &[
                EndpointCandidate::new("https://a.example/v1"),
                EndpointCandidate::new("https://a.example/v1/ "),
                EndpointCandidate::new("  "),
            ],
            "https://a.example/v1//",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://a.example/v1");
        assert!(!entries[0].is_custom);
    }

    #[test]
    fn selected_url_is_added_as_custom() {
        let entries = build_initial_entries(&[EndpointCandidate::new("https://a")], "https://b/");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url, "https://b");
        assert!(entries[1].is_custom);
        assert_eq!(custom_urls(&entries), ["https://b"]);
    }

    #[test]
    fn merge_reports_changes() {
        let mut entries = build_initial_entries(&[EndpointCandidate::new("https://a")], "");
        assert!(!merge_candidates(&mut entries, &[EndpointCandidate::new("https://a/")]));
        assert!(merge_candidates(&mut entries, &[EndpointCandidate::custom("https://c")]));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn custom_url_validation() {
        let entries = build_initial_entries(&[EndpointCandidate::new("https://a.example")], "");
        assert_eq!(
            validate_custom_url(&entries, " https://b.example/v1/ ").expect("valid"),
            "https://b.example/v1"
        );
        assert!(validate_custom_url(&entries, "").is_err());
        assert!(validate_custom_url(&entries, "not a url").is_err());
        let err = validate_custom_url(&entries, "ftp://a.example").unwrap_err();
        assert!(err.to_string().contains("http"), "{err}");
        let err = validate_custom_url(&entries, "https://a.example/").unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
    }

    #[test]
    fn results_apply_by_normalized_url_and_sort() {
        let mut entries = build_initial_entries(
            &[
                EndpointCandidate::new("https://slow"),
                EndpointCandidate::new("https://fast"),
                EndpointCandidate::new("https://missing"),
                EndpointCandidate::new("https://down"),
            ],
            "",
        );
        let results = vec![
            latency("https://slow/", Some(300)),
            latency("https://fast", Some(50)),
            EndpointLatency {
                url: "https://down".to_string(),
                error: Some("connection failed".to_string()),
                ..EndpointLatency::default()
            },
        ];
        apply_latency_results(&mut entries, &results);
        sort_entries(&mut entries);

        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, ["https://fast", "https://slow", "https://down", "https://missing"]);
        assert_eq!(entries[3].error.as_deref(), Some(NO_RESULT_ERROR));
        assert_eq!(entries[0].status, Some(200));

        reset_results(&mut entries);
        assert!(entries.iter().all(|e| e.latency_ms.is_none() && e.error.is_none()));
    }

    #[test]
    fn fastest_and_auto_select() {
        let results = vec![
            latency("https://a", Some(90)),
            latency("https://b", None),
            latency("https://c", Some(40)),
        ];
        assert_eq!(fastest(&results).map(|r| r.url.as_str()), Some("https://c"));
        assert_eq!(auto_select(&results, "https://a").as_deref(), Some("https://c"));
        assert_eq!(auto_select(&results, "https://c/"), None);
        assert_eq!(fastest(&[latency("https://x", None)]), None);
    }

    #[test]
    fn removing_selected_falls_back_to_first() {
        let mut entries = build_initial_entries(
            &[EndpointCandidate::new("https://a"), EndpointCandidate::new("https://b")],
            "",
        );
        assert_eq!(remove_entry(&mut entries, "https://b", "https://a"), None);
        assert_eq!(remove_entry(&mut entries, "https://a/", "https://a"), Some(String::new()));
        assert!(entries.is_empty());
    }
}
