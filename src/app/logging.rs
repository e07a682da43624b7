//! Usage: Tracing bootstrap (env filter, stderr output, optional daily rolling log file).

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_ENV_VAR: &str = "PROVIDER_SWITCH_LOG";
const DEFAULT_DIRECTIVE: &str = "info";
const LOG_FILE_PREFIX: &str = "provider-switch.log";

static INITIALIZED: OnceLock<()> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber once. With `log_dir`, records are also written
/// to a daily rolling file; keep the returned guard alive to flush it.
///
/// Later calls are no-ops returning `None`.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    if INITIALIZED.set(()).is_err() {
        return None;
    }

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer);
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber init skipped: {err}");
        return None;
    }
    // Forward `log` records from dependencies.
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("log bridge init skipped: {err}");
    }

    tracing::debug!(
        log_dir = %log_dir.map(|d| d.display().to_string()).unwrap_or_default(),
        "logging initialized"
    );
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _guard = init(Some(dir.path()));
        assert!(init(None).is_none());
        tracing::info!(target: "provider_switch", "after init");
    }
}
