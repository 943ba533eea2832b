//! Tracing setup: human-readable stderr output plus optional JSON file logs.

use crate::config::LoggingSettings;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber.
///
/// Returns the appender guard when JSON file logging is enabled; keep it alive
/// for the lifetime of the process or buffered lines are lost. Calling this
/// twice is harmless: the second installation is skipped.
pub fn init(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(&settings.level));

    let (json_layer, guard) = match &settings.json_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("molgen: cannot create log dir {}: {e}", dir.display());
                (None, None)
            } else {
                let file_appender = tracing_appender::rolling::daily(dir, "molgen.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(EnvFilter::new("debug"));
                (Some(layer), Some(guard))
            }
        }
        None => (None, None),
    };

    match tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
    {
        Ok(()) => debug!(level = %settings.level, json = guard.is_some(), "tracing initialized"),
        Err(e) => debug!(error = %e, "tracing already initialized, keeping existing subscriber"),
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_with_json_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let settings = LoggingSettings {
            level: "debug".to_string(),
            json_dir: Some(dir.path().join("logs")),
        };
        let guard = init(&settings);
        assert!(guard.is_some());
        assert!(dir.path().join("logs").is_dir());

        tracing::info!("logging initialized");
        let _ = init(&LoggingSettings::default());
    }

    #[test]
    fn test_second_init_keeps_first_subscriber() {
        let _ = init(&LoggingSettings::default());
        // Already installed: no panic, and no file guard without a JSON dir.
        assert!(init(&LoggingSettings::default()).is_none());
        tracing::debug!("still logging");
    }
}
