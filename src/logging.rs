//! Structured JSONL logging plus human-readable stderr output.
//!
//! - **JSONL to file** (`~/.chooser/logs/chooser.jsonl`) - structured for tooling
//! - **Compact to stderr** - for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use chooser_core::logging;
//!
//! // MUST keep guard alive for duration of program
//! let _guard = logging::init();
//! tracing::info!(event_type = "chooser", action = "activated", "Chooser shown");
//! ```
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding application's job (or the smoke binary's).

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Once;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "chooser.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// If the log file can't be opened only the stderr layer is installed.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    // Default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Non-blocking writer so logging never stalls the event loop
    let (file_writer, file_guard) =
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                (Some(writer), Some(guard))
            }
            Err(e) => {
                eprintln!("[LOGGING] Failed to open log file: {}", e);
                (None, None)
            }
        };

    build_subscriber(env_filter, file_writer).init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Chooser logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Registry with the filter, the optional JSONL file layer and the stderr layer.
fn build_subscriber(
    env_filter: EnvFilter,
    file_writer: Option<NonBlocking>,
) -> impl Subscriber + Send + Sync + 'static {
    let json_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
    });

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
}

/// Install a test-writer subscriber. Safe to call from every test.
pub fn init_for_tests() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Get the log directory path (~/.chooser/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".chooser").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("chooser-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Log a performance metric with structured fields
pub fn log_perf(operation: &str, duration_us: u128, threshold_us: u128) {
    if duration_us > threshold_us {
        tracing::warn!(
            event_type = "performance",
            operation = operation,
            duration_us = duration_us as u64,
            threshold_us = threshold_us as u64,
            is_slow = true,
            "Slow operation: {} took {}us (threshold: {}us)",
            operation,
            duration_us,
            threshold_us
        );
    } else {
        tracing::trace!(
            event_type = "performance",
            operation = operation,
            duration_us = duration_us as u64,
            is_slow = false,
            "Operation {} completed in {}us",
            operation,
            duration_us
        );
    }
}

/// Log a keyboard dispatch decision with structured fields
pub fn log_key_event(chord: &str, outcome: &str) {
    tracing::debug!(
        event_type = "key_event",
        chord = chord,
        outcome = outcome,
        "Key {} {}",
        chord,
        outcome
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_ends_with_file_name() {
        assert!(log_path().ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_init_for_tests_is_idempotent() {
        init_for_tests();
        init_for_tests();
        log_perf("filter", 10, 5);
        log_key_event("cmd+1", "handled");
    }

    #[test]
    fn test_subscriber_without_file_layer() {
        let subscriber = build_subscriber(EnvFilter::new("debug"), None);
        tracing::subscriber::with_default(subscriber, || {
            log_key_event("cmd+1", "handled");
        });
    }

    #[test]
    fn test_subscriber_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let file = fs::File::create(&path).unwrap();
        let (writer, guard) = tracing_appender::non_blocking(file);

        let subscriber = build_subscriber(EnvFilter::new("info"), Some(writer));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(event_type = "chooser", action = "activated", "Chooser activated");
        });
        drop(guard);

        let contents = fs::read_to_string(&path).unwrap();
        let line: serde_json::Value =
            serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["action"], "activated");
        assert_eq!(line["level"], "INFO");
    }
}
