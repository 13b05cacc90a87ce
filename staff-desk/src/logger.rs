//! Logging Infrastructure
//!
//! Console output on stderr plus a daily-rolling `application.log` file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log file prefix inside the log directory
pub const LOG_FILE_NAME: &str = "application.log";

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. When `log_dir` is set
/// and can be created, records are also appended to `application.log`; the
/// returned guard must be held for the lifetime of the process so buffered
/// lines get flushed.
pub fn init_logger(log_dir: Option<&Path>, default_filter: &str) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = None;
    let file_layer = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let (writer, file_guard) =
                tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_NAME));
            guard = Some(file_guard);
            Some(
                fmt::layer()
                    .with_timer(LocalTimer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_writer(writer),
            )
        }
        Err(e) => {
            eprintln!("Failed to create log directory {}: {e}", dir.display());
            None
        }
    });

    let console_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding applications)
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some(dir) = log_dir {
        tracing::debug!(path = %dir.display(), "Logging initialized");
    }

    guard
}
