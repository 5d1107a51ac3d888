//! File logging for the CLI.
//!
//! Stdout carries JSON results, so logs go to `<data root>/logs/zidelok.log`
//! (or stderr when the log directory cannot be created).

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "zidelok.log";

fn debug_enabled() -> bool {
    env::var("ZIDELOK_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn filter() -> EnvFilter {
    if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initializes logging. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(logs_dir) {
        let _ = tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
        tracing::warn!(
            path = %logs_dir.display(),
            error = %err,
            "Log directory unavailable; logging to stderr"
        );
        return None;
    }

    let appender = tracing_appender::rolling::never(logs_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init();

    Some(guard)
}
