//! File-only tracing setup. The terminal belongs to the UI, so nothing is
//! written to stderr while the app runs.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keep alive for the whole run; dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

pub fn init(log_path: &Path) -> Result<LoggingGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Unable to open log file {}", log_path.display()))?;

    let (writer, file_guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Unable to install tracing subscriber")?;

    tracing::info!(log_path = %log_path.display(), "logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
