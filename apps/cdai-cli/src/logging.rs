//! Logging initialization.
//!
//! Every command writes JSON logs to `<command>.<date>.log` in the studio's
//! logs directory (`.cdai/logs` under the working directory), rotated daily
//! with the three newest files kept.
//! Human-readable stderr output is added for commands that do not own the
//! terminal.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Number of daily log files kept per command.
const MAX_LOG_FILES: usize = 3;

/// Initialize the global tracing subscriber.
///
/// Returns a [`WorkerGuard`] that must be held for the lifetime of the
/// program to ensure all buffered logs are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log
/// file cannot be opened.
pub fn init_tracing(log_dir: &Path, command: &str, stderr: bool) -> Result<WorkerGuard> {
    let (subscriber, guard) = build_tracing(log_dir, command, stderr)?;
    subscriber.init();
    Ok(guard)
}

/// Build the tracing subscriber layers without registering globally.
fn build_tracing(
    log_dir: &Path,
    command: &str,
    stderr: bool,
) -> Result<(impl tracing::Subscriber + Send + Sync, WorkerGuard)> {
    let appender = open_log_appender(log_dir, command)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    let subscriber = tracing_subscriber::registry().with(stderr_layer).with(
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(file_filter()),
    );

    Ok((subscriber, guard))
}

/// `RUST_LOG` when set, otherwise `info` so the file always has a trail.
fn file_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Create the log directory and a daily rolling appender for `command`.
fn open_log_appender(log_dir: &Path, command: &str) -> Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(command)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .with_context(|| format!("failed to open log file in: {}", log_dir.display()))
}
