use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uiforge_core::Config;
use uiforge_core::ConfigKey;

/// Sends JSON logs to the configured log file. Stdout belongs to the
/// conversation, so nothing is logged there. Keep the guard alive until exit
/// or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
    let log_file = PathBuf::from(Config::get(ConfigKey::LogFile));
    let dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_file
        .file_name()
        .context("log-file must name a file")?
        .to_os_string();

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(Config::get(ConfigKey::LogLevel)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();

    return Ok(guard);
}
