//! Application logging
//!
//! Logs go to stderr by default. With file logging on they go to
//! ~/.config/fontshelf/logs/fontshelf-YYYY-MM-DD.log instead, so command
//! output stays clean.

use crate::core::config_file::ConfigFile;
use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is not set
pub const DEFAULT_LEVEL: &str = "info";

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::config_dir().join("logs")
}

/// File name of today's log
pub fn log_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d");
    format!("fontshelf-{}.log", timestamp)
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    logs_dir().join(log_file_name())
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    let logs_dir = logs_dir();
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create logs directory {:?}", logs_dir))?;
    Ok(())
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; hold it until
/// the process is done logging.
pub fn init(log_to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL))
        .context("Invalid log filter")?;

    if log_to_file {
        initialize_logs_directory()?;
        let appender = tracing_appender::rolling::never(logs_dir(), log_file_name());
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .with(filter)
            .try_init()
            .context("Logging was already initialized")?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .try_init()
            .context("Logging was already initialized")?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_dated() {
        let name = log_file_name();
        assert!(name.starts_with("fontshelf-"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "fontshelf-2024-01-01.log".len());
        assert!(current_log_file().ends_with(&name));
    }
}
