//! Logging setup
//!
//! One `tracing` subscriber with up to two sinks: the console (compact text
//! or JSON lines) and an optional plain-text file written through a
//! non-blocking appender.
//!
//! # Environment Variables
//!
//! - `STARLIGHT_LOG`: filter directives (e.g. "info,starlight_earth::render=debug"),
//!   falling back to `RUST_LOG` and then to `LogConfig::level`
//! - `STARLIGHT_LOG_FORMAT`: `compact`, `json` or `off` for the console sink
//! - `STARLIGHT_LOG_FILE`: path of a log file to write in addition

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "STARLIGHT_LOG";
pub const LOG_FORMAT_ENV: &str = "STARLIGHT_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "STARLIGHT_LOG_FILE";

/// Keeps the file writer flushing; drop it only at exit
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

/// Console output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFormat {
    Compact,
    Json,
}

impl ConsoleFormat {
    /// Parse a `STARLIGHT_LOG_FORMAT` value; `Ok(None)` turns the console off
    fn parse(value: &str) -> Result<Option<Self>, LogError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Some(Self::Compact)),
            "json" => Ok(Some(Self::Json)),
            "off" | "none" => Ok(None),
            _ => Err(LogError::UnknownFormat(value.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown log format '{0}' (expected compact, json or off)")]
    UnknownFormat(String),
    #[error("failed to create log file '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global subscriber is already installed: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when neither `STARLIGHT_LOG` nor `RUST_LOG` is set
    pub level: String,
    /// `None` disables console output
    pub console: Option<ConsoleFormat>,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: Some(ConsoleFormat::Compact),
            file: None,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by `STARLIGHT_LOG_FORMAT` and `STARLIGHT_LOG_FILE`
    pub fn from_env() -> Result<Self, LogError> {
        Self::from_vars(
            std::env::var(LOG_FORMAT_ENV).ok().as_deref(),
            std::env::var_os(LOG_FILE_ENV).map(PathBuf::from),
        )
    }

    fn from_vars(format: Option<&str>, file: Option<PathBuf>) -> Result<Self, LogError> {
        let mut config = Self::default();
        if let Some(format) = format {
            config.console = ConsoleFormat::parse(format)?;
        }
        config.file = file.filter(|path| !path.as_os_str().is_empty());
        Ok(config)
    }
}

/// Install the global subscriber
///
/// The returned guard must outlive all logging when a file sink is enabled.
pub fn init_logging(config: &LogConfig) -> Result<Option<LogGuard>, LogError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let compact = (config.console == Some(ConsoleFormat::Compact))
        .then(|| fmt::layer().with_target(true).compact());
    let json = (config.console == Some(ConsoleFormat::Json)).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    let (file_layer, guard): (_, Option<WorkerGuard>) = match &config.file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| LogError::File {
                path: path.clone(),
                source,
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        console = ?config.console,
        file = ?config.file,
        "Logging initialized"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_compact_console_only() {
        let config = LogConfig::default();
        assert_eq!(config.console, Some(ConsoleFormat::Compact));
        assert_eq!(config.file, None);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_format_values() {
        assert_eq!(ConsoleFormat::parse("JSON").unwrap(), Some(ConsoleFormat::Json));
        assert_eq!(ConsoleFormat::parse(" compact ").unwrap(), Some(ConsoleFormat::Compact));
        assert_eq!(ConsoleFormat::parse("off").unwrap(), None);
        assert!(matches!(
            ConsoleFormat::parse("pretty"),
            Err(LogError::UnknownFormat(v)) if v == "pretty"
        ));
    }

    #[test]
    fn test_config_from_vars() {
        let config =
            LogConfig::from_vars(Some("json"), Some(PathBuf::from("globe.log"))).unwrap();
        assert_eq!(config.console, Some(ConsoleFormat::Json));
        assert_eq!(config.file, Some(PathBuf::from("globe.log")));

        let config = LogConfig::from_vars(None, Some(PathBuf::new())).unwrap();
        assert_eq!(config, LogConfig::default());
    }
}
