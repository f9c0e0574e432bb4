//! Logging setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trading_core::TradingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// JSON lines on the console instead of the pretty formatter.
    pub json: bool,
    /// Also write daily-rolling files under `directory`.
    pub file: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: true,
            directory: PathBuf::from("logs"),
            file_prefix: "market_lab.log".to_string(),
        }
    }
}

/// Parse a filter directive such as `info` or `trading_backtest=debug,warn`.
pub fn parse_filter(level: &str) -> Result<EnvFilter, TradingError> {
    EnvFilter::try_new(level)
        .map_err(|e| TradingError::Config(format!("invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber. `RUST_LOG` overrides `settings.level`.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// stops the background file writer.
pub fn setup_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>, TradingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&settings.level)?,
    };

    let (file_layer, guard) = if settings.file {
        std::fs::create_dir_all(&settings.directory)?;
        let appender = tracing_appender::rolling::daily(&settings.directory, &settings.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let json_layer = settings.json.then(|| fmt::layer().json());
    let pretty_layer = (!settings.json).then(|| fmt::layer().pretty());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| TradingError::Internal(format!("logging already initialised: {}", e)))?;

    tracing::info!(
        level = %settings.level,
        json = settings.json,
        file = settings.file,
        directory = %settings.directory.display(),
        "Logging initialised"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert!(parse_filter("debug").is_ok());
        assert!(parse_filter("trading_backtest=debug,warn").is_ok());
        assert!(matches!(
            parse_filter("trading_backtest=loud"),
            Err(TradingError::Config(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let settings = LogSettings::default();
        assert_eq!(settings.level, "info");
        assert_eq!(settings.directory, PathBuf::from("logs"));
        assert!(settings.file);
    }

    #[test]
    fn test_setup_writes_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            directory: dir.path().join("logs"),
            ..LogSettings::default()
        };
        // A global subscriber may already be installed by another test.
        let _ = setup_logging(&settings);
        assert!(settings.directory.is_dir());
    }
}
