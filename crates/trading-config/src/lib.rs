//! Configuration management.
//!
//! Settings come from an optional TOML file layered with `MARKET_LAB_*`
//! environment variables, e.g. `MARKET_LAB_TRADING__SYMBOL=^NDX`.

mod settings;

pub use settings::{
    AppConfig, BacktestSettings, RiskSettings, ScreenerSettings, SentimentSettings, SizingKind,
    TelegramSettings, TradingSettings, UniverseEntry,
};

use config::{Config, Environment, File};
use std::path::Path;
use trading_core::error::TradingError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "MARKET_LAB";

/// Load configuration from file and environment.
///
/// An explicit `path` must exist; without one, `config/default.toml` is
/// used when present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, TradingError> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
    };
    let config = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| TradingError::Config(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| TradingError::Config(e.to_string()))
}

/// Effective configuration as TOML.
pub fn to_toml(config: &AppConfig) -> Result<String, TradingError> {
    toml::to_string_pretty(config).map_err(|e| TradingError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::sync::Mutex;
    use trading_core::types::Timeframe;

    // tests that read or set MARKET_LAB_* variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[trading]
symbol = "^NDX"
timeframes = ["1d"]
initial_capital = 50000

[backtest]
min_trades = 20

[session]
avoid_first_minutes = 15
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.trading.symbol, "^NDX");
        assert_eq!(config.trading.timeframes, vec![Timeframe::Daily]);
        assert_eq!(config.trading.initial_capital, dec!(50000));
        assert_eq!(config.trading.commission, dec!(0.001));
        assert_eq!(config.backtest.min_trades, 20);
        assert_eq!(config.backtest.window_size, 504);
        assert_eq!(config.session.avoid_first_minutes, 15);
        assert_eq!(config.session.avoid_last_minutes, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_shipped_defaults_match_builtin() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/market_lab.toml")));
        assert!(matches!(result, Err(TradingError::Config(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let file = write_config("[screener]\nconcurrency = 2\n");
        std::env::set_var("MARKET_LAB_SCREENER__CONCURRENCY", "8");
        let config = load_config(Some(file.path()));
        std::env::remove_var("MARKET_LAB_SCREENER__CONCURRENCY");
        assert_eq!(config.unwrap().screener.concurrency, 8);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let text = to_toml(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
