//! Configuration structures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_backtest::{BacktestConfig, OptimizerConfig, PerformanceTargets};
use trading_core::error::TradingError;
use trading_core::types::{Timeframe, TradingSession};
use trading_indicators::IndicatorParams;
use trading_monitor::LogSettings;
use trading_risk::{ExitRules, PositionSizingMethod, RiskConfig};
use trading_screener::{default_universe, ScreenerConfig};
use trading_sentiment::{default_sources, NewsSource, WatcherConfig, CHAT_ID_ENV, TOKEN_ENV};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub trading: TradingSettings,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub exit_rules: ExitRules,
    #[serde(default)]
    pub session: TradingSession,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub targets: PerformanceTargets,
    #[serde(default)]
    pub screener: ScreenerSettings,
    #[serde(default)]
    pub sentiment: SentimentSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

/// Instrument, period, costs and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub symbol: String,
    pub timeframes: Vec<Timeframe>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub commission: Decimal,
    pub slippage: Decimal,
    /// Download cache
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            symbol: "^GSPC".to_string(),
            timeframes: vec![Timeframe::Minute5, Timeframe::Minute10],
            start_date: NaiveDate::from_ymd_opt(2023, 7, 30).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 30).unwrap_or_default(),
            initial_capital: dec!(100000),
            commission: dec!(0.001),
            slippage: dec!(0.0005),
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingKind {
    FixedRisk,
    PercentEquity,
    Fixed,
}

/// Risk management settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub sizing: SizingKind,
    /// Fraction of equity at risk (`fixed_risk`) or committed
    /// (`percent_equity`) per trade
    pub risk_per_trade: Decimal,
    /// Share count for `fixed` sizing
    pub fixed_shares: Decimal,
    pub max_drawdown: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            sizing: SizingKind::FixedRisk,
            risk_per_trade: dec!(0.02),
            fixed_shares: dec!(100),
            max_drawdown: 0.20,
        }
    }
}

impl RiskSettings {
    pub fn sizing_method(&self) -> PositionSizingMethod {
        match self.sizing {
            SizingKind::FixedRisk => PositionSizingMethod::FixedRisk {
                risk_per_trade: self.risk_per_trade,
            },
            SizingKind::PercentEquity => PositionSizingMethod::PercentEquity {
                fraction: self.risk_per_trade,
            },
            SizingKind::Fixed => PositionSizingMethod::Fixed {
                shares: self.fixed_shares,
            },
        }
    }
}

/// Optimization and validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub train_test_split: f64,
    pub walk_forward_windows: usize,
    /// Training bars per walk-forward window
    pub window_size: usize,
    /// Test bars per walk-forward window
    pub test_size: usize,
    pub optimization_metric: String,
    pub min_trades: usize,
    pub max_drawdown_penalty: f64,
    pub min_confirmations: usize,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            train_test_split: 0.8,
            walk_forward_windows: 12,
            window_size: 504,
            test_size: 126,
            optimization_metric: "sharpe_ratio".to_string(),
            min_trades: 100,
            max_drawdown_penalty: 0.30,
            min_confirmations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub ticker: String,
    pub name: String,
}

/// Stock screener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerSettings {
    /// Tickers to scan; the built-in universe when empty
    pub universe: Vec<UniverseEntry>,
    /// CSV of per-ticker fundamentals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundamentals_file: Option<PathBuf>,
    pub lookback_days: i64,
    pub high_conviction: f64,
    pub concurrency: usize,
    pub output_dir: PathBuf,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        let defaults = ScreenerConfig::default();
        Self {
            universe: Vec::new(),
            fundamentals_file: Some(PathBuf::from("data/fundamentals.csv")),
            lookback_days: defaults.lookback_days,
            high_conviction: defaults.high_conviction,
            concurrency: defaults.concurrency,
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl ScreenerSettings {
    /// Configured universe as (ticker, name) pairs.
    pub fn universe(&self) -> Vec<(String, String)> {
        if self.universe.is_empty() {
            return default_universe();
        }
        self.universe
            .iter()
            .map(|e| (e.ticker.clone(), e.name.clone()))
            .collect()
    }

    pub fn screener_config(&self) -> ScreenerConfig {
        ScreenerConfig {
            lookback_days: self.lookback_days,
            high_conviction: self.high_conviction,
            concurrency: self.concurrency,
        }
    }
}

/// Names of the environment variables holding Telegram credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub token_env: String,
    pub chat_id_env: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            token_env: TOKEN_ENV.to_string(),
            chat_id_env: CHAT_ID_ENV.to_string(),
        }
    }
}

impl TelegramSettings {
    /// Token and chat id, when both variables are set.
    pub fn credentials(&self) -> Option<(String, String)> {
        let token = std::env::var(&self.token_env).ok()?;
        let chat_id = std::env::var(&self.chat_id_env).ok()?;
        Some((token, chat_id))
    }
}

/// News sentiment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentSettings {
    pub sources: Vec<NewsSource>,
    /// Pause between feed requests
    pub request_delay_ms: u64,
    pub alert_interval_secs: u64,
    pub lookback_hours: i64,
    pub telegram: TelegramSettings,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        let watcher = WatcherConfig::default();
        Self {
            sources: default_sources(),
            request_delay_ms: 1000,
            alert_interval_secs: watcher.interval_secs,
            lookback_hours: watcher.lookback_hours,
            telegram: TelegramSettings::default(),
        }
    }
}

impl SentimentSettings {
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            interval_secs: self.alert_interval_secs,
            lookback_hours: self.lookback_hours,
        }
    }
}

fn invalid(msg: impl Into<String>) -> TradingError {
    TradingError::Config(msg.into())
}

impl AppConfig {
    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            position_sizing: self.risk.sizing_method(),
            max_drawdown: self.risk.max_drawdown,
            exit_rules: self.exit_rules.clone(),
            session: self.session.clone(),
        }
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.trading.initial_capital,
            commission: self.trading.commission,
            slippage: self.trading.slippage,
            min_confirmations: self.backtest.min_confirmations,
            risk: self.risk_config(),
            targets: self.targets.clone(),
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            metric: self.backtest.optimization_metric.clone(),
            min_trades: self.backtest.min_trades,
            drawdown_penalty_threshold: self.backtest.max_drawdown_penalty,
            max_windows: self.backtest.walk_forward_windows,
        }
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), TradingError> {
        let t = &self.trading;
        if t.symbol.trim().is_empty() {
            return Err(invalid("trading.symbol must not be empty"));
        }
        if t.timeframes.is_empty() {
            return Err(invalid("trading.timeframes must list at least one timeframe"));
        }
        if t.start_date >= t.end_date {
            return Err(invalid(format!(
                "trading.start_date {} must be before end_date {}",
                t.start_date, t.end_date
            )));
        }
        if t.initial_capital <= Decimal::ZERO {
            return Err(invalid("trading.initial_capital must be positive"));
        }
        if t.commission < Decimal::ZERO || t.commission >= Decimal::ONE {
            return Err(invalid("trading.commission must be in [0, 1)"));
        }
        if t.slippage < Decimal::ZERO || t.slippage >= Decimal::ONE {
            return Err(invalid("trading.slippage must be in [0, 1)"));
        }

        let r = &self.risk;
        match r.sizing {
            SizingKind::FixedRisk | SizingKind::PercentEquity => {
                if r.risk_per_trade <= Decimal::ZERO || r.risk_per_trade > Decimal::ONE {
                    return Err(invalid("risk.risk_per_trade must be in (0, 1]"));
                }
            }
            SizingKind::Fixed => {
                if r.fixed_shares <= Decimal::ZERO {
                    return Err(invalid("risk.fixed_shares must be positive"));
                }
            }
        }
        if !(r.max_drawdown > 0.0 && r.max_drawdown <= 1.0) {
            return Err(invalid(format!(
                "risk.max_drawdown must be in (0, 1], got {}",
                r.max_drawdown
            )));
        }

        self.indicators.validate()?;
        self.exit_rules
            .validate()
            .map_err(|e| invalid(format!("exit_rules: {}", e)))?;
        self.session
            .validate()
            .map_err(|e| invalid(format!("session: {}", e)))?;

        let b = &self.backtest;
        if !(b.train_test_split > 0.0 && b.train_test_split < 1.0) {
            return Err(invalid(format!(
                "backtest.train_test_split must be in (0, 1), got {}",
                b.train_test_split
            )));
        }
        if b.window_size == 0 || b.test_size == 0 {
            return Err(invalid("backtest.window_size and test_size must be positive"));
        }
        if b.walk_forward_windows == 0 {
            return Err(invalid("backtest.walk_forward_windows must be positive"));
        }
        if b.min_confirmations == 0 {
            return Err(invalid("backtest.min_confirmations must be at least 1"));
        }
        if trading_backtest::PerformanceMetrics::empty(Decimal::ZERO)
            .get(&b.optimization_metric)
            .is_none()
        {
            return Err(invalid(format!(
                "backtest.optimization_metric '{}' is not a known metric",
                b.optimization_metric
            )));
        }

        let s = &self.screener;
        if s.lookback_days <= 0 {
            return Err(invalid("screener.lookback_days must be positive"));
        }
        if s.concurrency == 0 {
            return Err(invalid("screener.concurrency must be at least 1"));
        }
        if !(0.0..=100.0).contains(&s.high_conviction) {
            return Err(invalid("screener.high_conviction must be in [0, 100]"));
        }

        let n = &self.sentiment;
        if n.sources.is_empty() {
            return Err(invalid("sentiment.sources must list at least one feed"));
        }
        if let Some(src) = n.sources.iter().find(|s| !(s.weight > 0.0 && s.weight <= 1.0)) {
            return Err(invalid(format!(
                "sentiment source '{}' weight must be in (0, 1], got {}",
                src.id, src.weight
            )));
        }
        if n.alert_interval_secs == 0 {
            return Err(invalid("sentiment.alert_interval_secs must be positive"));
        }

        trading_monitor::parse_filter(&self.logging.level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.trading.symbol, "^GSPC");
        assert_eq!(
            config.trading.timeframes,
            vec![Timeframe::Minute5, Timeframe::Minute10]
        );
        assert_eq!(config.backtest.window_size, 504);
        assert_eq!(config.sentiment.alert_interval_secs, 1800);
    }

    #[test]
    fn test_sizing_method() {
        let mut risk = RiskSettings::default();
        assert_eq!(
            risk.sizing_method(),
            PositionSizingMethod::FixedRisk {
                risk_per_trade: dec!(0.02)
            }
        );
        risk.sizing = SizingKind::Fixed;
        risk.fixed_shares = dec!(10);
        assert_eq!(
            risk.sizing_method(),
            PositionSizingMethod::Fixed { shares: dec!(10) }
        );
    }

    #[test]
    fn test_conversions() {
        let mut config = AppConfig::default();
        config.trading.commission = dec!(0.002);
        config.backtest.min_trades = 30;
        config.risk.max_drawdown = 0.15;

        let bt = config.backtest_config();
        assert_eq!(bt.commission, dec!(0.002));
        assert_eq!(bt.min_confirmations, 2);
        assert!((bt.risk.max_drawdown - 0.15).abs() < 1e-12);
        assert_eq!(bt.risk.session, config.session);

        let opt = config.optimizer_config();
        assert_eq!(opt.min_trades, 30);
        assert_eq!(opt.max_windows, 12);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut config = AppConfig::default();
        config.trading.end_date = config.trading.start_date;
        assert!(matches!(config.validate(), Err(TradingError::Config(_))));

        let mut config = AppConfig::default();
        config.backtest.train_test_split = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backtest.optimization_metric = "luck".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.exit_rules.stop_loss_pct = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sentiment.sources[0].weight = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_universe_fallback() {
        let mut screener = ScreenerSettings::default();
        assert_eq!(screener.universe().len(), default_universe().len());

        screener.universe = vec![UniverseEntry {
            ticker: "NVDA".to_string(),
            name: "Nvidia Corp".to_string(),
        }];
        assert_eq!(
            screener.universe(),
            vec![("NVDA".to_string(), "Nvidia Corp".to_string())]
        );
    }
}
