//! Signal generation for the SPX backtester.
//!
//! Indicator rules (RSI, MACD, Bollinger Bands, EMA crossovers) vote on each
//! bar and [`ConfluenceStrategy`] turns the votes into entry signals with
//! stop and take-profit distances.

mod confluence;
pub mod rules;

pub use confluence::{ConfluenceConfig, ConfluenceStrategy};
pub use rules::RuleSignals;

use trading_core::error::StrategyError;
use trading_core::types::{BarSeries, SignalFrame};
use trading_indicators::{IndicatorFrame, IndicatorParams};

/// Turns a bar series and its indicator columns into per-bar signals.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Signal columns aligned with `series`. `frame` must have been computed
    /// from the same series.
    fn generate(
        &self,
        series: &BarSeries,
        frame: &IndicatorFrame,
        params: &IndicatorParams,
    ) -> Result<SignalFrame, StrategyError>;
}
