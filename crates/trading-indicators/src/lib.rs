//! Technical indicators for the SPX backtester and the stock screener.
//!
//! - Moving averages (SMA, EMA)
//! - Momentum (RSI, MACD, Stochastic, ROC)
//! - Volatility (ATR, Bollinger Bands, standard deviation)
//! - Volume (OBV, VWAP, MFI)
//! - Trend (ADX, CCI)
//! - Levels (rolling support/resistance, pivot points)
//!
//! [`IndicatorParams`] describes which indicators to compute and
//! [`IndicatorFrame`] holds the results as columns aligned to the bars.

pub mod frame;
pub mod levels;
pub mod momentum;
pub mod moving_average;
pub mod params;
pub mod trend;
pub mod volatility;
pub mod volume;

pub use frame::{keys, IndicatorFrame};
pub use levels::{rolling_max, rolling_min, PivotLevels};
pub use momentum::{Macd, MacdOutput, Roc, Rsi, Stochastic, StochasticOutput};
pub use moving_average::{Ema, Sma};
pub use params::{
    AtrParams, BollingerParams, EmaParams, IndicatorKind, IndicatorParams, MacdParams, RsiParams,
};
pub use trend::{Adx, AdxOutput, Cci};
pub use volatility::{Atr, BollingerBands, BollingerOutput, StdDev};
pub use volume::{mfi, obv, vwap};
