//! Core data types.

mod fundamentals;
mod ohlcv;
mod position;
mod session;
mod signal;
mod timeframe;
mod trade;

pub use fundamentals::Fundamentals;
pub use ohlcv::{Bar, BarSeries};
pub use position::{Direction, OpenPosition};
pub use session::{hhmm, TradingSession};
pub use signal::{Signal, SignalFrame};
pub use timeframe::Timeframe;
pub use trade::{ExitReason, Trade};
