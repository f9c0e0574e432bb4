//! Core types and traits shared by the market-lab crates.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Trade direction, open positions and closed trade records
//! - Per-bar trading signals
//! - Fundamental snapshots used by the stock screener
//! - Core traits for indicators and data sources

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use traits::*;
pub use types::*;
