//! CLI command implementations.

pub mod backtest;
pub mod full;
pub mod indicators;
pub mod optimize;
pub mod screen;
pub mod sentiment;
pub mod validate;
pub mod walk_forward;
