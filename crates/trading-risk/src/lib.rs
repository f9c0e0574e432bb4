//! Risk management for the backtester.
//!
//! Provides position sizing, stop-loss/take-profit handling with trailing
//! stops and end-of-day exits, and a drawdown guard.

mod position_sizer;
mod risk_manager;
mod stop_loss;

pub use position_sizer::{PositionSizer, PositionSizingMethod};
pub use risk_manager::{RiskConfig, RiskDecision, RiskManager};
pub use stop_loss::{exit_levels, ExitRules, StopLossManager};
