//! Closed trade records.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfDay,
    EndOfBacktest,
}

impl ExitReason {
    pub fn all() -> &'static [ExitReason] {
        &[
            ExitReason::StopLoss,
            ExitReason::TakeProfit,
            ExitReason::EndOfDay,
            ExitReason::EndOfBacktest,
        ]
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::EndOfDay => "End of Day",
            ExitReason::EndOfBacktest => "End of Backtest",
        };
        write!(f, "{}", s)
    }
}

/// A completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    /// Stop level at entry
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Entry plus exit commission
    pub commission: Decimal,
    /// Net profit after commission
    pub pnl: Decimal,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// Net profit relative to the entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional.is_zero() {
            return 0.0;
        }
        (self.pnl / notional).to_f64().unwrap_or_default()
    }

    /// Amount at risk between entry and the initial stop.
    pub fn risk_amount(&self) -> Decimal {
        (self.entry_price - self.stop_loss).abs() * self.size
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time) / 60_000
    }

    pub fn pnl_f64(&self) -> f64 {
        self.pnl.to_f64().unwrap_or_default()
    }
}
