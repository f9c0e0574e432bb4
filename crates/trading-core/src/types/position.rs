//! Trade direction and the open position tracked during a simulation.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => -Decimal::ONE,
        }
    }

    pub fn sign_f64(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A position held by the backtester between entry and exit.
///
/// Stop and target levels are kept as `f64` because they are compared
/// against bar highs and lows; money amounts are `Decimal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub direction: Direction,
    /// Entry bar timestamp (ms)
    pub entry_time: i64,
    /// Fill price including slippage
    pub entry_price: Decimal,
    /// Whole shares
    pub size: Decimal,
    /// Current (possibly trailed) stop level
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Stop level at entry, used for risk accounting
    pub initial_stop: f64,
    /// Commission paid on entry
    pub entry_commission: Decimal,
}

impl OpenPosition {
    pub fn entry_price_f64(&self) -> f64 {
        self.entry_price.to_f64().unwrap_or_default()
    }

    /// Distance between entry and the initial stop.
    pub fn initial_risk(&self) -> f64 {
        (self.entry_price_f64() - self.initial_stop).abs()
    }

    /// Mark-to-market profit before exit costs.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.size * self.direction.sign()
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(direction: Direction) -> OpenPosition {
        OpenPosition {
            direction,
            entry_time: 0,
            entry_price: dec!(100),
            size: dec!(10),
            stop_loss: 98.0,
            take_profit: 104.0,
            initial_stop: 98.0,
            entry_commission: Decimal::ZERO,
        }
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.sign(), dec!(-1));
        assert_eq!(Direction::Long.to_string(), "LONG");
    }

    #[test]
    fn test_unrealized_pnl_by_direction() {
        let long = position(Direction::Long);
        assert_eq!(long.unrealized_pnl(dec!(103)), dec!(30));

        let short = position(Direction::Short);
        assert_eq!(short.unrealized_pnl(dec!(103)), dec!(-30));
    }

    #[test]
    fn test_initial_risk() {
        let long = position(Direction::Long);
        assert!((long.initial_risk() - 2.0).abs() < 1e-10);
    }
}
