//! Stop-loss, take-profit and end-of-day exit management.

use serde::{Deserialize, Serialize};
use trading_core::types::{Bar, Direction, ExitReason, OpenPosition, Timeframe, TradingSession};

/// Exit rules applied to every position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitRules {
    /// Stop distance as a fraction of the close when no ATR stop is set
    pub stop_loss_pct: f64,
    /// Take-profit distance as a multiple of the stop distance
    pub take_profit_ratio: f64,
    pub trailing_stop: bool,
    pub end_of_day_exit: bool,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.02,
            take_profit_ratio: 2.0,
            trailing_stop: true,
            end_of_day_exit: true,
        }
    }
}

impl ExitRules {
    /// Stop and take-profit distances for a bar closing at `close`.
    ///
    /// `atr_stop` is ATR x multiplier when an ATR stop applies on that bar.
    pub fn distances(&self, close: f64, atr_stop: Option<f64>) -> (f64, f64) {
        let stop = match atr_stop {
            Some(d) if d.is_finite() => d,
            _ => close * self.stop_loss_pct,
        };
        (stop, stop * self.take_profit_ratio)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(format!(
                "stop_loss_pct must be in (0, 1), got {}",
                self.stop_loss_pct
            ));
        }
        if self.take_profit_ratio <= 0.0 {
            return Err(format!(
                "take_profit_ratio must be positive, got {}",
                self.take_profit_ratio
            ));
        }
        Ok(())
    }
}

/// Stop and target prices for a new position.
pub fn exit_levels(
    direction: Direction,
    entry: f64,
    stop_distance: f64,
    take_profit_distance: f64,
) -> (f64, f64) {
    match direction {
        Direction::Long => (entry - stop_distance, entry + take_profit_distance),
        Direction::Short => (entry + stop_distance, entry - take_profit_distance),
    }
}

/// Stop-loss manager.
#[derive(Debug, Clone, Default)]
pub struct StopLossManager {
    rules: ExitRules,
    session: TradingSession,
}

impl StopLossManager {
    pub fn new(rules: ExitRules, session: TradingSession) -> Self {
        Self { rules, session }
    }

    pub fn rules(&self) -> &ExitRules {
        &self.rules
    }

    pub fn session(&self) -> &TradingSession {
        &self.session
    }

    /// Trail the stop behind `close` by the position's initial risk.
    ///
    /// The stop only ever tightens. Returns whether it moved.
    pub fn update_trailing_stop(&self, position: &mut OpenPosition, close: f64) -> bool {
        if !self.rules.trailing_stop {
            return false;
        }
        let distance = position.initial_risk();
        if distance <= 0.0 || !close.is_finite() {
            return false;
        }
        let moved = match position.direction {
            Direction::Long => {
                let new_stop = close - distance;
                if new_stop > position.stop_loss {
                    position.stop_loss = new_stop;
                    true
                } else {
                    false
                }
            }
            Direction::Short => {
                let new_stop = close + distance;
                if new_stop < position.stop_loss {
                    position.stop_loss = new_stop;
                    true
                } else {
                    false
                }
            }
        };
        if moved {
            tracing::debug!(stop = position.stop_loss, "Trailing stop updated");
        }
        moved
    }

    /// Exit reason and fill price if `bar` closes the position.
    ///
    /// Checked in order: stop loss, take profit, end of day.
    pub fn check_exit(
        &self,
        position: &OpenPosition,
        bar: &Bar,
        timeframe: Timeframe,
    ) -> Option<(ExitReason, f64)> {
        let stop_hit = match position.direction {
            Direction::Long => bar.low <= position.stop_loss,
            Direction::Short => bar.high >= position.stop_loss,
        };
        if stop_hit {
            return Some((ExitReason::StopLoss, position.stop_loss));
        }

        let target_hit = match position.direction {
            Direction::Long => bar.high >= position.take_profit,
            Direction::Short => bar.low <= position.take_profit,
        };
        if target_hit {
            return Some((ExitReason::TakeProfit, position.take_profit));
        }

        if self.rules.end_of_day_exit && self.session.is_end_of_day(bar, timeframe) {
            return Some((ExitReason::EndOfDay, bar.close));
        }

        None
    }
}
