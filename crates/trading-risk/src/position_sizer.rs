//! Position sizing algorithms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PositionSizingMethod {
    /// Risk a fraction of equity between entry and stop
    FixedRisk { risk_per_trade: Decimal },
    /// Commit a fraction of equity regardless of the stop
    PercentEquity { fraction: Decimal },
    /// Fixed number of shares
    Fixed { shares: Decimal },
}

impl Default for PositionSizingMethod {
    fn default() -> Self {
        PositionSizingMethod::FixedRisk {
            risk_per_trade: dec!(0.02),
        }
    }
}

/// Position sizer calculates the number of whole shares to trade.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    method: PositionSizingMethod,
}

impl PositionSizer {
    pub fn new(method: PositionSizingMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    /// Shares to buy or sell short at `price` with a stop at `stop_price`.
    ///
    /// Never more than the equity can pay for; zero when the stop sits on
    /// the entry price under fixed-risk sizing.
    pub fn calculate(&self, equity: Decimal, price: Decimal, stop_price: Decimal) -> Decimal {
        if price <= Decimal::ZERO || equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let size = match &self.method {
            PositionSizingMethod::FixedRisk { risk_per_trade } => {
                let risk_per_share = (price - stop_price).abs();
                if risk_per_share.is_zero() {
                    return Decimal::ZERO;
                }
                (equity * *risk_per_trade / risk_per_share).floor()
            }
            PositionSizingMethod::PercentEquity { fraction } => {
                (equity * *fraction / price).floor()
            }
            PositionSizingMethod::Fixed { shares } => shares.floor(),
        };

        let max_affordable = (equity / price).floor();
        size.min(max_affordable).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_risk() {
        let sizer = PositionSizer::new(PositionSizingMethod::FixedRisk {
            risk_per_trade: dec!(0.02),
        });

        // Risk 2% = $2000, stop $20 away = 100 shares, capped by 100000/4000 = 25
        let size = sizer.calculate(dec!(100000), dec!(4000), dec!(3980));
        assert_eq!(size, dec!(25));

        // Cheap stock: 2000 / 5 = 400 shares, affordable 1000
        let size = sizer.calculate(dec!(100000), dec!(100), dec!(95));
        assert_eq!(size, dec!(400));
    }

    #[test]
    fn test_zero_risk_per_share() {
        let sizer = PositionSizer::default();
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_short_stop_above_entry() {
        let sizer = PositionSizer::default();
        let size = sizer.calculate(dec!(100000), dec!(100), dec!(104));
        assert_eq!(size, dec!(500));
    }

    #[test]
    fn test_percent_equity() {
        let sizer = PositionSizer::new(PositionSizingMethod::PercentEquity {
            fraction: dec!(0.05),
        });
        // 5% of 100000 = 5000, at $100/share = 50 shares
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), dec!(0)), dec!(50));
    }

    #[test]
    fn test_fixed_shares_capped_by_equity() {
        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(1000) });
        assert_eq!(sizer.calculate(dec!(1000000), dec!(50), dec!(49)), dec!(1000));
        assert_eq!(sizer.calculate(dec!(5000), dec!(100), dec!(99)), dec!(50));
    }

    #[test]
    fn test_serde_shape() {
        let method: PositionSizingMethod =
            serde_json::from_str(r#"{"method":"percent_equity","fraction":"0.1"}"#).unwrap();
        assert_eq!(
            method,
            PositionSizingMethod::PercentEquity {
                fraction: dec!(0.1)
            }
        );
    }
}
