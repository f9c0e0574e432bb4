//! Support/resistance levels and classic pivot points.

use serde::{Deserialize, Serialize};
use trading_core::types::Bar;

/// Highest value of each `period` window. First output lines up with
/// input index `period - 1`.
pub fn rolling_max(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }
    data.windows(period)
        .map(|w| w.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
        .collect()
}

/// Lowest value of each `period` window.
pub fn rolling_min(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }
    data.windows(period)
        .map(|w| w.iter().cloned().fold(f64::INFINITY, f64::min))
        .collect()
}

/// Classic floor-trader pivots computed from a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub s1: f64,
    pub r2: f64,
    pub s2: f64,
}

impl PivotLevels {
    pub fn from_bar(bar: &Bar) -> Self {
        let pivot = bar.typical_price();
        let range = bar.range();
        Self {
            pivot,
            r1: 2.0 * pivot - bar.low,
            s1: 2.0 * pivot - bar.high,
            r2: pivot + range,
            s2: pivot - range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_extremes() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(rolling_max(&data, 3), vec![4.0, 4.0, 5.0]);
        assert_eq!(rolling_min(&data, 3), vec![1.0, 1.0, 1.0]);
        assert!(rolling_max(&data, 6).is_empty());
    }

    #[test]
    fn test_pivot_levels() {
        let bar = Bar::new(0, 100.0, 110.0, 90.0, 100.0, 0.0);
        let levels = PivotLevels::from_bar(&bar);

        assert!((levels.pivot - 100.0).abs() < 1e-10);
        assert!((levels.r1 - 110.0).abs() < 1e-10);
        assert!((levels.s1 - 90.0).abs() < 1e-10);
        assert!((levels.r2 - 120.0).abs() < 1e-10);
        assert!((levels.s2 - 80.0).abs() < 1e-10);
    }
}
