//! Support, resistance and return-based price targets.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use trading_core::types::BarSeries;
use trading_indicators::{keys, IndicatorFrame};

use crate::signals::{BB_PERIOD, BB_STD, WINDOW};

const TRADING_DAYS: f64 = 252.0;
const STOP_FRACTION: f64 = 0.95;
const MIN_RETURN: f64 = -0.30;
const MAX_RETURN: f64 = 0.50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTargets {
    pub support_1: f64,
    pub support_2: f64,
    pub resistance_1: f64,
    pub resistance_2: f64,
    pub target_30d: f64,
    pub target_90d: f64,
    pub stop_loss: f64,
    /// Annualized volatility of daily returns.
    pub volatility: f64,
}

impl PriceTargets {
    /// Levels for a `horizon_days` move, anchored on the last close.
    pub fn compute(series: &BarSeries, frame: &IndicatorFrame, horizon_days: f64) -> Option<Self> {
        let price = series.last()?.close;
        let closes = series.closes();
        let vol = annualized_volatility(&closes);
        let band = vol * (horizon_days / TRADING_DAYS).sqrt();

        let recent = series.tail(WINDOW);
        let recent_low = recent.lows().into_iter().fold(f64::INFINITY, f64::min);
        let recent_high = recent.highs().into_iter().fold(f64::NEG_INFINITY, f64::max);
        let rsi = frame.latest(&keys::rsi(crate::signals::RSI_PERIOD));
        let sma200 = frame.latest(&keys::sma(200));

        let support_1 = frame
            .latest(&keys::bb_lower(BB_PERIOD, BB_STD))
            .map_or(recent_low, |l| l.max(recent_low));
        let resistance_1 = frame
            .latest(&keys::bb_upper(BB_PERIOD, BB_STD))
            .map_or(recent_high, |u| u.min(recent_high));

        Some(Self {
            support_1,
            support_2: price * (1.0 - band),
            resistance_1,
            resistance_2: price * (1.0 + band),
            target_30d: price * (1.0 + estimate_return(&closes, 30, rsi, sma200)),
            target_90d: price * (1.0 + estimate_return(&closes, 90, rsi, sma200)),
            stop_loss: price * STOP_FRACTION,
            volatility: vol,
        })
    }
}

/// Sample standard deviation of daily returns scaled to a year.
pub fn annualized_volatility(closes: &[f64]) -> f64 {
    let returns = period_returns(closes, 1);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = returns.iter().copied().std_dev();
    if std.is_finite() {
        std * TRADING_DAYS.sqrt()
    } else {
        0.0
    }
}

/// Returns over `days` bars for every bar that has that much history.
fn period_returns(closes: &[f64], days: usize) -> Vec<f64> {
    if days == 0 || closes.len() <= days {
        return Vec::new();
    }
    closes
        .iter()
        .zip(&closes[days..])
        .filter(|(prev, _)| **prev != 0.0)
        .map(|(prev, cur)| cur / prev - 1.0)
        .collect()
}

/// Expected return over `days`: the historical mean `days`-bar return,
/// nudged by RSI and the 200-day trend, scaled by `days / 30` and clipped
/// to [-30%, +50%].
pub fn estimate_return(closes: &[f64], days: usize, rsi: Option<f64>, sma200: Option<f64>) -> f64 {
    let returns = period_returns(closes, days);
    let mut expected = if returns.is_empty() {
        0.0
    } else {
        returns.iter().copied().mean()
    };

    if let Some(rsi) = rsi {
        if rsi > 30.0 && rsi < 50.0 {
            expected += 0.02;
        } else if rsi > 50.0 && rsi < 70.0 {
            expected += 0.01;
        } else if rsi > 70.0 {
            expected -= 0.01;
        }
    }

    if let (Some(price), Some(sma)) = (closes.last(), sma200) {
        if *price > sma {
            expected += 0.01;
        }
    }

    (expected * days as f64 / 30.0).clamp(MIN_RETURN, MAX_RETURN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::screening_frame;
    use trading_core::types::{Bar, Timeframe};

    #[test]
    fn test_flat_prices_have_no_volatility() {
        assert!((annualized_volatility(&[100.0; 30]) - 0.0).abs() < 1e-12);
        assert!((annualized_volatility(&[100.0]) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_return_adjustments() {
        let closes = vec![100.0; 40];
        // no drift, RSI 40 -> +2%, above 200-day -> +1%
        let r = estimate_return(&closes, 30, Some(40.0), Some(90.0));
        assert!((r - 0.03).abs() < 1e-10);
        // no 90-day history: only the adjustments, scaled by 90/30
        let r = estimate_return(&closes, 90, Some(40.0), Some(90.0));
        assert!((r - 0.09).abs() < 1e-10);
        let r = estimate_return(&closes, 30, Some(80.0), None);
        assert!((r + 0.01).abs() < 1e-10);
    }

    #[test]
    fn test_estimate_return_is_clipped() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 * 1.05f64.powi(i)).collect();
        let r = estimate_return(&closes, 90, None, None);
        assert!((r - MAX_RETURN).abs() < 1e-10);
        let falling: Vec<f64> = (0..200).map(|i| 100.0 * 0.95f64.powi(i)).collect();
        let r = estimate_return(&falling, 90, None, None);
        assert!((r - MIN_RETURN).abs() < 1e-10);
    }

    #[test]
    fn test_targets_bracket_price() {
        let bars = (0..120)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 3.0;
                Bar::new(i as i64 * 86_400_000, c, c + 1.0, c - 1.0, c, 1e6)
            })
            .collect();
        let series = BarSeries::from_bars("AAA", Timeframe::Daily, bars);
        let frame = screening_frame(&series);
        let t = PriceTargets::compute(&series, &frame, 30.0).unwrap();
        let price = series.last().unwrap().close;

        assert!((t.stop_loss - price * 0.95).abs() < 1e-10);
        assert!(t.volatility > 0.0);
        assert!(t.support_2 < price && t.resistance_2 > price);
        assert!(t.support_1 <= t.resistance_1);
    }
}
