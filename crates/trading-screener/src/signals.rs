//! Technical signals on the latest daily bar.

use serde::{Deserialize, Serialize};
use trading_core::types::BarSeries;
use trading_indicators::{keys, IndicatorFrame, IndicatorParams, MacdParams, RsiParams};
use trading_indicators::{AtrParams, BollingerParams};

pub const RSI_PERIOD: usize = 14;
pub const MACD: (usize, usize, usize) = (12, 26, 9);
pub const BB_PERIOD: usize = 20;
pub const BB_STD: f64 = 2.0;
/// Lookback for divergence, support/resistance and volume averages.
pub const WINDOW: usize = 20;
/// Golden/death crosses compare the latest bar with this many bars back.
const CROSS_LOOKBACK: usize = 4;
const VOLUME_SURGE_RATIO: f64 = 1.5;
const SQUEEZE_QUANTILE: f64 = 0.2;

/// Indicator set computed for every screened ticker.
pub fn screening_params() -> IndicatorParams {
    IndicatorParams {
        rsi: Some(RsiParams {
            periods: vec![RSI_PERIOD],
            oversold: vec![30.0],
            overbought: vec![70.0],
        }),
        ema: None,
        macd: Some(MacdParams {
            fast: vec![MACD.0],
            slow: vec![MACD.1],
            signal: vec![MACD.2],
        }),
        bollinger: Some(BollingerParams {
            periods: vec![BB_PERIOD],
            std_dev: vec![BB_STD],
        }),
        atr: Some(AtrParams {
            periods: vec![14],
            stop_loss_multiplier: vec![2.0],
        }),
    }
}

/// Indicator frame used by the screener.
pub fn screening_frame(series: &BarSeries) -> IndicatorFrame {
    IndicatorFrame::compute(series, &screening_params())
}

/// Linear-interpolated quantile of `values` (`q` in 0..=1).
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Minimum of the `window` values ending at `end` (inclusive); `None` if
/// any is missing.
fn window_min(values: &[Option<f64>], end: usize, window: usize) -> Option<f64> {
    if window == 0 || end + 1 < window || end >= values.len() {
        return None;
    }
    values[end + 1 - window..=end]
        .iter()
        .try_fold(f64::INFINITY, |acc, v| v.map(|v| acc.min(v)))
}

/// Boolean signals and the momentum score for the last bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSignals {
    pub price: f64,
    pub rsi: Option<f64>,
    pub above_sma_20: bool,
    pub above_sma_50: bool,
    pub above_sma_200: bool,
    pub golden_cross: bool,
    pub death_cross: bool,
    pub rsi_oversold: bool,
    pub rsi_overbought: bool,
    pub rsi_bullish_divergence: bool,
    pub macd_bullish: bool,
    pub macd_cross_up: bool,
    pub bb_squeeze: bool,
    pub price_below_lower_bb: bool,
    pub price_above_upper_bb: bool,
    pub volume_surge: bool,
    /// 0-100
    pub momentum_score: u32,
}

impl TechnicalSignals {
    /// Evaluate signals on the last bar. `frame` must come from
    /// [`screening_frame`] for the same series.
    pub fn evaluate(series: &BarSeries, frame: &IndicatorFrame) -> Option<Self> {
        let price = series.last()?.close;
        let above = |name: &str| frame.latest(name).map(|v| price > v).unwrap_or(false);

        let sma50 = keys::sma(50);
        let sma200 = keys::sma(200);
        let cross = |lookback: usize| {
            frame
                .back(&sma50, lookback)
                .zip(frame.back(&sma200, lookback))
        };
        let (golden_cross, death_cross) = match (cross(0), cross(CROSS_LOOKBACK)) {
            (Some((fast, slow)), Some((fast_then, slow_then))) => (
                fast > slow && fast_then <= slow_then,
                fast < slow && fast_then >= slow_then,
            ),
            _ => (false, false),
        };

        let rsi_key = keys::rsi(RSI_PERIOD);
        let rsi = frame.latest(&rsi_key);

        let (fast, slow, sig) = MACD;
        let macd_key = keys::macd(fast, slow, sig);
        let signal_key = keys::macd_signal(fast, slow, sig);
        let macd_above = |back: usize| {
            frame
                .back(&macd_key, back)
                .zip(frame.back(&signal_key, back))
                .map(|(m, s)| m > s)
        };
        let macd_bullish = macd_above(0).unwrap_or(false);
        let macd_cross_up = macd_bullish && macd_above(1) == Some(false);

        let width_key = keys::bb_bandwidth(BB_PERIOD, BB_STD);
        let widths: Vec<f64> = frame
            .get(&width_key)
            .map(|c| c.iter().flatten().copied().collect())
            .unwrap_or_default();
        let bb_squeeze = match (frame.latest(&width_key), quantile(&widths, SQUEEZE_QUANTILE)) {
            (Some(w), Some(q)) => w < q,
            _ => false,
        };
        let price_below_lower_bb = frame
            .latest(&keys::bb_lower(BB_PERIOD, BB_STD))
            .map(|l| price < l)
            .unwrap_or(false);
        let price_above_upper_bb = frame
            .latest(&keys::bb_upper(BB_PERIOD, BB_STD))
            .map(|u| price > u)
            .unwrap_or(false);

        let volume_surge = volume_surge(series);
        let rsi_bullish_divergence = bullish_divergence(series, frame.get(&rsi_key), WINDOW);

        let mut signals = Self {
            price,
            rsi,
            above_sma_20: above(&keys::sma(20)),
            above_sma_50: above(&sma50),
            above_sma_200: above(&sma200),
            golden_cross,
            death_cross,
            rsi_oversold: rsi.map(|r| r < 30.0).unwrap_or(false),
            rsi_overbought: rsi.map(|r| r > 70.0).unwrap_or(false),
            rsi_bullish_divergence,
            macd_bullish,
            macd_cross_up,
            bb_squeeze,
            price_below_lower_bb,
            price_above_upper_bb,
            volume_surge,
            momentum_score: 0,
        };
        signals.momentum_score = signals.momentum();
        Some(signals)
    }

    /// Trend, momentum and participation points, at most 100.
    fn momentum(&self) -> u32 {
        let mut score = 0;
        if self.above_sma_20 {
            score += 10;
        }
        if self.above_sma_50 {
            score += 15;
        }
        if self.above_sma_200 {
            score += 20;
        }
        if self.macd_bullish {
            score += 15;
        }
        if let Some(rsi) = self.rsi {
            if rsi > 40.0 && rsi < 60.0 {
                score += 10;
            } else if rsi > 30.0 && rsi <= 40.0 {
                score += 15;
            } else if (60.0..70.0).contains(&rsi) {
                score += 5;
            }
        }
        if self.volume_surge {
            score += 10;
        }
        if !self.bb_squeeze {
            score += 5;
        }
        if self.golden_cross {
            score += 10;
        }
        score.min(100)
    }
}

/// Last volume above 1.5x its 20-bar mean (the mean includes the last bar).
fn volume_surge(series: &BarSeries) -> bool {
    let bars = series.bars();
    if bars.len() < WINDOW {
        return false;
    }
    let recent = &bars[bars.len() - WINDOW..];
    let mean = recent.iter().map(|b| b.volume).sum::<f64>() / WINDOW as f64;
    recent
        .last()
        .map(|b| b.volume > mean * VOLUME_SURGE_RATIO)
        .unwrap_or(false)
}

/// Price made a lower `window`-bar low while RSI made a higher one.
fn bullish_divergence(series: &BarSeries, rsi: Option<&[Option<f64>]>, window: usize) -> bool {
    let n = series.len();
    let Some(rsi) = rsi else {
        return false;
    };
    if n < window * 2 || rsi.len() != n {
        return false;
    }
    let closes: Vec<Option<f64>> = series.iter().map(|b| Some(b.close)).collect();
    let last = n - 1;
    let earlier = n - window;
    match (
        window_min(&closes, last, window),
        window_min(&closes, earlier, window),
        window_min(rsi, last, window),
        window_min(rsi, earlier, window),
    ) {
        (Some(p_now), Some(p_then), Some(r_now), Some(r_then)) => p_now < p_then && r_now > r_then,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::{Bar, Timeframe};

    pub(crate) fn accelerating(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + 0.002 * (i * i) as f64;
                Bar::new(i as i64 * 86_400_000, c - 0.2, c + 0.5, c - 0.5, c, 1_000_000.0)
            })
            .collect();
        BarSeries::from_bars("AAA", Timeframe::Daily, bars)
    }

    #[test]
    fn test_quantile_interpolates() {
        let q = quantile(&[4.0, 1.0, 3.0, 2.0, 5.0], 0.2).unwrap();
        assert!((q - 1.8).abs() < 1e-10);
        assert!(quantile(&[], 0.5).is_none());
        assert!((quantile(&[7.0], 0.2).unwrap() - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_window_min() {
        let v = vec![Some(3.0), Some(1.0), Some(2.0), None, Some(5.0)];
        assert_eq!(window_min(&v, 2, 3), Some(1.0));
        assert_eq!(window_min(&v, 4, 2), None);
        assert_eq!(window_min(&v, 1, 3), None);
    }

    #[test]
    fn test_uptrend_signals() {
        let series = accelerating(260);
        let frame = screening_frame(&series);
        let s = TechnicalSignals::evaluate(&series, &frame).unwrap();

        assert!(s.above_sma_20 && s.above_sma_50 && s.above_sma_200);
        assert!(s.macd_bullish);
        assert!(s.rsi_overbought);
        assert!(!s.rsi_oversold);
        assert!(!s.golden_cross);
        assert!(!s.death_cross);
        assert!(!s.volume_surge);
        // 10 + 15 + 20 + 15, plus 5 unless the bands are squeezed
        assert!(s.momentum_score == 60 || s.momentum_score == 65);
    }

    #[test]
    fn test_volume_surge() {
        let mut bars = accelerating(60).into_bars();
        if let Some(last) = bars.last_mut() {
            last.volume = 3_000_000.0;
        }
        let series = BarSeries::from_bars("AAA", Timeframe::Daily, bars);
        let frame = screening_frame(&series);
        assert!(TechnicalSignals::evaluate(&series, &frame).unwrap().volume_surge);
    }

    #[test]
    fn test_short_series_has_no_sma200_signal() {
        let series = accelerating(50);
        let frame = screening_frame(&series);
        let s = TechnicalSignals::evaluate(&series, &frame).unwrap();
        assert!(!s.above_sma_200);
        // rising lows
        assert!(!s.rsi_bullish_divergence);
    }

    #[test]
    fn test_divergence_needs_two_windows() {
        let series = accelerating(39);
        let rsi = vec![Some(50.0); 39];
        assert!(!bullish_divergence(&series, Some(&rsi), WINDOW));
    }

    #[test]
    fn test_bullish_divergence() {
        // Lower price low in the recent window, higher RSI low.
        let closes: Vec<f64> = (0..40)
            .map(|i| if i == 10 { 90.0 } else if i == 35 { 85.0 } else { 100.0 })
            .collect();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(i as i64 * 86_400_000, *c, c + 1.0, c - 1.0, *c, 1.0))
            .collect();
        let series = BarSeries::from_bars("AAA", Timeframe::Daily, bars);
        let rsi: Vec<Option<f64>> = (0..40)
            .map(|i| Some(if i == 10 { 20.0 } else if i == 35 { 35.0 } else { 50.0 }))
            .collect();
        assert!(bullish_divergence(&series, Some(&rsi), WINDOW));
    }
}
