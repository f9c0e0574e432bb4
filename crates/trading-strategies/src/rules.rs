//! Per-indicator entry rules.
//!
//! Every rule compares bar `i` with bar `i - 1` and produces one long and one
//! short column aligned to the bars. Bars without indicator values never
//! fire.

use trading_core::types::BarSeries;
use trading_indicators::{keys, IndicatorFrame, IndicatorKind, IndicatorParams};

/// Long/short firing columns of a single rule.
#[derive(Debug, Clone)]
pub struct RuleSignals {
    pub name: String,
    pub kind: IndicatorKind,
    pub long: Vec<bool>,
    pub short: Vec<bool>,
}

impl RuleSignals {
    fn new(name: String, kind: IndicatorKind, len: usize) -> Self {
        Self {
            name,
            kind,
            long: vec![false; len],
            short: vec![false; len],
        }
    }

    pub fn long_count(&self) -> usize {
        self.long.iter().filter(|f| **f).count()
    }

    pub fn short_count(&self) -> usize {
        self.short.iter().filter(|f| **f).count()
    }
}

/// `a` moved from at-or-below `b` to strictly above it.
fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    a > b && prev_a <= prev_b
}

/// `a` moved from at-or-above `b` to strictly below it.
fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    a < b && prev_a >= prev_b
}

/// Values of two columns on bars `i - 1` and `i`, if all four exist.
fn pair_at(frame: &IndicatorFrame, a: &str, b: &str, i: usize) -> Option<(f64, f64, f64, f64)> {
    if i == 0 {
        return None;
    }
    Some((
        frame.value(a, i - 1)?,
        frame.value(b, i - 1)?,
        frame.value(a, i)?,
        frame.value(b, i)?,
    ))
}

/// RSI leaving the oversold zone (long) or the overbought zone (short).
/// One rule per period: leaving any configured zone counts as a single vote.
pub fn rsi_rules(frame: &IndicatorFrame, params: &IndicatorParams) -> Vec<RuleSignals> {
    let Some(rsi) = &params.rsi else {
        return vec![];
    };
    let n = frame.len();
    let mut out = Vec::new();
    for &period in &rsi.periods {
        let column = keys::rsi(period);
        if !frame.contains(&column) {
            continue;
        }
        let mut rule = RuleSignals::new(column.clone(), IndicatorKind::Rsi, n);
        for i in 1..n {
            let (Some(prev), Some(cur)) = (frame.value(&column, i - 1), frame.value(&column, i))
            else {
                continue;
            };
            rule.long[i] = rsi.oversold.iter().any(|&t| cur > t && prev <= t);
            rule.short[i] = rsi.overbought.iter().any(|&t| cur < t && prev >= t);
        }
        out.push(rule);
    }
    out
}

/// MACD line crossing its signal line.
pub fn macd_rules(frame: &IndicatorFrame, params: &IndicatorParams) -> Vec<RuleSignals> {
    let Some(macd) = &params.macd else {
        return vec![];
    };
    let n = frame.len();
    let mut out = Vec::new();
    for (fast, slow, signal) in macd.triples() {
        let line = keys::macd(fast, slow, signal);
        let sig = keys::macd_signal(fast, slow, signal);
        if !frame.contains(&line) || !frame.contains(&sig) {
            continue;
        }
        let mut rule = RuleSignals::new(line.clone(), IndicatorKind::Macd, n);
        for i in 1..n {
            if let Some((pa, pb, a, b)) = pair_at(frame, &line, &sig, i) {
                rule.long[i] = crossed_above(pa, pb, a, b);
                rule.short[i] = crossed_below(pa, pb, a, b);
            }
        }
        out.push(rule);
    }
    out
}

/// Rejection candles at the bands: a bullish bar that dipped to the lower
/// band and closed back inside (long), or the bearish mirror at the upper
/// band (short).
pub fn bollinger_rules(
    series: &BarSeries,
    frame: &IndicatorFrame,
    params: &IndicatorParams,
) -> Vec<RuleSignals> {
    let Some(bb) = &params.bollinger else {
        return vec![];
    };
    let bars = series.bars();
    let n = frame.len().min(bars.len());
    let mut out = Vec::new();
    for &period in &bb.periods {
        for &std in &bb.std_dev {
            let upper = keys::bb_upper(period, std);
            let lower = keys::bb_lower(period, std);
            if !frame.contains(&upper) || !frame.contains(&lower) {
                continue;
            }
            let mut rule =
                RuleSignals::new(format!("BB_{}_{}", period, std), IndicatorKind::Bollinger, n);
            for (i, bar) in bars.iter().enumerate().take(n).skip(1) {
                if let Some(lo) = frame.value(&lower, i) {
                    rule.long[i] = bar.close > lo && bar.low <= lo && bar.is_bullish();
                }
                if let Some(up) = frame.value(&upper, i) {
                    rule.short[i] = bar.close < up && bar.high >= up && bar.is_bearish();
                }
            }
            out.push(rule);
        }
    }
    out
}

/// Short EMA crossing a longer EMA.
pub fn ema_rules(frame: &IndicatorFrame, params: &IndicatorParams) -> Vec<RuleSignals> {
    let Some(ema) = &params.ema else {
        return vec![];
    };
    let n = frame.len();
    let mut out = Vec::new();
    for (short, long) in ema.pairs() {
        let fast = keys::ema(short);
        let slow = keys::ema(long);
        if !frame.contains(&fast) || !frame.contains(&slow) {
            continue;
        }
        let mut rule =
            RuleSignals::new(format!("EMA_{}_{}", short, long), IndicatorKind::Ema, n);
        for i in 1..n {
            if let Some((pa, pb, a, b)) = pair_at(frame, &fast, &slow, i) {
                rule.long[i] = crossed_above(pa, pb, a, b);
                rule.short[i] = crossed_below(pa, pb, a, b);
            }
        }
        out.push(rule);
    }
    out
}

/// Every rule the parameters enable, in RSI, MACD, Bollinger, EMA order.
pub fn all_rules(
    series: &BarSeries,
    frame: &IndicatorFrame,
    params: &IndicatorParams,
) -> Vec<RuleSignals> {
    let mut rules = rsi_rules(frame, params);
    rules.extend(macd_rules(frame, params));
    rules.extend(bollinger_rules(series, frame, params));
    rules.extend(ema_rules(frame, params));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::{Bar, Timeframe};
    use trading_indicators::{BollingerParams, EmaParams, RsiParams};

    fn frame_with(name: &str, values: Vec<Option<f64>>) -> IndicatorFrame {
        let mut frame = IndicatorFrame::new(values.len());
        frame.insert(name, values);
        frame
    }

    fn rsi_params() -> IndicatorParams {
        let mut params = IndicatorParams::empty();
        params.rsi = Some(RsiParams {
            periods: vec![14],
            oversold: vec![30.0],
            overbought: vec![70.0],
        });
        params
    }

    #[test]
    fn test_crossings() {
        assert!(crossed_above(1.0, 1.0, 2.0, 1.0));
        assert!(!crossed_above(2.0, 1.0, 3.0, 1.0));
        assert!(crossed_below(1.0, 1.0, 0.5, 1.0));
        assert!(!crossed_below(0.5, 1.0, 0.4, 1.0));
    }

    #[test]
    fn test_rsi_leaves_zones() {
        let frame = frame_with(
            &keys::rsi(14),
            vec![None, Some(25.0), Some(31.0), Some(50.0), Some(72.0), Some(69.0)],
        );
        let rules = rsi_rules(&frame, &rsi_params());
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.long, vec![false, false, true, false, false, false]);
        assert_eq!(rule.short, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_rsi_threshold_touch_counts_as_prior_zone() {
        let frame = frame_with(&keys::rsi(14), vec![Some(30.0), Some(30.5)]);
        let rules = rsi_rules(&frame, &rsi_params());
        assert!(rules[0].long[1]);
    }

    #[test]
    fn test_rsi_thresholds_share_one_rule() {
        let frame = frame_with(
            &keys::rsi(14),
            vec![Some(25.0), Some(35.0), Some(85.0), Some(75.0), Some(65.0)],
        );
        let mut params = rsi_params();
        params.rsi = Some(RsiParams {
            periods: vec![14],
            oversold: vec![20.0, 30.0],
            overbought: vec![70.0, 80.0],
        });

        let rules = rsi_rules(&frame, &params);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "RSI_14");
        assert_eq!(rules[0].long, vec![false, true, false, false, false]);
        assert_eq!(rules[0].short, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_missing_column_yields_no_rule() {
        let frame = IndicatorFrame::new(3);
        assert!(rsi_rules(&frame, &rsi_params()).is_empty());
        assert!(rsi_rules(&frame, &IndicatorParams::empty()).is_empty());
    }

    #[test]
    fn test_ema_cross() {
        let mut frame = IndicatorFrame::new(4);
        frame.insert(keys::ema(10), vec![Some(9.0), Some(9.5), Some(10.5), Some(9.0)]);
        frame.insert(keys::ema(50), vec![Some(10.0), Some(10.0), Some(10.0), Some(10.0)]);
        let mut params = IndicatorParams::empty();
        params.ema = Some(EmaParams {
            short_periods: vec![10],
            long_periods: vec![50],
        });

        let rules = ema_rules(&frame, &params);
        assert_eq!(rules[0].long, vec![false, false, true, false]);
        assert_eq!(rules[0].short, vec![false, false, false, true]);
    }

    #[test]
    fn test_bollinger_rejection() {
        let bars = vec![
            Bar::new(0, 100.0, 101.0, 99.0, 100.0, 1.0),
            // Dips below the lower band and closes green above it
            Bar::new(1, 95.5, 97.0, 94.0, 96.5, 1.0),
            // Red bar that wicks the upper band
            Bar::new(2, 104.0, 106.0, 102.0, 103.0, 1.0),
            // Green bar through the lower band closing below it: no signal
            Bar::new(3, 93.0, 94.5, 92.0, 94.0, 1.0),
        ];
        let series = BarSeries::from_bars("TEST", Timeframe::Daily, bars);
        let mut frame = IndicatorFrame::new(4);
        frame.insert(keys::bb_upper(20, 2.0), vec![Some(105.0); 4]);
        frame.insert(keys::bb_lower(20, 2.0), vec![Some(95.0); 4]);
        let mut params = IndicatorParams::empty();
        params.bollinger = Some(BollingerParams {
            periods: vec![20],
            std_dev: vec![2.0],
        });

        let rules = bollinger_rules(&series, &frame, &params);
        assert_eq!(rules[0].long, vec![false, true, false, false]);
        assert_eq!(rules[0].short, vec![false, false, true, false]);
    }
}
