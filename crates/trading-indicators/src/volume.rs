//! Volume indicators: OBV, VWAP and Money Flow Index.

use chrono::NaiveDate;
use trading_core::types::Bar;

/// On-Balance Volume.
///
/// Volume is added on up closes and subtracted on flat or down closes; the
/// first bar counts as an up bar. Output has one value per bar.
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    let mut total = 0.0;
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let up = i == 0 || bar.close > bars[i - 1].close;
            total += if up { bar.volume } else { -bar.volume };
            total
        })
        .collect()
}

/// Volume-weighted average price of the close.
///
/// With `session_reset` the running sums restart on every new calendar
/// day; otherwise the average accumulates over the whole series. Bars
/// before any volume has traded yield `None`.
pub fn vwap(bars: &[Bar], session_reset: bool) -> Vec<Option<f64>> {
    let mut pv = 0.0;
    let mut vol = 0.0;
    let mut day: Option<NaiveDate> = None;

    bars.iter()
        .map(|bar| {
            let date = bar.datetime().date();
            if session_reset && day != Some(date) {
                pv = 0.0;
                vol = 0.0;
            }
            day = Some(date);

            pv += bar.close * bar.volume;
            vol += bar.volume;
            if vol > 0.0 {
                Some(pv / vol)
            } else {
                None
            }
        })
        .collect()
}

/// Money Flow Index over `period` bars.
///
/// Output lines up with input index `period`.
pub fn mfi(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() <= period {
        return vec![];
    }

    let mut positive = Vec::with_capacity(bars.len() - 1);
    let mut negative = Vec::with_capacity(bars.len() - 1);
    for w in bars.windows(2) {
        let prev_tp = w[0].typical_price();
        let tp = w[1].typical_price();
        let flow = tp * w[1].volume;
        if tp > prev_tp {
            positive.push(flow);
            negative.push(0.0);
        } else if tp < prev_tp {
            positive.push(0.0);
            negative.push(flow);
        } else {
            positive.push(0.0);
            negative.push(0.0);
        }
    }

    positive
        .windows(period)
        .zip(negative.windows(period))
        .map(|(p, n)| {
            let pos: f64 = p.iter().sum();
            let neg: f64 = n.iter().sum();
            if neg == 0.0 {
                if pos == 0.0 {
                    50.0
                } else {
                    100.0
                }
            } else {
                100.0 - 100.0 / (1.0 + pos / neg)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    fn bar(ts: i64, close: f64, volume: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, volume)
    }

    #[test]
    fn test_obv_accumulates_by_direction() {
        let bars = vec![
            bar(0, 10.0, 100.0),
            bar(1, 11.0, 50.0),
            bar(2, 10.5, 30.0),
            bar(3, 10.5, 20.0),
        ];
        assert_eq!(obv(&bars), vec![100.0, 150.0, 120.0, 100.0]);
    }

    #[test]
    fn test_vwap_cumulative_and_session() {
        let bars = vec![
            bar(0, 10.0, 100.0),
            bar(60_000, 20.0, 100.0),
            bar(DAY, 30.0, 100.0),
        ];

        let cumulative = vwap(&bars, false);
        assert!((cumulative[1].unwrap() - 15.0).abs() < 1e-10);
        assert!((cumulative[2].unwrap() - 20.0).abs() < 1e-10);

        let session = vwap(&bars, true);
        assert!((session[2].unwrap() - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_vwap_without_volume() {
        let bars = vec![bar(0, 10.0, 0.0), bar(1, 11.0, 10.0)];
        let out = vwap(&bars, false);
        assert!(out[0].is_none());
        assert!((out[1].unwrap() - 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_mfi_bounds() {
        let rising: Vec<Bar> = (0..6).map(|i| bar(i, 10.0 + i as f64, 100.0)).collect();
        let out = mfi(&rising, 3);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| (*v - 100.0).abs() < 1e-10));

        let falling: Vec<Bar> = (0..6).map(|i| bar(i, 10.0 - i as f64, 100.0)).collect();
        assert!(mfi(&falling, 3).iter().all(|v| v.abs() < 1e-10));

        assert!(mfi(&rising[..3], 3).is_empty());
    }
}
