//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::Timeframe;

/// Compact OHLCV bar.
///
/// `timestamp` is the exchange-local wall-clock time of the bar open,
/// encoded as milliseconds since the Unix epoch as if it were UTC. Session
/// rules (opening range, end-of-day exits) read the time of day directly
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds (exchange-local wall clock)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Volume-weighted average price, when the source provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            vwap: None,
        }
    }

    /// Typical price, (H + L + C) / 3.
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Median price, (H + L) / 2.
    #[inline]
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Same as [`Bar::typical_price`].
    #[inline]
    pub fn hlc3(&self) -> f64 {
        self.typical_price()
    }

    /// Average of all four prices.
    #[inline]
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Whether every price and the volume are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// The bar timestamp as a naive exchange-local datetime.
    pub fn datetime(&self) -> NaiveDateTime {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_default()
            .naive_utc()
    }

    /// Time of day of the bar open.
    pub fn time_of_day(&self) -> NaiveTime {
        self.datetime().time()
    }

    /// Minutes since midnight of the bar open.
    pub fn minute_of_day(&self) -> u32 {
        let t = self.time_of_day();
        t.hour() * 60 + t.minute()
    }

    /// True range against the previous close (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self::new(0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

/// Ordered bars for one symbol and timeframe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Create an empty series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: Vec::new(),
        }
    }

    /// Wrap bars that are already sorted by timestamp.
    pub fn from_bars(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Copy a contiguous window into a new series with the same symbol and
    /// timeframe. Out-of-range bounds are clamped.
    pub fn slice(&self, range: Range<usize>) -> BarSeries {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        Self::from_bars(
            self.symbol.clone(),
            self.timeframe,
            self.bars[start..end].to_vec(),
        )
    }

    /// The last `n` bars as a new series.
    pub fn tail(&self, n: usize) -> BarSeries {
        let start = self.bars.len().saturating_sub(n);
        self.slice(start..self.bars.len())
    }

    /// Calendar days covered from the first to the last bar.
    pub fn span_days(&self) -> i64 {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp) / 86_400_000,
            _ => 0,
        }
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.typical_price()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}

impl FromIterator<Bar> for BarSeries {
    fn from_iter<T: IntoIterator<Item = Bar>>(iter: T) -> Self {
        Self {
            symbol: String::new(),
            timeframe: Timeframe::Daily,
            bars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> i64 {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_bar_price_averages() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1_000_000.0);

        assert!((bar.typical_price() - 103.333333).abs() < 0.001);
        assert!((bar.hl2() - 102.5).abs() < 1e-10);
        assert!((bar.ohlc4() - 102.5).abs() < 1e-10);
        assert!((bar.range() - 15.0).abs() < 1e-10);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
    }

    #[test]
    fn test_bar_true_range() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1_000_000.0);

        assert!((bar.true_range(None) - 15.0).abs() < 0.001);
        // Gap from a previous close below the low
        assert!((bar.true_range(Some(90.0)) - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_bar_time_of_day() {
        let bar = Bar::new(ts(9, 35), 1.0, 1.0, 1.0, 1.0, 0.0);
        assert_eq!(bar.minute_of_day(), 9 * 60 + 35);
        assert_eq!(bar.time_of_day(), NaiveTime::from_hms_opt(9, 35, 0).unwrap());
    }

    #[test]
    fn test_bar_is_finite() {
        let mut bar = Bar::new(1, 1.0, 2.0, 0.5, 1.5, 10.0);
        assert!(bar.is_finite());
        bar.close = f64::NAN;
        assert!(!bar.is_finite());
    }

    #[test]
    fn test_series_slice_and_tail() {
        let bars: Vec<Bar> = (0..10)
            .map(|i| Bar::new(i, 100.0, 101.0, 99.0, 100.0 + i as f64, 1000.0))
            .collect();
        let series = BarSeries::from_bars("SPX", Timeframe::Minute5, bars);

        let window = series.slice(2..5);
        assert_eq!(window.len(), 3);
        assert_eq!(window.first().unwrap().timestamp, 2);
        assert_eq!(window.symbol, "SPX");
        assert_eq!(window.timeframe, Timeframe::Minute5);

        let clamped = series.slice(8..50);
        assert_eq!(clamped.len(), 2);

        let tail = series.tail(3);
        assert_eq!(tail.closes(), vec![107.0, 108.0, 109.0]);
    }

    #[test]
    fn test_series_span_days() {
        let day = 86_400_000;
        let series = BarSeries::from_bars(
            "SPX",
            Timeframe::Daily,
            vec![
                Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0),
                Bar::new(30 * day, 1.0, 1.0, 1.0, 1.0, 0.0),
            ],
        );
        assert_eq!(series.span_days(), 30);
        assert_eq!(BarSeries::new("X", Timeframe::Daily).span_days(), 0);
    }
}
