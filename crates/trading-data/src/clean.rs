//! Bar cleaning and resampling.

use chrono::{Datelike, Duration};
use trading_core::types::{Bar, Timeframe};

const DAY_MS: i64 = 86_400_000;

/// Drop bars with non-finite prices, sort by time and keep the first bar of
/// every duplicated timestamp.
pub fn clean_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    let before = bars.len();
    bars.retain(|b| b.is_finite());
    // Stable sort keeps the original order among equal timestamps
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() != before {
        tracing::debug!(dropped = before - bars.len(), kept = bars.len(), "Cleaned bars");
    }
    bars
}

/// Start of the `timeframe` bucket containing `timestamp`.
pub fn bucket_start(timestamp: i64, timeframe: Timeframe) -> i64 {
    match timeframe {
        Timeframe::Weekly => {
            let day = timestamp.div_euclid(DAY_MS) * DAY_MS;
            let date = chrono::DateTime::from_timestamp_millis(day)
                .map(|dt| dt.date_naive())
                .unwrap_or_default();
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis())
                .unwrap_or(day)
        }
        other => {
            let width = other.as_millis();
            timestamp.div_euclid(width) * width
        }
    }
}

/// Aggregate clean, sorted bars into `timeframe` buckets: first open,
/// highest high, lowest low, last close, summed volume.
///
/// Buckets are labelled with their start time. Empty buckets are skipped.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    for bar in bars {
        let start = bucket_start(bar.timestamp, timeframe);
        match out.last_mut() {
            Some(current) if current.timestamp == start => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => out.push(Bar::new(
                start, bar.open, bar.high, bar.low, bar.close, bar.volume,
            )),
        }
    }
    out
}
