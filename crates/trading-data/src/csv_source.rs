//! CSV data source.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{Bar, Timeframe};

use crate::clean::clean_bars;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "Datetime",
        alias = "datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Row written by [`write_bars`].
#[derive(Debug, Serialize)]
struct CsvRow {
    #[serde(rename = "Datetime")]
    datetime: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// Parse the date formats seen in exported price files.
///
/// Offsets such as `-04:00` are dropped so the wall-clock time is kept.
pub fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let s = date_str.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    // "2024-01-02 09:30:00-05:00"
    let without_offset = if s.len() > 19 && (s.as_bytes()[19] == b'-' || s.as_bytes()[19] == b'+')
    {
        &s[..19]
    } else {
        s
    };

    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_offset, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    if let Ok(ts) = s.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", date_str)))
}

/// Read every bar in a CSV file, cleaned and sorted.
pub fn read_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let timestamp = parse_timestamp(&record.date)?;
        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    Ok(clean_bars(bars))
}

/// Write bars with a `Datetime,Open,High,Low,Close,Volume` header.
pub fn write_bars(path: impl AsRef<Path>, bars: &[Bar]) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DataError::Internal(e.to_string()))?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| DataError::Internal(e.to_string()))?;
    for bar in bars {
        writer
            .serialize(CsvRow {
                datetime: bar.datetime().format("%Y-%m-%d %H:%M:%S").to_string(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            })
            .map_err(|e| DataError::Internal(e.to_string()))?;
    }
    writer.flush().map_err(|e| DataError::Internal(e.to_string()))?;
    tracing::info!(path = %path.display(), bars = bars.len(), "Bars saved to CSV");
    Ok(())
}

/// CSV data source for historical data.
///
/// The file holds a single symbol at a single timeframe; requests for other
/// symbols return whatever the file contains.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all bars from the CSV file.
    pub fn load_all(&self) -> Result<Vec<Bar>, DataError> {
        read_bars(&self.path)
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn get_historical_bars(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let bars: Vec<Bar> = self
            .load_all()?
            .into_iter()
            .filter(|b| {
                let d = b.datetime().date();
                d >= start && d <= end
            })
            .collect();
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert!(parse_timestamp("1705312800000").is_ok()); // Unix ms
        assert!(parse_timestamp("1705312800").is_ok()); // Unix sec
        assert!(parse_timestamp("not a date").is_err());
    }

    #[test]
    fn test_offset_keeps_wall_clock() {
        let with_offset = parse_timestamp("2024-01-02 09:30:00-05:00").unwrap();
        let plain = parse_timestamp("2024-01-02 09:30:00").unwrap();
        assert_eq!(with_offset, plain);
    }

    #[test]
    fn test_read_yahoo_style_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Datetime,Open,High,Low,Close,Volume").unwrap();
        writeln!(file, "2024-01-02 09:35:00,4700,4705,4698,4702,1000").unwrap();
        writeln!(file, "2024-01-02 09:30:00,4695,4701,4690,4700,1200").unwrap();
        file.flush().unwrap();

        let bars = read_bars(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[0].open - 4695.0).abs() < 1e-10);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[tokio::test]
    async fn test_write_then_filter_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spx.csv");
        let day = 86_400_000;
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(1_704_153_600_000 + i * day, 1.0, 2.0, 0.5, 1.5, 10.0))
            .collect();
        write_bars(&path, &bars).unwrap();

        let source = CsvDataSource::new(&path).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let loaded = source
            .get_historical_bars("^GSPC", Timeframe::Daily, start, end)
            .await
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].timestamp, bars[1].timestamp);
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvDataSource::new("/nonexistent/bars.csv").is_err());
    }
}
