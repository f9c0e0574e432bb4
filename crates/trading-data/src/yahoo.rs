//! Yahoo Finance chart API client.
//!
//! Daily and longer bars come back in one request. Intraday history is only
//! served in short windows, so longer ranges are fetched in 59-day chunks
//! walking back from the end date.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{Bar, Timeframe};

use crate::clean::{clean_bars, resample};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) market-lab";

/// Longest window the chart API serves for intraday intervals.
pub const INTRADAY_CHUNK_DAYS: i64 = 59;

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Turn a chart API response body into bars.
///
/// Timestamps are shifted by the exchange offset so they read as local
/// wall-clock time. Rows with any missing price are skipped.
pub fn parse_chart(body: &str) -> Result<Vec<Bar>, DataError> {
    let response: YahooResponse =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;

    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            return Err(DataError::SymbolNotFound(error.description));
        }
        return Err(DataError::ParseError(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(DataError::NoDataAvailable)?;

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Err(DataError::NoDataAvailable);
    };

    let offset = result.meta.gmtoffset;
    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);

        if let (Some(o), Some(h), Some(l), Some(c)) = (open, high, low, close) {
            bars.push(Bar::new((ts + offset) * 1000, o, h, l, c, volume));
        }
    }
    Ok(bars)
}

/// Date windows covering `start..end`, newest first, each at most
/// `chunk_days` long. Each window's end is exclusive and equals the start of
/// the previous one.
pub fn chunk_ranges(start: NaiveDate, end: NaiveDate, chunk_days: i64) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut current_end = end;
    while current_end > start {
        let current_start = start.max(current_end - Duration::days(chunk_days));
        ranges.push((current_start, current_end));
        current_end = current_start;
    }
    ranges
}

fn epoch_secs(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Yahoo Finance client.
#[derive(Debug, Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// One chart request between two dates (end exclusive).
    pub async fn fetch_range(
        &self,
        symbol: &str,
        interval: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        tracing::debug!(%url, interval, %start, %end, "Fetching chart data");

        let body = self
            .client
            .get(&url)
            .query(&[
                ("interval", interval.to_string()),
                ("period1", epoch_secs(start).to_string()),
                ("period2", epoch_secs(end).to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?
            .text()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        parse_chart(&body)
    }

    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Bar> {
        let mut all = Vec::new();
        for (chunk_start, chunk_end) in chunk_ranges(start, end, INTRADAY_CHUNK_DAYS) {
            match self.fetch_range(symbol, interval, chunk_start, chunk_end).await {
                Ok(bars) => {
                    tracing::info!(
                        %chunk_start,
                        %chunk_end,
                        records = bars.len(),
                        "Downloaded chunk"
                    );
                    all.extend(bars);
                }
                Err(e) => {
                    tracing::warn!(%chunk_start, %chunk_end, error = %e, "Failed to download chunk");
                }
            }
        }
        all
    }
}

#[async_trait]
impl DataSource for YahooClient {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let base = timeframe.download_base();
        let interval = base
            .yahoo_interval()
            .ok_or_else(|| DataError::InvalidTimeframe(timeframe.to_string()))?;

        let raw = if base.is_intraday() {
            self.fetch_intraday(symbol, interval, start, end).await
        } else {
            self.fetch_range(symbol, interval, start, end).await?
        };

        let mut bars = clean_bars(raw);
        if base != timeframe {
            bars = resample(&bars, timeframe);
        }
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
