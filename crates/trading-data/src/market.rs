//! Cached market data access.

use chrono::{Duration, Local, NaiveDate};
use std::path::PathBuf;
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{BarSeries, Timeframe};

use crate::cache::BarCache;
use crate::clean::clean_bars;

/// Days of history pulled by [`MarketData::latest`].
pub const LATEST_LOOKBACK_DAYS: i64 = 7;

/// Fetches bars through a [`DataSource`] and caches them on disk.
pub struct MarketData<S> {
    source: S,
    cache: BarCache,
}

impl<S: DataSource> MarketData<S> {
    pub fn new(source: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache: BarCache::new(cache_dir),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Bars for `symbol` between two dates.
    ///
    /// Served from the cache unless `force_download` is set. Fresh downloads
    /// are cleaned and written back to the cache; a failed cache write is
    /// only logged.
    pub async fn fetch(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
        force_download: bool,
    ) -> Result<BarSeries, DataError> {
        if start > end {
            return Err(DataError::Internal(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let key = BarCache::cache_key(symbol, timeframe, start, end);
        if !force_download {
            if let Some(bars) = self.cache.get(&key) {
                return Ok(BarSeries::from_bars(symbol, timeframe, bars));
            }
        }

        tracing::info!(
            symbol,
            %timeframe,
            %start,
            %end,
            source = self.source.name(),
            "Downloading data"
        );
        let bars = clean_bars(
            self.source
                .get_historical_bars(symbol, timeframe, start, end)
                .await?,
        );
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        if let Err(e) = self.cache.put(&key, bars.clone()) {
            tracing::warn!(key, error = %e, "Failed to write cache");
        }
        tracing::info!(records = bars.len(), "Successfully downloaded and cached data");

        Ok(BarSeries::from_bars(symbol, timeframe, bars))
    }

    /// The last `lookback` bars from the past week, always downloaded fresh.
    pub async fn latest(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: usize,
    ) -> Result<BarSeries, DataError> {
        let end = Local::now().date_naive();
        let start = end - Duration::days(LATEST_LOOKBACK_DAYS);
        let series = self.fetch(symbol, timeframe, start, end, true).await?;
        Ok(series.tail(lookback))
    }
}
