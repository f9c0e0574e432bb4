//! Data source trait definitions.

use crate::error::DataError;
use crate::types::{Bar, Fundamentals, Timeframe};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of historical bars.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch bars for `symbol` between `start` and `end` (inclusive dates),
    /// ordered from oldest to newest.
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;

    fn name(&self) -> &str;
}

/// Source of per-ticker fundamental snapshots.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fundamentals for `ticker`, or `None` when the source has no entry.
    async fn fundamentals(&self, ticker: &str) -> Result<Option<Fundamentals>, DataError>;
}
