//! Market data access: Yahoo chart downloads, CSV files, a disk cache and
//! fundamentals tables.

mod cache;
pub mod clean;
mod csv_source;
mod fundamentals;
mod market;
mod yahoo;

pub use cache::BarCache;
pub use clean::{clean_bars, resample};
pub use csv_source::{parse_timestamp, read_bars, write_bars, CsvDataSource};
pub use fundamentals::CsvFundamentals;
pub use market::{MarketData, LATEST_LOOKBACK_DAYS};
pub use yahoo::{chunk_ranges, parse_chart, YahooClient, INTRADAY_CHUNK_DAYS};
