//! Daily-bar stock screener.
//!
//! Each ticker gets a momentum score from technical signals and a
//! fundamental score from valuation, growth, margin and leverage. The two
//! are blended into a conviction score that drives the recommendation,
//! alongside support/resistance levels and 30/90-day price targets.

mod report;
mod scanner;
mod scoring;
mod signals;
mod targets;
mod universe;

pub use report::{markdown_report, sector_summary, write_csv, SectorSummary};
pub use scanner::{analyze, sort_by_conviction, Screener, ScreenerConfig, StockAnalysis, MIN_BARS};
pub use scoring::{conviction_score, fundamental_score, Recommendation, RiskLevel};
pub use signals::{quantile, screening_frame, screening_params, TechnicalSignals};
pub use targets::{annualized_volatility, estimate_return, PriceTargets};
pub use universe::{default_universe, DEFAULT_UNIVERSE};
