//! Core traits.

mod data_source;
mod indicator;

pub use data_source::{DataSource, FundamentalsSource};
pub use indicator::{Indicator, MultiOutputIndicator};
