//! Fundamentals loaded from a CSV file, one row per ticker.

use async_trait::async_trait;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use trading_core::error::DataError;
use trading_core::traits::FundamentalsSource;
use trading_core::types::Fundamentals;

/// In-memory table of fundamentals keyed by upper-case ticker.
///
/// Columns are named after the [`Fundamentals`] fields; absent columns and
/// empty cells are treated as missing.
#[derive(Debug, Clone, Default)]
pub struct CsvFundamentals {
    rows: HashMap<String, Fundamentals>,
}

impl CsvFundamentals {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;

        let mut rows = HashMap::new();
        for result in reader.deserialize() {
            let record: Fundamentals = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed fundamentals row");
                    continue;
                }
            };
            rows.insert(record.ticker.to_uppercase(), record);
        }
        tracing::info!(path = %path.display(), tickers = rows.len(), "Fundamentals loaded");
        Ok(Self { rows })
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Fundamentals>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|f| (f.ticker.to_uppercase(), f))
                .collect(),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&Fundamentals> {
        self.rows.get(&ticker.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl FundamentalsSource for CsvFundamentals {
    async fn fundamentals(&self, ticker: &str) -> Result<Option<Fundamentals>, DataError> {
        Ok(self.get(ticker).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_with_missing_cells() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ticker,name,sector,pe_ratio,revenue_growth,debt_to_equity").unwrap();
        writeln!(file, "nvda,NVIDIA,Technology,65.2,1.22,0.41").unwrap();
        writeln!(file, "JPM,JPMorgan,Financials,12.1,,").unwrap();
        file.flush().unwrap();

        let table = CsvFundamentals::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let nvda = table.fundamentals("NVDA").await.unwrap().unwrap();
        assert_eq!(nvda.sector_or_unknown(), "Technology");
        assert!((nvda.pe_ratio.unwrap() - 65.2).abs() < 1e-10);

        let jpm = table.get("jpm").unwrap();
        assert!(jpm.revenue_growth.is_none());
        assert!(jpm.beta.is_none());

        assert!(table.fundamentals("TSLA").await.unwrap().is_none());
    }
}
