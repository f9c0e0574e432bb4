//! Bar cache: in-memory map backed by JSON files on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use trading_core::error::DataError;
use trading_core::types::{Bar, Timeframe};

/// Caches downloaded bars per request.
pub struct BarCache {
    memory: HashMap<String, Vec<Bar>>,
    cache_dir: PathBuf,
}

impl BarCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            memory: HashMap::new(),
            cache_dir: cache_dir.into(),
        }
    }

    /// `{symbol}_{interval}_{start}_{end}`.
    pub fn cache_key(symbol: &str, timeframe: Timeframe, start: NaiveDate, end: NaiveDate) -> String {
        let symbol: String = symbol
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{}_{}_{}_{}", symbol, timeframe, start, end)
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Cached bars for `key`, from memory first, then disk.
    ///
    /// An unreadable cache file is logged and treated as a miss.
    pub fn get(&mut self, key: &str) -> Option<Vec<Bar>> {
        if let Some(bars) = self.memory.get(key) {
            return Some(bars.clone());
        }

        let path = self.file_path(key);
        if !path.exists() {
            return None;
        }
        let loaded = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Vec<Bar>>(&text).map_err(|e| e.to_string()));
        match loaded {
            Ok(bars) => {
                tracing::info!(key, bars = bars.len(), "Loading cached data");
                self.memory.insert(key.to_string(), bars.clone());
                Some(bars)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to load cache, downloading fresh data");
                None
            }
        }
    }

    /// Store bars in memory and on disk.
    pub fn put(&mut self, key: &str, bars: Vec<Bar>) -> Result<(), DataError> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(e.to_string()))?;
        let text = serde_json::to_string(&bars).map_err(|e| DataError::CacheError(e.to_string()))?;
        std::fs::write(self.file_path(key), text)
            .map_err(|e| DataError::CacheError(e.to_string()))?;
        self.memory.insert(key.to_string(), bars);
        Ok(())
    }

    /// Drop the in-memory copy of every key.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        BarCache::cache_key(
            "^GSPC",
            Timeframe::Minute5,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(key(), "^GSPC_5m_2024-01-01_2024-01-31");
        let k = BarCache::cache_key(
            "BRK/B",
            Timeframe::Daily,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert!(k.starts_with("BRK_B_1d_"));
    }

    #[test]
    fn test_put_then_get_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bars = vec![Bar::new(1, 1.0, 2.0, 0.5, 1.5, 10.0)];

        let mut cache = BarCache::new(dir.path());
        cache.put(&key(), bars.clone()).unwrap();

        // Fresh cache: memory is empty, disk is not
        let mut other = BarCache::new(dir.path());
        assert_eq!(other.get(&key()), Some(bars));
        assert_eq!(other.get("missing"), None);
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}.json", key())), "{not json").unwrap();
        let mut cache = BarCache::new(dir.path());
        assert_eq!(cache.get(&key()), None);
    }
}
