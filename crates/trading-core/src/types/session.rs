//! Regular trading session and intraday time filters.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{Bar, Timeframe};

/// Session hours in exchange-local time plus the windows to stay out of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSession {
    #[serde(with = "hhmm")]
    pub market_open: NaiveTime,
    #[serde(with = "hhmm")]
    pub market_close: NaiveTime,
    /// No entries during the first minutes after the open
    pub avoid_first_minutes: u32,
    /// No entries during the last minutes before the close
    pub avoid_last_minutes: u32,
    /// Bars at or after this time force an end-of-day exit
    #[serde(with = "hhmm")]
    pub eod_exit_time: NaiveTime,
}

impl Default for TradingSession {
    fn default() -> Self {
        Self {
            market_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            market_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            avoid_first_minutes: 30,
            avoid_last_minutes: 30,
            eod_exit_time: NaiveTime::from_hms_opt(15, 55, 0).unwrap_or_default(),
        }
    }
}

fn minutes(t: NaiveTime) -> u32 {
    use chrono::Timelike;
    t.hour() * 60 + t.minute()
}

impl TradingSession {
    /// Whether a new position may be opened on `bar`.
    ///
    /// Daily and longer bars are always tradable. Intraday bars must fall
    /// between `open + avoid_first` and `close - avoid_last`, both inclusive.
    pub fn is_tradable(&self, bar: &Bar, timeframe: Timeframe) -> bool {
        if !timeframe.is_intraday() {
            return true;
        }
        let m = bar.minute_of_day();
        let start = minutes(self.market_open) + self.avoid_first_minutes;
        let end = minutes(self.market_close).saturating_sub(self.avoid_last_minutes);
        m >= start && m <= end
    }

    /// Whether an open intraday position must be flattened on `bar`.
    pub fn is_end_of_day(&self, bar: &Bar, timeframe: Timeframe) -> bool {
        timeframe.is_intraday() && bar.minute_of_day() >= minutes(self.eod_exit_time)
    }

    pub fn validate(&self) -> Result<(), String> {
        let open = minutes(self.market_open);
        let close = minutes(self.market_close);
        if open >= close {
            return Err("market_open must be before market_close".to_string());
        }
        if self.avoid_first_minutes + self.avoid_last_minutes >= close - open {
            return Err("avoid windows cover the whole session".to_string());
        }
        Ok(())
    }
}

/// `HH:MM` (de)serialization for `NaiveTime`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_at(h: u32, m: u32) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        Bar::new(ts, 1.0, 1.0, 1.0, 1.0, 0.0)
    }

    #[test]
    fn test_opening_and_closing_windows() {
        let session = TradingSession::default();
        let tf = Timeframe::Minute5;

        assert!(!session.is_tradable(&bar_at(9, 30), tf));
        assert!(!session.is_tradable(&bar_at(9, 55), tf));
        assert!(session.is_tradable(&bar_at(10, 0), tf));
        assert!(session.is_tradable(&bar_at(15, 30), tf));
        assert!(!session.is_tradable(&bar_at(15, 35), tf));
        assert!(!session.is_tradable(&bar_at(8, 0), tf));
    }

    #[test]
    fn test_daily_bars_always_tradable() {
        let session = TradingSession::default();
        assert!(session.is_tradable(&bar_at(0, 0), Timeframe::Daily));
        assert!(!session.is_end_of_day(&bar_at(0, 0), Timeframe::Daily));
    }

    #[test]
    fn test_end_of_day() {
        let session = TradingSession::default();
        assert!(!session.is_end_of_day(&bar_at(15, 50), Timeframe::Minute5));
        assert!(session.is_end_of_day(&bar_at(15, 55), Timeframe::Minute5));
    }

    #[test]
    fn test_validate() {
        let mut session = TradingSession::default();
        assert!(session.validate().is_ok());
        session.avoid_first_minutes = 200;
        session.avoid_last_minutes = 200;
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_hhmm_serde() {
        let json = serde_json::to_string(&TradingSession::default()).unwrap();
        assert!(json.contains("\"09:30\""));
        let parsed: TradingSession =
            serde_json::from_str(r#"{"market_open":"09:45","eod_exit_time":"15:50:00"}"#).unwrap();
        assert_eq!(parsed.market_open, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
        assert_eq!(parsed.eod_exit_time, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
        assert_eq!(parsed.avoid_first_minutes, 30);
    }
}
