//! Timeframe definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    /// Not served by the chart API; built by resampling 5 minute bars.
    #[serde(rename = "10m")]
    Minute10,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    #[default]
    Daily,
    #[serde(rename = "1w")]
    Weekly,
}

impl Timeframe {
    /// Duration of one bar in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute5 => 300,
            Timeframe::Minute10 => 600,
            Timeframe::Minute15 => 900,
            Timeframe::Minute30 => 1800,
            Timeframe::Hour1 => 3600,
            Timeframe::Daily => 86400,
            Timeframe::Weekly => 604800,
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.as_secs() as i64 * 1000
    }

    pub fn is_intraday(&self) -> bool {
        self.as_secs() < Timeframe::Daily.as_secs()
    }

    /// Interval string understood by the Yahoo chart API, if any.
    pub fn yahoo_interval(&self) -> Option<&'static str> {
        match self {
            Timeframe::Minute1 => Some("1m"),
            Timeframe::Minute5 => Some("5m"),
            Timeframe::Minute10 => None,
            Timeframe::Minute15 => Some("15m"),
            Timeframe::Minute30 => Some("30m"),
            Timeframe::Hour1 => Some("60m"),
            Timeframe::Daily => Some("1d"),
            Timeframe::Weekly => Some("1wk"),
        }
    }

    /// Finest timeframe the chart API serves that aggregates evenly into
    /// this one.
    pub fn download_base(&self) -> Timeframe {
        match self {
            Timeframe::Minute10 => Timeframe::Minute5,
            other => *other,
        }
    }

    /// Approximate number of bars in one regular trading session (6.5h).
    pub fn bars_per_session(&self) -> usize {
        if self.is_intraday() {
            (390 * 60 / self.as_secs()) as usize
        } else {
            1
        }
    }

    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::Minute1,
            Timeframe::Minute5,
            Timeframe::Minute10,
            Timeframe::Minute15,
            Timeframe::Minute30,
            Timeframe::Hour1,
            Timeframe::Daily,
            Timeframe::Weekly,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute10 => "10m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "10m" | "10min" => Ok(Timeframe::Minute10),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "60m" | "hour" => Ok(Timeframe::Hour1),
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "1wk" | "week" | "weekly" => Ok(Timeframe::Weekly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse_and_display() {
        assert_eq!(Timeframe::from_str("10m").unwrap(), Timeframe::Minute10);
        assert_eq!(Timeframe::from_str("60m").unwrap(), Timeframe::Hour1);
        assert_eq!(Timeframe::from_str("daily").unwrap(), Timeframe::Daily);
        assert!(Timeframe::from_str("7m").is_err());
        assert_eq!(Timeframe::Minute10.to_string(), "10m");
    }

    #[test]
    fn test_yahoo_interval_mapping() {
        assert_eq!(Timeframe::Minute5.yahoo_interval(), Some("5m"));
        assert_eq!(Timeframe::Hour1.yahoo_interval(), Some("60m"));
        assert_eq!(Timeframe::Minute10.yahoo_interval(), None);
        assert_eq!(Timeframe::Minute10.download_base(), Timeframe::Minute5);
        assert_eq!(Timeframe::Daily.download_base(), Timeframe::Daily);
    }

    #[test]
    fn test_intraday_and_session_bars() {
        assert!(Timeframe::Minute10.is_intraday());
        assert!(!Timeframe::Daily.is_intraday());
        assert_eq!(Timeframe::Minute5.bars_per_session(), 78);
        assert_eq!(Timeframe::Minute10.bars_per_session(), 39);
        assert_eq!(Timeframe::Daily.bars_per_session(), 1);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Timeframe::Minute10).unwrap();
        assert_eq!(json, "\"10m\"");
        let tf: Timeframe = serde_json::from_str("\"5m\"").unwrap();
        assert_eq!(tf, Timeframe::Minute5);
    }
}
