//! Per-ticker analysis and the concurrent universe scan.

use chrono::{Duration, Local, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use trading_core::error::IndicatorError;
use trading_core::traits::{DataSource, FundamentalsSource};
use trading_core::types::{BarSeries, Fundamentals, Timeframe};
use trading_core::TradingResult;

use crate::scoring::{conviction_score, fundamental_score, Recommendation, RiskLevel};
use crate::signals::{screening_frame, TechnicalSignals};
use crate::targets::PriceTargets;

/// Bars needed before MACD and its signal line are defined.
pub const MIN_BARS: usize = 35;
const TARGET_HORIZON_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Calendar days of daily history per ticker.
    pub lookback_days: i64,
    /// Conviction at or above which a ticker is listed as a top pick.
    pub high_conviction: f64,
    /// Tickers fetched at once.
    pub concurrency: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            high_conviction: 70.0,
            concurrency: 4,
        }
    }
}

/// One row of the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAnalysis {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub current_price: f64,
    pub market_cap_b: f64,
    pub conviction_score: f64,
    pub recommendation: Recommendation,
    pub action: String,
    pub risk_level: RiskLevel,
    pub rsi: Option<f64>,
    pub momentum_score: u32,
    pub fundamental_score: f64,
    pub target_30d: f64,
    pub target_90d: f64,
    pub support: f64,
    pub resistance: f64,
    pub stop_loss: f64,
    pub volume_surge: bool,
    pub macd_bullish: bool,
    pub above_200_sma: bool,
    pub golden_cross: bool,
}

impl StockAnalysis {
    /// Percent move from the current price to `target`.
    pub fn upside_pct(&self, target: f64) -> f64 {
        if self.current_price == 0.0 {
            0.0
        } else {
            (target / self.current_price - 1.0) * 100.0
        }
    }
}

/// Score one ticker from its daily bars and fundamentals.
pub fn analyze(
    ticker: &str,
    name: &str,
    series: &BarSeries,
    fundamentals: &Fundamentals,
) -> TradingResult<StockAnalysis> {
    if series.len() < MIN_BARS {
        return Err(IndicatorError::InsufficientData {
            required: MIN_BARS,
            available: series.len(),
        }
        .into());
    }

    let frame = screening_frame(series);
    let insufficient = || IndicatorError::InsufficientData {
        required: MIN_BARS,
        available: series.len(),
    };
    let signals = TechnicalSignals::evaluate(series, &frame).ok_or_else(insufficient)?;
    let targets =
        PriceTargets::compute(series, &frame, TARGET_HORIZON_DAYS).ok_or_else(insufficient)?;

    let fundamental = fundamental_score(fundamentals);
    let conviction = conviction_score(&signals, fundamental);
    let recommendation = Recommendation::from_conviction(conviction);
    let risk_level = RiskLevel::assess(signals.rsi, signals.price, targets.resistance_1);

    Ok(StockAnalysis {
        ticker: ticker.to_string(),
        name: if name.is_empty() {
            fundamentals.name.clone().unwrap_or_else(|| ticker.to_string())
        } else {
            name.to_string()
        },
        sector: fundamentals.sector_or_unknown().to_string(),
        current_price: signals.price,
        market_cap_b: fundamentals.market_cap.map_or(0.0, |c| c / 1e9),
        conviction_score: conviction,
        recommendation,
        action: recommendation.action().to_string(),
        risk_level,
        rsi: signals.rsi,
        momentum_score: signals.momentum_score,
        fundamental_score: fundamental,
        target_30d: targets.target_30d,
        target_90d: targets.target_90d,
        support: targets.support_1,
        resistance: targets.resistance_1,
        stop_loss: targets.stop_loss,
        volume_surge: signals.volume_surge,
        macd_bullish: signals.macd_bullish,
        above_200_sma: signals.above_sma_200,
        golden_cross: signals.golden_cross,
    })
}

/// Highest conviction first.
pub fn sort_by_conviction(rows: &mut [StockAnalysis]) {
    rows.sort_by(|a, b| {
        b.conviction_score
            .partial_cmp(&a.conviction_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Scans a ticker universe against a bar source and a fundamentals source.
pub struct Screener<S, F> {
    source: S,
    fundamentals: F,
    config: ScreenerConfig,
}

impl<S: DataSource, F: FundamentalsSource> Screener<S, F> {
    pub fn new(source: S, fundamentals: F, config: ScreenerConfig) -> Self {
        Self {
            source,
            fundamentals,
            config,
        }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Fetch and score a single ticker with history ending at `end`.
    pub async fn analyze_ticker(
        &self,
        ticker: &str,
        name: &str,
        end: NaiveDate,
    ) -> TradingResult<StockAnalysis> {
        let start = end - Duration::days(self.config.lookback_days);
        let bars = self
            .source
            .get_historical_bars(ticker, Timeframe::Daily, start, end)
            .await?;
        let series = BarSeries::from_bars(ticker, Timeframe::Daily, bars);

        let fundamentals = match self.fundamentals.fundamentals(ticker).await {
            Ok(Some(f)) => f,
            Ok(None) => Fundamentals::empty(ticker),
            Err(e) => {
                warn!(ticker, error = %e, "Fundamentals unavailable");
                Fundamentals::empty(ticker)
            }
        };

        analyze(ticker, name, &series, &fundamentals)
    }

    /// Scan with history ending today.
    pub async fn scan(&self, universe: &[(String, String)]) -> Vec<StockAnalysis> {
        self.scan_as_of(universe, Local::now().date_naive()).await
    }

    /// Score every ticker, skipping failures, sorted by conviction.
    pub async fn scan_as_of(
        &self,
        universe: &[(String, String)],
        end: NaiveDate,
    ) -> Vec<StockAnalysis> {
        info!(
            tickers = universe.len(),
            source = self.source.name(),
            "Scanning universe"
        );

        let outcomes: Vec<_> = stream::iter(universe)
            .map(|(ticker, name)| async move {
                (ticker, self.analyze_ticker(ticker, name, end).await)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut rows = Vec::with_capacity(outcomes.len());
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(row) => {
                    debug!(
                        ticker = %ticker,
                        conviction = row.conviction_score,
                        recommendation = %row.recommendation,
                        "Scored"
                    );
                    rows.push(row);
                }
                Err(e) => warn!(ticker = %ticker, error = %e, "Skipping ticker"),
            }
        }

        sort_by_conviction(&mut rows);
        info!(scored = rows.len(), "Scan complete");
        rows
    }
}
