//! Indicator parameter optimization.
//!
//! Grid search over [`IndicatorParams::combinations`], run in parallel with
//! rayon. Each candidate is backtested and scored by one metric; runs that
//! trade too little or draw down too far are penalised.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use trading_core::error::TradingError;
use trading_core::types::BarSeries;
use trading_indicators::{IndicatorKind, IndicatorParams};

use crate::report::format_time;
use crate::{BacktestEngine, PerformanceMetrics};

/// Indicator sets tried together by [`Optimizer::find_best`].
pub const COMBINATIONS: &[&[IndicatorKind]] = &[
    &[IndicatorKind::Rsi, IndicatorKind::Macd],
    &[IndicatorKind::Rsi, IndicatorKind::Bollinger],
    &[IndicatorKind::Macd, IndicatorKind::Ema],
    &[IndicatorKind::Rsi, IndicatorKind::Macd, IndicatorKind::Bollinger],
    &[IndicatorKind::Ema, IndicatorKind::Bollinger, IndicatorKind::Atr],
    &[IndicatorKind::Rsi, IndicatorKind::Macd, IndicatorKind::Ema, IndicatorKind::Atr],
];

const TOO_FEW_TRADES_FACTOR: f64 = 0.5;
const DEEP_DRAWDOWN_FACTOR: f64 = 0.7;

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Metric to maximise, by its `PerformanceMetrics` field name
    pub metric: String,
    /// Runs with fewer trades are penalised
    pub min_trades: usize,
    /// Runs drawing down more than this fraction are penalised
    pub drawdown_penalty_threshold: f64,
    /// Upper bound on walk-forward windows
    pub max_windows: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            metric: "sharpe_ratio".to_string(),
            min_trades: 100,
            drawdown_penalty_threshold: 0.30,
            max_windows: 12,
        }
    }
}

/// One scored backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub params: IndicatorParams,
    pub metrics: PerformanceMetrics,
    pub score: f64,
    pub trades: usize,
}

/// Outcome of [`Optimizer::find_best`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSummary {
    pub optimization_metric: String,
    pub best_indicator_set: String,
    pub best_params: IndicatorParams,
    pub best_score: f64,
    pub best_metrics: PerformanceMetrics,
    /// Best result per indicator set, keyed like `RSI+MACD`
    pub all_results: BTreeMap<String, OptimizationResult>,
}

impl SearchSummary {
    /// Text report of the winning parameters and every set's best score.
    pub fn report(&self) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let mut lines = vec![
            rule.clone(),
            "PARAMETER OPTIMIZATION REPORT".to_string(),
            rule.clone(),
            format!("Optimization Metric: {}", self.optimization_metric),
            format!("Best Indicator Set: {}", self.best_indicator_set),
            format!("Best Score: {:.4}", self.best_score),
            String::new(),
            "BEST PARAMETERS:".to_string(),
            thin.clone(),
            self.best_params.describe(),
            String::new(),
            "RESULTS BY INDICATOR SET:".to_string(),
            thin,
        ];
        let mut ranked: Vec<_> = self.all_results.iter().collect();
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        for (name, r) in ranked {
            lines.push(format!(
                "{:<24} score {:>9.4}  trades {:>5}  win rate {:>6.2}%  return {:>7.2}%",
                name,
                r.score,
                r.trades,
                r.metrics.win_rate * 100.0,
                r.metrics.total_return * 100.0
            ));
        }
        lines.push(rule);
        lines.join("\n")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TradingError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "Optimization results saved");
        Ok(())
    }
}

/// One train/test step of a walk-forward run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub window: usize,
    pub train_period: String,
    pub test_period: String,
    pub best_indicator_set: String,
    pub best_params: IndicatorParams,
    pub train_score: f64,
    pub test_score: f64,
    pub test_metrics: PerformanceMetrics,
}

/// In-sample search followed by one out-of-sample run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestResult {
    pub train_bars: usize,
    pub test_bars: usize,
    pub train: SearchSummary,
    pub test: OptimizationResult,
}

fn period(series: &BarSeries) -> String {
    match (series.first(), series.last()) {
        (Some(a), Some(b)) => format!("{} to {}", format_time(a.timestamp), format_time(b.timestamp)),
        _ => String::new(),
    }
}

fn set_name(kinds: &[IndicatorKind]) -> String {
    kinds
        .iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join("+")
}

/// Scale `score` by `factor` (< 1) in the direction that makes it worse.
fn penalize(score: f64, factor: f64) -> f64 {
    if score >= 0.0 {
        score * factor
    } else {
        score / factor
    }
}

/// Grid-search optimizer.
#[derive(Debug, Clone)]
pub struct Optimizer {
    engine: BacktestEngine,
    grid: IndicatorParams,
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(
        engine: BacktestEngine,
        grid: IndicatorParams,
        config: OptimizerConfig,
    ) -> Result<Self, TradingError> {
        if PerformanceMetrics::empty(Default::default())
            .get(&config.metric)
            .is_none()
        {
            return Err(TradingError::Config(format!(
                "unknown optimization metric '{}'",
                config.metric
            )));
        }
        grid.validate()?;
        Ok(Self {
            engine,
            grid,
            config,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn grid(&self) -> &IndicatorParams {
        &self.grid
    }

    /// Metric value with penalties applied.
    pub fn score(&self, metrics: &PerformanceMetrics) -> f64 {
        let mut score = self.raw_score(metrics);
        if metrics.total_trades < self.config.min_trades {
            score = penalize(score, TOO_FEW_TRADES_FACTOR);
        }
        if metrics.max_drawdown > self.config.drawdown_penalty_threshold {
            score = penalize(score, DEEP_DRAWDOWN_FACTOR);
        }
        score
    }

    fn raw_score(&self, metrics: &PerformanceMetrics) -> f64 {
        metrics
            .get(&self.config.metric)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Backtest one parameter set; failures are logged and dropped.
    pub fn evaluate(&self, series: &BarSeries, params: &IndicatorParams) -> Option<OptimizationResult> {
        match self.engine.run(series, params) {
            Ok(result) => Some(OptimizationResult {
                params: params.clone(),
                score: self.score(&result.metrics),
                trades: result.trades.len(),
                metrics: result.metrics,
            }),
            Err(e) => {
                tracing::warn!(params = %params.describe(), error = %e, "Backtest failed");
                None
            }
        }
    }

    /// Best single-valued parameter set drawn from `grid`.
    pub fn search(&self, series: &BarSeries, grid: &IndicatorParams) -> Option<OptimizationResult> {
        let candidates = grid.combinations();
        tracing::info!(
            combinations = candidates.len(),
            indicators = %grid.describe(),
            "Testing parameter combinations"
        );
        candidates
            .par_iter()
            .filter_map(|params| self.evaluate(series, params))
            .collect::<Vec<_>>()
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }

    /// Optimize one indicator on its own.
    pub fn optimize_single(&self, series: &BarSeries, kind: IndicatorKind) -> Option<OptimizationResult> {
        if !kind.produces_signals() {
            tracing::debug!(indicator = %kind, "Indicator produces no entries on its own, skipping");
            return None;
        }
        if !self.grid.has(kind) {
            return None;
        }
        tracing::info!(indicator = %kind, "Optimizing single indicator");
        self.search(series, &self.grid.subset(&[kind]))
    }

    /// Optimize several indicators together.
    pub fn optimize_combination(
        &self,
        series: &BarSeries,
        kinds: &[IndicatorKind],
    ) -> Option<OptimizationResult> {
        tracing::info!(combination = %set_name(kinds), "Optimizing combination");
        self.search(series, &self.grid.subset(kinds))
    }

    /// Try every indicator alone, then the predefined combinations, and
    /// keep the best-scoring set.
    pub fn find_best(&self, series: &BarSeries) -> Option<SearchSummary> {
        let mut all_results = BTreeMap::new();

        for kind in self.grid.available_kinds() {
            if let Some(result) = self.optimize_single(series, kind) {
                all_results.insert(kind.label().to_string(), result);
            }
        }

        for combo in COMBINATIONS {
            let available: Vec<IndicatorKind> =
                combo.iter().copied().filter(|k| self.grid.has(*k)).collect();
            if available.len() < 2 {
                continue;
            }
            let name = set_name(&available);
            if all_results.contains_key(&name) {
                continue;
            }
            if let Some(result) = self.optimize_combination(series, &available) {
                all_results.insert(name, result);
            }
        }

        let (best_name, best) = all_results
            .iter()
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(name, r)| (name.clone(), r.clone()))?;

        tracing::info!(best = %best_name, score = best.score, "Optimization complete");
        Some(SearchSummary {
            optimization_metric: self.config.metric.clone(),
            best_indicator_set: best_name,
            best_params: best.params,
            best_score: best.score,
            best_metrics: best.metrics,
            all_results,
        })
    }

    /// Rolling optimization: search on `window_size` bars, test the winner
    /// on the following `test_size` bars, then roll forward by `test_size`.
    pub fn walk_forward(
        &self,
        series: &BarSeries,
        window_size: usize,
        test_size: usize,
    ) -> Vec<WalkForwardWindow> {
        if test_size == 0 || series.len() <= window_size {
            return Vec::new();
        }
        let num_windows = ((series.len() - window_size) / test_size).min(self.config.max_windows);
        tracing::info!(windows = num_windows, "Performing walk-forward optimization");

        let mut results = Vec::new();
        for i in 0..num_windows {
            let train_start = i * test_size;
            let train_end = train_start + window_size;
            let test_end = (train_end + test_size).min(series.len());
            let train = series.slice(train_start..train_end);
            let test = series.slice(train_end..test_end);

            let Some(summary) = self.find_best(&train) else {
                tracing::warn!(window = i + 1, "No result on training window");
                continue;
            };
            let Some(test_result) = self.evaluate(&test, &summary.best_params) else {
                continue;
            };
            results.push(WalkForwardWindow {
                window: i + 1,
                train_period: period(&train),
                test_period: period(&test),
                best_indicator_set: summary.best_indicator_set,
                best_params: summary.best_params,
                train_score: summary.best_score,
                test_score: self.raw_score(&test_result.metrics),
                test_metrics: test_result.metrics,
            });
        }
        results
    }

    /// Search on the first `split` fraction of bars, test on the rest.
    pub fn train_test_validate(&self, series: &BarSeries, split: f64) -> Option<TrainTestResult> {
        let cut = (series.len() as f64 * split.clamp(0.0, 1.0)) as usize;
        if cut < 2 || series.len() - cut < 2 {
            tracing::warn!(bars = series.len(), split, "Not enough data for a train/test split");
            return None;
        }
        let train = series.slice(0..cut);
        let test = series.slice(cut..series.len());

        let summary = self.find_best(&train)?;
        let test_result = self.evaluate(&test, &summary.best_params)?;
        tracing::info!(
            train_score = summary.best_score,
            test_score = test_result.score,
            "Train/test validation complete"
        );
        Some(TrainTestResult {
            train_bars: train.len(),
            test_bars: test.len(),
            train: summary,
            test: test_result,
        })
    }
}

/// Save walk-forward windows as pretty JSON.
pub fn save_walk_forward(windows: &[WalkForwardWindow], path: impl AsRef<Path>) -> Result<(), TradingError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(windows)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BacktestConfig;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use trading_core::types::{Bar, Timeframe};
    use trading_indicators::{MacdParams, RsiParams};

    fn series(n: usize) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.2).sin() * 6.0 + (i as f64 * 0.05).cos() * 3.0;
                Bar::new(start + i as i64 * 86_400_000, c, c + 1.0, c - 1.0, c, 1000.0)
            })
            .collect();
        BarSeries::from_bars("SPX", Timeframe::Daily, bars)
    }

    fn small_grid() -> IndicatorParams {
        IndicatorParams {
            rsi: Some(RsiParams {
                periods: vec![9, 14],
                oversold: vec![30.0],
                overbought: vec![70.0],
            }),
            macd: Some(MacdParams {
                fast: vec![12],
                slow: vec![26],
                signal: vec![9],
            }),
            ..IndicatorParams::empty()
        }
    }

    fn optimizer(min_trades: usize) -> Optimizer {
        let engine = BacktestEngine::new(BacktestConfig {
            min_confirmations: 1,
            ..BacktestConfig::default()
        });
        Optimizer::new(
            engine,
            small_grid(),
            OptimizerConfig {
                min_trades,
                ..OptimizerConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_penalties_always_worsen() {
        let opt = optimizer(100);
        let mut m = PerformanceMetrics::empty(dec!(100000));
        m.sharpe_ratio = 1.2;
        m.total_trades = 10;
        assert!((opt.score(&m) - 0.6).abs() < 1e-10);

        m.sharpe_ratio = -1.0;
        assert!((opt.score(&m) + 2.0).abs() < 1e-10);

        m.total_trades = 150;
        m.max_drawdown = 0.35;
        m.sharpe_ratio = 1.0;
        assert!((opt.score(&m) - 0.7).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let config = OptimizerConfig {
            metric: "luck".to_string(),
            ..OptimizerConfig::default()
        };
        assert!(Optimizer::new(BacktestEngine::default(), small_grid(), config).is_err());
    }

    #[test]
    fn test_find_best_covers_singles_and_combinations() {
        let opt = optimizer(1);
        let summary = opt.find_best(&series(260)).unwrap();

        // RSI, MACD and RSI+MACD; larger combinations collapse to RSI+MACD
        assert_eq!(summary.all_results.len(), 3);
        assert!(summary.all_results.contains_key("RSI+MACD"));
        let best = summary
            .all_results
            .values()
            .map(|r| r.score)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((summary.best_score - best).abs() < 1e-12);
        assert!(summary.report().contains("PARAMETER OPTIMIZATION REPORT"));
    }

    #[test]
    fn test_single_atr_is_skipped() {
        let opt = optimizer(1);
        assert!(opt.optimize_single(&series(100), IndicatorKind::Atr).is_none());
        assert!(opt.optimize_single(&series(100), IndicatorKind::Ema).is_none());
    }

    #[test]
    fn test_walk_forward_window_count() {
        let opt = optimizer(1);
        let windows = opt.walk_forward(&series(400), 200, 100);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].window, 1);
        assert!(opt.walk_forward(&series(150), 200, 100).is_empty());
    }

    #[test]
    fn test_train_test_split() {
        let opt = optimizer(1);
        let result = opt.train_test_validate(&series(300), 0.8).unwrap();
        assert_eq!(result.train_bars, 240);
        assert_eq!(result.test_bars, 60);
    }

    #[test]
    fn test_save_summary() {
        let opt = optimizer(1);
        let summary = opt.find_best(&series(200)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/optimization_results.json");
        summary.save(&path).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\"optimization_metric\": \"sharpe_ratio\""));
    }
}
