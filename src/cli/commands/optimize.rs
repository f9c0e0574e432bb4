//! Parameter optimization command.

use anyhow::{Context, Result};
use tracing::info;
use trading_backtest::{BacktestEngine, Optimizer, SearchSummary};
use trading_config::AppConfig;
use trading_core::types::BarSeries;

use super::backtest::{backtest, load_series, report_stem, reports_path};
use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let series = load_series(&args, config).await?;
    let summary = optimize(&series, config)?;

    let path = reports_path(config, "optimization_results.json");
    summary
        .save(&path)
        .context("Failed to save optimization results")?;
    println!("{}", summary.report());

    if args.report {
        info!("Running backtest with optimal parameters");
        let report = backtest(&series, &summary.best_params, config)?;
        println!("{}", report.summary());
        let stem = report_stem(&config.trading.symbol, "Optimized", series.timeframe);
        report
            .save(&config.trading.reports_dir, &stem)
            .context("Failed to write optimized backtest report")?;
    }
    Ok(())
}

pub(crate) fn build_optimizer(config: &AppConfig) -> Result<Optimizer> {
    Optimizer::new(
        BacktestEngine::new(config.backtest_config()),
        config.indicators.clone(),
        config.optimizer_config(),
    )
    .context("Invalid optimizer settings")
}

/// Best indicator set over the whole series.
pub(crate) fn optimize(series: &BarSeries, config: &AppConfig) -> Result<SearchSummary> {
    let optimizer = build_optimizer(config)?;
    let summary = optimizer
        .find_best(series)
        .context("Optimization failed: no valid results")?;
    info!(
        best = %summary.best_indicator_set,
        score = summary.best_score,
        "Optimization complete"
    );
    Ok(summary)
}
