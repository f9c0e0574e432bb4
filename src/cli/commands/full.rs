//! Full pipeline: optimize, backtest the winner, validate out of sample and
//! write every report.

use anyhow::{Context, Result};
use tracing::{info, warn};
use trading_config::AppConfig;

use super::backtest::{backtest, load_series, report_stem};
use super::optimize::{build_optimizer, optimize};
use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    info!("Running full analysis pipeline");
    let series = load_series(&args, config).await?;

    let summary = optimize(&series, config)?;
    println!("{}", summary.report());

    info!("Testing optimal parameters");
    let report = backtest(&series, &summary.best_params, config)?;
    println!("{}", report.summary());
    println!("{}", report.ascii_chart(70, 20));

    let stem = report_stem(&config.trading.symbol, "Full_Analysis", series.timeframe);
    let dir = &config.trading.reports_dir;
    let saved = report
        .save(dir, &stem)
        .context("Failed to write backtest report")?;
    summary
        .save(dir.join(format!("{}_optimization.json", stem)))
        .context("Failed to save optimization results")?;

    let optimizer = build_optimizer(config)?;
    match optimizer.train_test_validate(&series, config.backtest.train_test_split) {
        Some(validation) => {
            println!(
                "Train/test validation: {} train bars score {:.4}, {} test bars score {:.4} ({} trades)",
                validation.train_bars,
                validation.train.best_score,
                validation.test_bars,
                validation.test.score,
                validation.test.trades
            );
            let path = dir.join(format!("{}_train_test.json", stem));
            std::fs::write(&path, serde_json::to_string_pretty(&validation)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => warn!("Train/test validation produced no result"),
    }

    info!(summary = %saved.summary.display(), "Full analysis complete");
    Ok(())
}
