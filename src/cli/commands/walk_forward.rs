//! Walk-forward analysis command.

use anyhow::{Context, Result};
use tracing::info;
use trading_backtest::save_walk_forward;
use trading_config::AppConfig;

use super::backtest::{load_series, reports_path};
use super::optimize::build_optimizer;
use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let series = load_series(&args, config).await?;
    let optimizer = build_optimizer(config)?;
    let settings = &config.backtest;

    let windows = optimizer.walk_forward(&series, settings.window_size, settings.test_size);
    if windows.is_empty() {
        anyhow::bail!(
            "Walk-forward analysis produced no windows ({} bars, window {}, test {})",
            series.len(),
            settings.window_size,
            settings.test_size
        );
    }

    println!("{}", "=".repeat(80));
    println!("WALK-FORWARD ANALYSIS");
    println!("{}", "=".repeat(80));
    for w in &windows {
        println!(
            "Window {:>2}: {:<22} train {:>8.4}  test {:>8.4}  ({} trades)",
            w.window,
            w.best_indicator_set,
            w.train_score,
            w.test_score,
            w.test_metrics.total_trades
        );
        println!("           train {}", w.train_period);
        println!("           test  {}", w.test_period);
    }
    let avg_test = windows.iter().map(|w| w.test_score).sum::<f64>() / windows.len() as f64;
    println!("\nAverage out-of-sample score: {:.4}", avg_test);
    info!(windows = windows.len(), avg_test, "Walk-forward analysis complete");

    let path = reports_path(config, "walk_forward_results.json");
    save_walk_forward(&windows, &path).context("Failed to save walk-forward results")?;
    info!(path = %path.display(), "Walk-forward results saved");
    Ok(())
}
