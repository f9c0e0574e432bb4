//! Validate configuration command.

use anyhow::Result;
use trading_config::{to_toml, AppConfig};

use crate::cli::ValidateArgs;

pub async fn run(args: ValidateArgs, config: &AppConfig) -> Result<()> {
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    let t = &config.trading;
    println!("Symbol: {}", t.symbol);
    let timeframes: Vec<String> = t.timeframes.iter().map(|tf| tf.to_string()).collect();
    println!("Timeframes: {}", timeframes.join(", "));
    println!("Period: {} to {}", t.start_date, t.end_date);
    println!("Initial capital: {}", t.initial_capital);
    println!("Commission: {}  Slippage: {}", t.commission, t.slippage);
    println!("Indicators: {}", config.indicators.describe());
    println!(
        "Parameter combinations: {}",
        config.indicators.combinations().len()
    );
    println!(
        "Optimization metric: {} (min trades {})",
        config.backtest.optimization_metric, config.backtest.min_trades
    );
    println!("Screener universe: {} tickers", config.screener.universe().len());
    println!("News sources: {}", config.sentiment.sources.len());
    println!("Log level: {}", config.logging.level);

    if args.show {
        println!();
        println!("{}", to_toml(config)?);
    }
    Ok(())
}
