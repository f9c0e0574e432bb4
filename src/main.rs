//! market-lab CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_config;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    // Setup logging; the guard flushes the file writer on exit
    let _guard = setup_logging(&config.logging).context("Failed to initialise logging")?;

    if !matches!(cli.command, Commands::Validate(_)) {
        config.validate().context("Invalid configuration")?;
    }

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config).await,
        Commands::Optimize(args) => cli::commands::optimize::run(args, &config).await,
        Commands::WalkForward(args) => cli::commands::walk_forward::run(args, &config).await,
        Commands::Full(args) => cli::commands::full::run(args, &config).await,
        Commands::Screen(args) => cli::commands::screen::run(args, &config).await,
        Commands::Sentiment(command) => cli::commands::sentiment::run(command, &config).await,
        Commands::Indicators(args) => cli::commands::indicators::run(args, &config).await,
        Commands::Validate(args) => cli::commands::validate::run(args, &config).await,
    }
}
