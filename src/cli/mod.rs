//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trading_core::types::Timeframe;

#[derive(Parser)]
#[command(name = "market-lab")]
#[command(author, version, about = "SPX backtester, stock screener and crypto news sentiment")]
pub struct Cli {
    /// Configuration file path (defaults to config/default.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `trading_backtest=debug,info`
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON log format
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Backtest the configured indicator grid
    Backtest(BacktestArgs),
    /// Search indicator parameters for the best score
    Optimize(BacktestArgs),
    /// Rolling out-of-sample optimization
    WalkForward(BacktestArgs),
    /// Optimize, backtest the winner and write the full report
    Full(BacktestArgs),
    /// Score a stock universe by conviction
    Screen(ScreenArgs),
    /// Crypto news sentiment
    #[command(subcommand)]
    Sentiment(SentimentCommand),
    /// Print the latest indicator values for a symbol
    Indicators(IndicatorArgs),
    /// Validate configuration
    Validate(ValidateArgs),
}

#[derive(clap::Args, Clone)]
pub struct BacktestArgs {
    /// Trading timeframe (defaults to the first configured timeframe)
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Read bars from a CSV file instead of downloading
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write report files to the reports directory
    #[arg(long)]
    pub report: bool,

    /// Ignore cached downloads
    #[arg(long)]
    pub force_download: bool,
}

#[derive(clap::Args)]
pub struct ScreenArgs {
    /// Tickers to scan (comma-separated); the configured universe otherwise
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Fundamentals CSV
    #[arg(long)]
    pub fundamentals: Option<PathBuf>,

    /// Rows printed to the console
    #[arg(long, default_value = "10")]
    pub top: usize,
}

#[derive(Subcommand)]
pub enum SentimentCommand {
    /// Score a single headline
    Analyze(AnalyzeArgs),
    /// Fetch and score the latest headlines
    News(NewsArgs),
    /// Overall market sentiment across all feeds
    Summary(NewsArgs),
    /// Poll the feeds and send high-impact alerts
    Watch(WatchArgs),
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Headline text
    #[arg(required = true, num_args = 1..)]
    pub headline: Vec<String>,

    /// Source credibility weight
    #[arg(long, default_value = "1.0")]
    pub weight: f64,
}

#[derive(clap::Args)]
pub struct NewsArgs {
    /// Only articles from the last N hours
    #[arg(long)]
    pub hours: Option<i64>,

    /// Only headlines containing any of these keywords (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub search: Vec<String>,

    /// Articles printed
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Print alerts instead of sending them to Telegram
    #[arg(long)]
    pub console: bool,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(clap::Args)]
pub struct IndicatorArgs {
    /// Symbol (defaults to the configured symbol)
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Timeframe
    #[arg(short, long, default_value = "1d")]
    pub timeframe: Timeframe,

    /// Bars of history
    #[arg(long, default_value = "250")]
    pub lookback: usize,

    /// Read bars from a CSV file instead of downloading
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Print the effective configuration as TOML
    #[arg(long)]
    pub show: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backtest_flags() {
        let cli = Cli::parse_from([
            "market-lab",
            "backtest",
            "--timeframe",
            "10m",
            "--start-date",
            "2024-01-02",
            "--report",
            "--force-download",
        ]);
        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(args.timeframe, Some(Timeframe::Minute10));
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert!(args.end_date.is_none());
        assert!(args.report && args.force_download);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["market-lab", "validate", "--json-logs", "-l", "debug"]);
        assert!(cli.json_logs);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_sentiment_analyze_joins_words() {
        let cli = Cli::parse_from(["market-lab", "sentiment", "analyze", "Bitcoin", "surges"]);
        let Commands::Sentiment(SentimentCommand::Analyze(args)) = cli.command else {
            panic!("expected sentiment analyze");
        };
        assert_eq!(args.headline.join(" "), "Bitcoin surges");
        assert!((args.weight - 1.0).abs() < 1e-12);
    }
}
