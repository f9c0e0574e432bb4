//! Stock screener command.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};
use trading_config::AppConfig;
use trading_data::{CsvFundamentals, YahooClient};
use trading_screener::{markdown_report, write_csv, Screener, StockAnalysis, DEFAULT_UNIVERSE};

use crate::cli::ScreenArgs;

pub async fn run(args: ScreenArgs, config: &AppConfig) -> Result<()> {
    let universe = universe(&args, config);
    let fundamentals = load_fundamentals(
        args.fundamentals
            .as_ref()
            .or(config.screener.fundamentals_file.as_ref()),
    )?;

    let client = YahooClient::new().context("Failed to create market data client")?;
    let screener = Screener::new(client, fundamentals, config.screener.screener_config());
    let results = screener.scan(&universe).await;
    if results.is_empty() {
        anyhow::bail!("No ticker in the universe could be analyzed");
    }

    print_table(&results, args.top);

    let today = Local::now().date_naive();
    let dir = &config.screener.output_dir;
    let csv_path = dir.join(format!("stock_analysis_{}.csv", today.format("%Y%m%d")));
    write_csv(&csv_path, &results).context("Failed to write screen CSV")?;

    let md_path = dir.join(format!("stock_report_{}.md", today.format("%Y%m%d")));
    let markdown = markdown_report(&results, config.screener.high_conviction, today);
    std::fs::write(&md_path, markdown)
        .with_context(|| format!("Failed to write {}", md_path.display()))?;

    info!(
        analyzed = results.len(),
        csv = %csv_path.display(),
        report = %md_path.display(),
        "Screen complete"
    );
    Ok(())
}

/// Tickers from `--tickers`, named from the configured or built-in universe
/// where known.
fn universe(args: &ScreenArgs, config: &AppConfig) -> Vec<(String, String)> {
    let configured = config.screener.universe();
    if args.tickers.is_empty() {
        return configured;
    }
    args.tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .map(|ticker| {
            let name = configured
                .iter()
                .find(|(t, _)| *t == ticker)
                .map(|(_, n)| n.clone())
                .or_else(|| {
                    DEFAULT_UNIVERSE
                        .iter()
                        .find(|(t, _)| *t == ticker)
                        .map(|(_, n)| n.to_string())
                })
                .unwrap_or_default();
            (ticker, name)
        })
        .collect()
}

fn load_fundamentals(path: Option<&PathBuf>) -> Result<CsvFundamentals> {
    match path {
        Some(path) if path.exists() => {
            let table = CsvFundamentals::load(path)
                .with_context(|| format!("Failed to load fundamentals from {}", path.display()))?;
            info!(tickers = table.len(), path = %path.display(), "Loaded fundamentals");
            Ok(table)
        }
        Some(path) => {
            warn!(path = %path.display(), "Fundamentals file not found, scoring technicals only");
            Ok(CsvFundamentals::from_rows(Vec::new()))
        }
        None => Ok(CsvFundamentals::from_rows(Vec::new())),
    }
}

fn print_table(results: &[StockAnalysis], top: usize) {
    println!("{}", "=".repeat(100));
    println!(
        "{:<6} {:<24} {:>10} {:>10} {:<11} {:>7} {:>10} {:>10}",
        "Ticker", "Name", "Price", "Conviction", "Rec", "RSI", "30d Target", "Upside"
    );
    println!("{}", "-".repeat(100));
    for r in results.iter().take(top) {
        let rsi = r.rsi.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into());
        println!(
            "{:<6} {:<24} {:>10.2} {:>10.1} {:<11} {:>7} {:>10.2} {:>9.1}%",
            r.ticker,
            truncate(&r.name, 24),
            r.current_price,
            r.conviction_score,
            r.recommendation.label(),
            rsi,
            r.target_30d,
            r.upside_pct(r.target_30d)
        );
    }
    println!("{}", "=".repeat(100));
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_tickers_are_named() {
        let args = ScreenArgs {
            tickers: vec!["nvda".into(), " zzzz ".into(), "".into()],
            fundamentals: None,
            top: 10,
        };
        let universe = universe(&args, &AppConfig::default());
        assert_eq!(
            universe,
            vec![
                ("NVDA".to_string(), "Nvidia Corp".to_string()),
                ("ZZZZ".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_missing_fundamentals_file_is_empty() {
        let table = load_fundamentals(Some(&PathBuf::from("/nonexistent/f.csv"))).unwrap();
        assert!(table.is_empty());
    }
}
