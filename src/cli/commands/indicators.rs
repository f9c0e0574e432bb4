//! Latest indicator values for one symbol.

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use trading_config::AppConfig;
use trading_core::types::BarSeries;
use trading_data::{clean_bars, CsvDataSource, MarketData, YahooClient};
use trading_indicators::IndicatorFrame;

use crate::cli::IndicatorArgs;

pub async fn run(args: IndicatorArgs, config: &AppConfig) -> Result<()> {
    let symbol = args
        .symbol
        .clone()
        .unwrap_or_else(|| config.trading.symbol.clone());
    let series = load(&args, &symbol, config).await?;
    let Some(last) = series.last() else {
        anyhow::bail!("No bars for {}", symbol);
    };

    let frame = IndicatorFrame::compute(&series, &config.indicators).with_overview(&series);

    println!("{} {} as of {}", symbol, series.timeframe, last.datetime());
    println!(
        "  O {:.2}  H {:.2}  L {:.2}  C {:.2}  V {:.0}",
        last.open, last.high, last.low, last.close, last.volume
    );
    println!("{}", "-".repeat(40));

    let mut names: Vec<&str> = frame.column_names().collect();
    names.sort_unstable();
    for name in names {
        match frame.latest(name) {
            Some(v) => println!("  {:<24} {:>12.4}", name, v),
            None => println!("  {:<24} {:>12}", name, "-"),
        }
    }
    Ok(())
}

async fn load(args: &IndicatorArgs, symbol: &str, config: &AppConfig) -> Result<BarSeries> {
    if let Some(path) = &args.csv {
        let source = CsvDataSource::new(path.clone())
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let bars = clean_bars(source.load_all()?);
        return Ok(BarSeries::from_bars(symbol, args.timeframe, bars).tail(args.lookback));
    }

    let client = YahooClient::new().context("Failed to create market data client")?;
    let mut market = MarketData::new(client, &config.trading.data_dir);
    let series = if args.timeframe.is_intraday() {
        market.latest(symbol, args.timeframe, args.lookback).await
    } else {
        // calendar days covering `lookback` sessions
        let end = Local::now().date_naive();
        let start = end - Duration::days(args.lookback as i64 * 7 / 5 + 10);
        market
            .fetch(symbol, args.timeframe, start, end, true)
            .await
            .map(|s| s.tail(args.lookback))
    };
    series.with_context(|| format!("Failed to load {} {} bars", symbol, args.timeframe))
}
