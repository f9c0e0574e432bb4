//! Backtest command implementation.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};
use trading_backtest::{BacktestEngine, BacktestReport};
use trading_config::AppConfig;
use trading_core::types::{BarSeries, Timeframe};
use trading_data::{clean_bars, CsvDataSource, MarketData, YahooClient};
use trading_indicators::IndicatorParams;

use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let series = load_series(&args, config).await?;
    let report = backtest(&series, &config.indicators, config)?;

    println!("{}", report.summary());
    println!("{}", report.ascii_chart(70, 20));

    if args.report {
        let stem = report_stem(&config.trading.symbol, "Backtest", series.timeframe);
        let saved = report
            .save(&config.trading.reports_dir, &stem)
            .context("Failed to write backtest report")?;
        println!("Report saved to {}", saved.summary.display());
    }
    Ok(())
}

/// Timeframe from the flag, else the first configured one.
pub(crate) fn timeframe(args: &BacktestArgs, config: &AppConfig) -> Timeframe {
    args.timeframe
        .or_else(|| config.trading.timeframes.first().copied())
        .unwrap_or(Timeframe::Minute5)
}

/// Bars for the configured symbol, from `--csv` or the download cache.
pub(crate) async fn load_series(args: &BacktestArgs, config: &AppConfig) -> Result<BarSeries> {
    let symbol = config.trading.symbol.as_str();
    let timeframe = timeframe(args, config);
    let start = args.start_date.unwrap_or(config.trading.start_date);
    let end = args.end_date.unwrap_or(config.trading.end_date);
    if start >= end {
        anyhow::bail!("start date {} must be before end date {}", start, end);
    }

    let series = match &args.csv {
        Some(path) => {
            let source = CsvDataSource::new(path.clone())
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let bars: Vec<_> = clean_bars(source.load_all()?)
                .into_iter()
                .filter(|b| {
                    let date = b.datetime().date();
                    date >= start && date <= end
                })
                .collect();
            BarSeries::from_bars(symbol, timeframe, bars)
        }
        None => {
            if args.timeframe.is_none() && config.trading.timeframes.len() > 1 {
                info!(%timeframe, "Using the first configured timeframe");
            }
            let client = YahooClient::new().context("Failed to create market data client")?;
            let mut market = MarketData::new(client, &config.trading.data_dir);
            market
                .fetch(symbol, timeframe, start, end, args.force_download)
                .await
                .with_context(|| format!("Failed to load {} {} bars", symbol, timeframe))?
        }
    };

    if series.is_empty() {
        anyhow::bail!("No {} bars for {} between {} and {}", timeframe, symbol, start, end);
    }
    if series.timeframe.is_intraday() && series.span_days() < 1 {
        warn!(bars = series.len(), "Less than one day of data");
    }
    info!(symbol, %timeframe, bars = series.len(), "Loaded data");
    Ok(series)
}

/// Run one backtest with the configured costs and risk rules.
pub(crate) fn backtest(
    series: &BarSeries,
    params: &IndicatorParams,
    config: &AppConfig,
) -> Result<BacktestReport> {
    let engine = BacktestEngine::new(config.backtest_config());
    let result = engine
        .run(series, params)
        .with_context(|| format!("Backtest failed for {}", params.describe()))?;
    info!(
        trades = result.trades.len(),
        final_equity = %result.final_equity(),
        halted = result.halted,
        "Backtest complete"
    );
    Ok(BacktestReport::new(engine.config().clone(), result))
}

/// File stem like `GSPC_Optimized_5m_20250730_153000`.
pub(crate) fn report_stem(symbol: &str, label: &str, timeframe: Timeframe) -> String {
    let clean: String = symbol.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!(
        "{}_{}_{}_{}",
        clean,
        label,
        timeframe,
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

pub(crate) fn reports_path(config: &AppConfig, file: &str) -> PathBuf {
    config.trading.reports_dir.join(file)
}
