//! Backtest report generation.

use chrono::{DateTime, NaiveDate};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use trading_core::error::TradingError;
use trading_core::types::ExitReason;

use crate::{BacktestConfig, BacktestResult};

const RULE: &str = "============================================================";

/// Closed trades grouped by exit reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub reason: ExitReason,
    pub count: usize,
    pub total_pnl: Decimal,
}

#[derive(Debug, Serialize)]
struct TradeRow {
    entry_time: String,
    exit_time: String,
    direction: String,
    entry_price: Decimal,
    exit_price: Decimal,
    size: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
    commission: Decimal,
    pnl: Decimal,
    return_pct: f64,
    exit_reason: String,
    duration_minutes: i64,
}

#[derive(Debug, Serialize)]
struct SignalRow {
    timestamp: String,
    direction: String,
    strength: u32,
    stop_distance: f64,
    take_profit_distance: f64,
}

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    pub result: BacktestResult,
}

/// Files written by [`BacktestReport::save`].
#[derive(Debug, Clone)]
pub struct SavedReport {
    pub summary: PathBuf,
    pub json: PathBuf,
    pub equity_csv: PathBuf,
    pub trades_csv: PathBuf,
    pub signals_csv: PathBuf,
}

pub(crate) fn format_time(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn check(met: bool) -> &'static str {
    if met {
        "✓"
    } else {
        "✗"
    }
}

/// `1234567.891` as `1,234,567.89`.
pub fn format_money(value: f64) -> String {
    let s = format!("{:.2}", value.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

impl BacktestReport {
    pub fn new(config: BacktestConfig, result: BacktestResult) -> Self {
        Self { config, result }
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let m = &self.result.metrics;
        let money = |d: Decimal| format_money(d.to_f64().unwrap_or_default());
        let mut s = String::new();

        s.push_str(RULE);
        s.push('\n');
        s.push_str("BACKTEST SUMMARY\n");
        s.push_str(RULE);
        s.push('\n');
        s.push_str(&format!(
            "  Symbol: {}  Timeframe: {}  Bars: {}\n",
            self.result.symbol, self.result.timeframe, self.result.bars_processed
        ));
        if let (Some(first), Some(last)) = (self.result.equity_curve.first(), self.result.equity_curve.last()) {
            s.push_str(&format!(
                "  Period: {} to {}\n",
                format_time(first.timestamp),
                format_time(last.timestamp)
            ));
        }

        s.push_str("\nTrade Statistics:\n");
        s.push_str(&format!("  Total Trades: {}\n", m.total_trades));
        s.push_str(&format!("  Winning Trades: {}\n", m.winning_trades));
        s.push_str(&format!("  Losing Trades: {}\n", m.losing_trades));
        s.push_str(&format!("  Win Rate: {}\n", pct(m.win_rate)));
        s.push_str(&format!(
            "  Avg Win: ${}  Avg Loss: ${}\n",
            money(m.avg_win),
            money(m.avg_loss)
        ));
        s.push_str(&format!(
            "  Max Win Streak: {}  Max Loss Streak: {}\n",
            m.max_win_streak, m.max_loss_streak
        ));
        match m.avg_trade_duration_minutes {
            Some(minutes) => s.push_str(&format!("  Avg Trade Duration: {:.0} min\n", minutes)),
            None => s.push_str("  Avg Trade Duration: N/A\n"),
        }

        s.push_str("\nReturns:\n");
        s.push_str(&format!("  Total P&L: ${}\n", money(m.total_pnl)));
        s.push_str(&format!("  Total Return: {}\n", pct(m.total_return)));
        s.push_str(&format!("  Annual Return: {}\n", pct(m.annual_return)));
        s.push_str(&format!(
            "  Expected Value per Trade: ${} ({})\n",
            money(m.expected_value),
            pct(m.expected_value_pct)
        ));
        s.push_str(&format!("  Final Equity: ${}\n", money(m.final_equity)));

        s.push_str("\nRisk Metrics:\n");
        s.push_str(&format!("  Sharpe Ratio: {:.2}\n", m.sharpe_ratio));
        s.push_str(&format!("  Sortino Ratio: {:.2}\n", m.sortino_ratio));
        s.push_str(&format!("  Profit Factor: {:.2}\n", m.profit_factor));
        s.push_str(&format!("  Max Drawdown: {}\n", pct(m.max_drawdown)));
        s.push_str(&format!("  Calmar Ratio: {:.2}\n", m.calmar_ratio));
        s.push_str(&format!("  Recovery Factor: {:.2}\n", m.recovery_factor));
        s.push_str(&format!("  Avg Risk per Trade: {}\n", pct(m.avg_risk_per_trade)));
        if self.result.halted {
            s.push_str("  Drawdown limit reached: new entries were halted\n");
        }

        let t = &m.targets;
        s.push_str("\nPerformance Targets:\n");
        s.push_str(&format!("  Win Rate Target Met: {}\n", check(t.win_rate)));
        s.push_str(&format!("  Profit Factor Target Met: {}\n", check(t.profit_factor)));
        s.push_str(&format!("  Sharpe Ratio Target Met: {}\n", check(t.sharpe_ratio)));
        s.push_str(&format!("  Annual Return Target Met: {}\n", check(t.annual_return)));
        s.push_str(&format!("  Max Drawdown Target Met: {}\n", check(t.max_drawdown)));

        let breakdown = self.exit_breakdown();
        if !breakdown.is_empty() {
            s.push_str("\nExit Reasons:\n");
            for row in &breakdown {
                s.push_str(&format!(
                    "  {:<16} {:>5}  ${}\n",
                    row.reason.to_string(),
                    row.count,
                    money(row.total_pnl)
                ));
            }
        }

        s.push('\n');
        s.push_str(RULE);
        s.push('\n');
        s
    }

    /// Trade count and P&L per exit reason, in a fixed reason order.
    pub fn exit_breakdown(&self) -> Vec<ExitBreakdown> {
        ExitReason::all()
            .iter()
            .filter_map(|reason| {
                let trades: Vec<_> = self
                    .result
                    .trades
                    .iter()
                    .filter(|t| t.exit_reason == *reason)
                    .collect();
                if trades.is_empty() {
                    return None;
                }
                Some(ExitBreakdown {
                    reason: *reason,
                    count: trades.len(),
                    total_pnl: trades.iter().map(|t| t.pnl).sum(),
                })
            })
            .collect()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for point in &self.result.equity_curve {
            csv.push_str(&format!("{},{}\n", format_time(point.timestamp), point.equity));
        }
        csv
    }

    /// One row per closed trade.
    pub fn trades_to_csv(&self) -> Result<String, TradingError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for t in &self.result.trades {
            writer
                .serialize(TradeRow {
                    entry_time: format_time(t.entry_time),
                    exit_time: format_time(t.exit_time),
                    direction: t.direction.to_string(),
                    entry_price: t.entry_price.round_dp(4),
                    exit_price: t.exit_price.round_dp(4),
                    size: t.size,
                    stop_loss: t.stop_loss.round_dp(4),
                    take_profit: t.take_profit.round_dp(4),
                    commission: t.commission.round_dp(2),
                    pnl: t.pnl.round_dp(2),
                    return_pct: t.return_pct(),
                    exit_reason: t.exit_reason.to_string(),
                    duration_minutes: t.duration_minutes(),
                })
                .map_err(|e| TradingError::Serialization(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TradingError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| TradingError::Serialization(e.to_string()))
    }

    /// One row per bar with an active signal.
    pub fn signals_to_csv(&self) -> Result<String, TradingError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for s in &self.result.signals {
            writer
                .serialize(SignalRow {
                    timestamp: format_time(s.timestamp),
                    direction: s.direction.to_string(),
                    strength: s.strength,
                    stop_distance: s.stop_distance,
                    take_profit_distance: s.take_profit_distance,
                })
                .map_err(|e| TradingError::Serialization(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TradingError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| TradingError::Serialization(e.to_string()))
    }

    /// Last equity value of each calendar day.
    pub fn daily_equity(&self) -> Vec<(NaiveDate, f64)> {
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in &self.result.equity_curve {
            if let Some(dt) = DateTime::from_timestamp_millis(point.timestamp) {
                days.insert(dt.date_naive(), point.equity.to_f64().unwrap_or_default());
            }
        }
        days.into_iter().collect()
    }

    /// Daily equity drawn as a character grid, with a dashed line at the
    /// initial capital.
    pub fn ascii_chart(&self, width: usize, height: usize) -> String {
        let daily = self.daily_equity();
        if daily.len() < 2 || width == 0 || height < 2 {
            return "Not enough data for a chart\n".to_string();
        }

        let values: Vec<f64> = daily.iter().map(|(_, v)| *v).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max > min { max - min } else { 1.0 };
        let row_of = |v: f64| ((v - min) / range * (height - 1) as f64) as usize;

        let mut grid = vec![vec![' '; width]; height];
        let initial = self.result.initial_capital.to_f64().unwrap_or_default();
        if initial >= min && initial <= max {
            let y = row_of(initial).min(height - 1);
            for cell in grid[height - 1 - y].iter_mut() {
                *cell = '-';
            }
        }

        let x_scale = values.len() as f64 / width as f64;
        for x in 0..width {
            let idx = (x as f64 * x_scale) as usize;
            if let Some(v) = values.get(idx) {
                let y = row_of(*v).min(height - 1);
                grid[height - 1 - y][x] = '*';
            }
        }

        let mut out = String::new();
        out.push_str(&format!("${:>14} |\n", format_money(max)));
        for row in grid {
            out.push_str(&format!("{:>16}|{}\n", "", row.into_iter().collect::<String>()));
        }
        out.push_str(&format!("${:>14} |{}\n", format_money(min), "_".repeat(width)));
        let start = daily[0].0.to_string();
        let end = daily[daily.len() - 1].0.to_string();
        let pad = width.saturating_sub(start.len());
        out.push_str(&format!("{:>16} {}{:>pad$}\n", "", start, end, pad = pad));

        let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let up = changes.iter().filter(|c| **c > 0.0).count();
        let down = changes.iter().filter(|c| **c < 0.0).count();
        let best = changes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = changes.iter().copied().fold(f64::INFINITY, f64::min);
        out.push_str(&format!(
            "\nPositive Days: {}  Negative Days: {}  Best Day: ${}  Worst Day: ${}\n",
            up,
            down,
            format_money(best),
            format_money(worst)
        ));
        out
    }

    /// Write the summary, JSON and CSV files named after `stem`.
    pub fn save(&self, dir: impl AsRef<Path>, stem: &str) -> Result<SavedReport, TradingError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let saved = SavedReport {
            summary: dir.join(format!("{}_summary.txt", stem)),
            json: dir.join(format!("{}_results.json", stem)),
            equity_csv: dir.join(format!("{}_equity.csv", stem)),
            trades_csv: dir.join(format!("{}_trades.csv", stem)),
            signals_csv: dir.join(format!("{}_signals.csv", stem)),
        };

        std::fs::write(&saved.summary, format!("{}\n{}", self.summary(), self.ascii_chart(70, 20)))?;
        std::fs::write(&saved.json, self.to_json()?)?;
        std::fs::write(&saved.equity_csv, self.equity_to_csv())?;
        std::fs::write(&saved.trades_csv, self.trades_to_csv()?)?;
        std::fs::write(&saved.signals_csv, self.signals_to_csv()?)?;

        tracing::info!(dir = %dir.display(), stem, "Backtest report saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EquityPoint, PerformanceMetrics, PerformanceTargets};
    use rust_decimal_macros::dec;
    use trading_core::types::{Direction, Signal, Timeframe, Trade};
    use trading_indicators::IndicatorParams;

    const DAY: i64 = 86_400_000;

    fn trade(pnl: Decimal, reason: ExitReason) -> Trade {
        Trade {
            direction: Direction::Long,
            entry_time: 0,
            exit_time: DAY,
            entry_price: dec!(100),
            exit_price: dec!(101),
            size: dec!(10),
            stop_loss: dec!(98),
            take_profit: dec!(104),
            commission: Decimal::ZERO,
            pnl,
            exit_reason: reason,
        }
    }

    fn report() -> BacktestReport {
        let trades = vec![
            trade(dec!(500), ExitReason::TakeProfit),
            trade(dec!(-200), ExitReason::StopLoss),
            trade(dec!(300), ExitReason::TakeProfit),
        ];
        let equity_curve: Vec<EquityPoint> = [100000, 100500, 100300, 100600]
            .iter()
            .enumerate()
            .map(|(i, e)| EquityPoint {
                timestamp: i as i64 * DAY,
                equity: Decimal::from(*e),
            })
            .collect();
        let curve: Vec<(i64, Decimal)> = equity_curve.iter().map(|p| (p.timestamp, p.equity)).collect();
        let metrics =
            PerformanceMetrics::calculate(&trades, &curve, dec!(100000), &PerformanceTargets::default());
        BacktestReport::new(
            BacktestConfig::default(),
            BacktestResult {
                symbol: "^GSPC".to_string(),
                timeframe: Timeframe::Daily,
                params: IndicatorParams::empty(),
                initial_capital: dec!(100000),
                trades,
                equity_curve,
                metrics,
                bars_processed: 4,
                long_signals: 3,
                short_signals: 0,
                signals: vec![Signal {
                    timestamp: 0,
                    direction: Direction::Long,
                    strength: 2,
                    stop_distance: 2.0,
                    take_profit_distance: 4.0,
                }],
                halted: false,
            },
        )
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("BACKTEST SUMMARY"));
        assert!(summary.contains("Total Trades: 3"));
        assert!(summary.contains("Total Return: 0.60%"));
        assert!(summary.contains("Win Rate Target Met: ✓"));
        assert!(summary.contains("Take Profit"));
    }

    #[test]
    fn test_exit_breakdown() {
        let breakdown = report().exit_breakdown();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].reason, ExitReason::StopLoss);
        assert_eq!(breakdown[0].count, 1);
        assert_eq!(breakdown[1].reason, ExitReason::TakeProfit);
        assert_eq!(breakdown[1].total_pnl, dec!(800));
    }

    #[test]
    fn test_csv_exports() {
        let r = report();
        let equity = r.equity_to_csv();
        assert_eq!(equity.lines().count(), 5);
        assert!(equity.starts_with("timestamp,equity"));

        let trades = r.trades_to_csv().unwrap();
        let mut lines = trades.lines();
        assert!(lines.next().unwrap().starts_with("entry_time,exit_time,direction"));
        assert_eq!(lines.count(), 3);

        let signals = r.signals_to_csv().unwrap();
        let mut lines = signals.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,direction,strength,stop_distance,take_profit_distance"
        );
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_ascii_chart() {
        let chart = report().ascii_chart(40, 10);
        assert!(chart.contains('*'));
        assert!(chart.contains("100,600.00"));
        assert!(chart.contains("Positive Days: 2"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234567.891), "1,234,567.89");
        assert_eq!(format_money(-950.0), "-950.00");
        assert_eq!(format_money(0.0), "0.00");
    }

    #[test]
    fn test_save_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let saved = report().save(dir.path(), "5m").unwrap();
        assert!(saved.json.exists());
        assert!(saved.trades_csv.exists());
        assert!(saved.signals_csv.exists());
        let json = std::fs::read_to_string(saved.json).unwrap();
        assert!(json.contains("\"symbol\": \"^GSPC\""));
    }
}
