//! Backtest performance statistics.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use trading_core::types::Trade;

/// Periods per year used to annualise per-bar returns.
const PERIODS_PER_YEAR: f64 = 252.0;
const MS_PER_DAY: i64 = 86_400_000;

/// Thresholds a strategy has to clear to be considered viable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceTargets {
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub annual_return: f64,
    pub max_drawdown: f64,
}

impl Default for PerformanceTargets {
    fn default() -> Self {
        Self {
            win_rate: 0.50,
            profit_factor: 1.5,
            sharpe_ratio: 1.0,
            annual_return: 0.10,
            max_drawdown: 0.20,
        }
    }
}

/// Which targets were met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetChecks {
    pub win_rate: bool,
    pub profit_factor: bool,
    pub sharpe_ratio: bool,
    pub annual_return: bool,
    pub max_drawdown: bool,
}

impl TargetChecks {
    pub fn all_met(&self) -> bool {
        self.win_rate && self.profit_factor && self.sharpe_ratio && self.annual_return && self.max_drawdown
    }

    pub fn met_count(&self) -> usize {
        [
            self.win_rate,
            self.profit_factor,
            self.sharpe_ratio,
            self.annual_return,
            self.max_drawdown,
        ]
        .iter()
        .filter(|m| **m)
        .count()
    }
}

/// Performance summary of one backtest.
///
/// Ratios and returns are fractions (0.12 means 12%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    /// Mean profit of winners
    pub avg_win: Decimal,
    /// Mean loss of losers, as a positive amount
    pub avg_loss: Decimal,
    pub expected_value: Decimal,
    pub expected_value_pct: f64,

    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub profit_factor: f64,
    pub calmar_ratio: f64,
    pub recovery_factor: f64,

    pub max_drawdown: f64,
    pub avg_risk_per_trade: f64,
    /// Mean holding time in minutes, `None` without trades
    pub avg_trade_duration_minutes: Option<f64>,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,

    pub final_equity: Decimal,
    pub targets: TargetChecks,
}

impl PerformanceMetrics {
    /// Metrics for a run that never traded.
    pub fn empty(initial_capital: Decimal) -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            expected_value: Decimal::ZERO,
            expected_value_pct: 0.0,
            total_return: 0.0,
            annual_return: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            profit_factor: 0.0,
            calmar_ratio: 0.0,
            recovery_factor: 0.0,
            max_drawdown: 0.0,
            avg_risk_per_trade: 0.0,
            avg_trade_duration_minutes: None,
            max_win_streak: 0,
            max_loss_streak: 0,
            final_equity: initial_capital,
            targets: TargetChecks {
                max_drawdown: true,
                ..TargetChecks::default()
            },
        }
    }

    /// Compute metrics from closed trades and the per-bar equity curve.
    ///
    /// `equity` holds `(timestamp, equity)` points in time order, starting
    /// with the initial capital.
    pub fn calculate(
        trades: &[Trade],
        equity: &[(i64, Decimal)],
        initial_capital: Decimal,
        targets: &PerformanceTargets,
    ) -> Self {
        if trades.is_empty() {
            return Self::empty(initial_capital);
        }

        let total_trades = trades.len();
        let winners: Vec<Decimal> = trades.iter().map(|t| t.pnl).filter(|p| *p > Decimal::ZERO).collect();
        let losers: Vec<Decimal> = trades.iter().map(|t| t.pnl).filter(|p| *p < Decimal::ZERO).collect();

        let win_rate = winners.len() as f64 / total_trades as f64;
        let total_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
        let gross_profit: Decimal = winners.iter().sum();
        let gross_loss: Decimal = losers.iter().sum::<Decimal>().abs();

        let avg_win = mean_decimal(&winners);
        let avg_loss = mean_decimal(&losers).abs();

        let win_rate_dec = Decimal::try_from(win_rate).unwrap_or_default();
        let expected_value = win_rate_dec * avg_win - (Decimal::ONE - win_rate_dec) * avg_loss;
        let expected_value_pct = ratio(expected_value, initial_capital);

        // Without losing trades the divisor is one currency unit
        let loss_divisor = if losers.is_empty() { Decimal::ONE } else { gross_loss };
        let profit_factor = ratio(gross_profit, loss_divisor);

        let final_equity = equity.last().map(|(_, e)| *e).unwrap_or(initial_capital);
        let total_return = ratio(final_equity - initial_capital, initial_capital);

        let values: Vec<f64> = equity
            .iter()
            .map(|(_, e)| e.to_f64().unwrap_or_default())
            .collect();
        let returns = pct_change(&values);
        let sharpe_ratio = sharpe(&returns);
        let sortino_ratio = sortino(&returns);
        let max_drawdown = max_drawdown(&values);

        let days = match (equity.first(), equity.last()) {
            (Some((first, _)), Some((last, _))) => (last - first) / MS_PER_DAY,
            _ => 0,
        };
        let annual_return = if days > 0 {
            total_return * 365.0 / days as f64
        } else {
            0.0
        };
        let calmar_ratio = if max_drawdown > 0.0 {
            annual_return / max_drawdown
        } else {
            0.0
        };

        let initial_f64 = initial_capital.to_f64().unwrap_or_default();
        let avg_risk_per_trade = if initial_f64 > 0.0 {
            trades
                .iter()
                .map(|t| t.risk_amount().to_f64().unwrap_or_default() / initial_f64)
                .sum::<f64>()
                / total_trades as f64
        } else {
            0.0
        };
        let recovery_factor = if max_drawdown > 0.0 && initial_f64 > 0.0 {
            total_pnl.to_f64().unwrap_or_default() / (max_drawdown * initial_f64)
        } else {
            0.0
        };

        let avg_trade_duration_minutes = Some(
            trades.iter().map(|t| t.duration_minutes() as f64).sum::<f64>() / total_trades as f64,
        );

        let wins: Vec<bool> = trades.iter().map(|t| t.is_winner()).collect();
        let max_win_streak = max_streak(&wins, true);
        let max_loss_streak = max_streak(&wins, false);

        let checks = TargetChecks {
            win_rate: win_rate >= targets.win_rate,
            profit_factor: profit_factor >= targets.profit_factor,
            sharpe_ratio: sharpe_ratio >= targets.sharpe_ratio,
            annual_return: annual_return >= targets.annual_return,
            max_drawdown: max_drawdown <= targets.max_drawdown,
        };

        Self {
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate,
            total_pnl,
            gross_profit,
            gross_loss,
            avg_win,
            avg_loss,
            expected_value,
            expected_value_pct,
            total_return,
            annual_return,
            sharpe_ratio,
            sortino_ratio,
            profit_factor,
            calmar_ratio,
            recovery_factor,
            max_drawdown,
            avg_risk_per_trade,
            avg_trade_duration_minutes,
            max_win_streak,
            max_loss_streak,
            final_equity,
            targets: checks,
        }
    }

    /// Look up a metric by its snake_case name, as used for optimization.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "total_trades" => self.total_trades as f64,
            "win_rate" => self.win_rate,
            "total_pnl" => self.total_pnl.to_f64().unwrap_or_default(),
            "expected_value" => self.expected_value.to_f64().unwrap_or_default(),
            "expected_value_pct" => self.expected_value_pct,
            "total_return" => self.total_return,
            "annual_return" => self.annual_return,
            "sharpe_ratio" => self.sharpe_ratio,
            "sortino_ratio" => self.sortino_ratio,
            "profit_factor" => self.profit_factor,
            "calmar_ratio" => self.calmar_ratio,
            "recovery_factor" => self.recovery_factor,
            "max_drawdown" => self.max_drawdown,
            _ => return None,
        };
        Some(value)
    }
}

fn mean_decimal(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    (numerator / denominator).to_f64().unwrap_or_default()
}

/// Simple returns between consecutive values.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualised Sharpe ratio with a zero risk-free rate (sample std).
pub fn sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().copied().mean();
    let std_dev = returns.iter().copied().std_dev();
    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }
    PERIODS_PER_YEAR.sqrt() * mean / std_dev
}

/// Annualised Sortino ratio; zero when there is no downside.
pub fn sortino(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().copied().mean();
    let downside = returns
        .iter()
        .map(|r| r.min(0.0).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let downside_dev = downside.sqrt();
    if downside_dev == 0.0 {
        return 0.0;
    }
    PERIODS_PER_YEAR.sqrt() * mean / downside_dev
}

/// Largest peak-to-trough decline as a positive fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.min((v - peak) / peak);
        }
    }
    worst.abs()
}

fn max_streak(wins: &[bool], value: bool) -> usize {
    let mut streak = 0;
    let mut best = 0;
    for &w in wins {
        if w == value {
            streak += 1;
            best = best.max(streak);
        } else {
            streak = 0;
        }
    }
    best
}
