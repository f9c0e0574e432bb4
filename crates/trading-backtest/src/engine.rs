//! Backtesting engine.
//!
//! Replays a single bar series bar by bar: indicators and signals are
//! computed up front, then one position at a time is opened on the first bar
//! of a signal run and managed by the stop loss manager until it exits.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::StrategyError;
use trading_core::types::{
    Bar, BarSeries, Direction, ExitReason, OpenPosition, Signal, SignalFrame, Timeframe, Trade,
};
use trading_indicators::{IndicatorFrame, IndicatorParams};
use trading_risk::{exit_levels, RiskConfig, RiskDecision, RiskManager};
use trading_strategies::{ConfluenceConfig, ConfluenceStrategy, Strategy};

use crate::statistics::{PerformanceMetrics, PerformanceTargets};

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Commission as a fraction of traded notional, charged on entry and exit
    pub commission: Decimal,
    /// Adverse slippage as a fraction of the fill price
    pub slippage: Decimal,
    /// Rules that must agree before a signal fires
    pub min_confirmations: usize,
    /// Risk configuration
    pub risk: RiskConfig,
    pub targets: PerformanceTargets,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission: dec!(0.001),
            slippage: dec!(0.0005),
            min_confirmations: 2,
            risk: RiskConfig::default(),
            targets: PerformanceTargets::default(),
        }
    }
}

/// Equity after a bar closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: Decimal,
}

/// Everything a backtest run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub params: IndicatorParams,
    pub initial_capital: Decimal,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: PerformanceMetrics,
    pub bars_processed: usize,
    pub long_signals: usize,
    pub short_signals: usize,
    /// Bars where a long or short signal was active
    #[serde(default)]
    pub signals: Vec<Signal>,
    /// Whether the drawdown guard stopped new entries
    pub halted: bool,
}

impl BacktestResult {
    pub fn final_equity(&self) -> Decimal {
        self.metrics.final_equity
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve
            .iter()
            .map(|p| p.equity.to_f64().unwrap_or_default())
            .collect()
    }
}

/// Backtesting engine.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Strategy settings derived from the backtest configuration.
    pub fn strategy_config(&self) -> ConfluenceConfig {
        ConfluenceConfig {
            min_confirmations: self.config.min_confirmations,
            session: self.config.risk.session.clone(),
            exit_rules: self.config.risk.exit_rules.clone(),
        }
    }

    /// Compute indicators and signals for `series`, then simulate.
    pub fn run(
        &self,
        series: &BarSeries,
        params: &IndicatorParams,
    ) -> Result<BacktestResult, StrategyError> {
        if series.len() < 2 {
            return Err(StrategyError::InsufficientData {
                required: 2,
                available: series.len(),
            });
        }

        let frame = IndicatorFrame::compute(series, params);
        let strategy = ConfluenceStrategy::new(self.strategy_config());
        let signals = strategy.generate(series, &frame, params)?;

        tracing::debug!(
            symbol = %series.symbol,
            timeframe = %series.timeframe,
            bars = series.len(),
            long_signals = signals.long_count(),
            short_signals = signals.short_count(),
            "Running backtest"
        );

        let mut result = self.simulate(series, &signals)?;
        result.params = params.clone();
        Ok(result)
    }

    /// Replay precomputed signals over `series`.
    pub fn simulate(
        &self,
        series: &BarSeries,
        signals: &SignalFrame,
    ) -> Result<BacktestResult, StrategyError> {
        let bars = series.bars();
        if signals.len() != bars.len() {
            return Err(StrategyError::Internal(format!(
                "signal frame has {} rows for {} bars",
                signals.len(),
                bars.len()
            )));
        }
        let Some(first) = bars.first() else {
            return Err(StrategyError::InsufficientData {
                required: 2,
                available: 0,
            });
        };

        let timeframe = series.timeframe;
        let initial = self.config.initial_capital;
        let mut risk = RiskManager::new(self.config.risk.clone());
        risk.update_equity(initial);

        let mut capital = initial;
        let mut position: Option<OpenPosition> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());
        equity_curve.push(EquityPoint {
            timestamp: first.timestamp,
            equity: initial,
        });

        for (i, bar) in bars.iter().enumerate().skip(1) {
            let exit = match position.as_mut() {
                Some(pos) => {
                    risk.stop_loss().update_trailing_stop(pos, bar.close);
                    risk.stop_loss().check_exit(pos, bar, timeframe)
                }
                None => None,
            };
            if let Some((reason, price)) = exit {
                if let Some(pos) = position.take() {
                    let trade = self.close_position(pos, bar.timestamp, price, reason);
                    capital += trade.pnl;
                    trades.push(trade);
                }
            }

            if position.is_none() {
                if let Some(direction) = signals.entry_at(i) {
                    position = self.open_position(&risk, signals, i, bar, direction, capital);
                }
            }

            let equity = match &position {
                Some(pos) => {
                    let mark = Decimal::try_from(bar.close).unwrap_or(pos.entry_price);
                    capital + pos.unrealized_pnl(mark) - pos.entry_commission
                }
                None => capital,
            };
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
            });
            risk.update_equity(equity);
        }

        if let (Some(pos), Some(last)) = (position.take(), bars.last()) {
            let trade = self.close_position(pos, last.timestamp, last.close, ExitReason::EndOfBacktest);
            capital += trade.pnl;
            trades.push(trade);
            if let Some(point) = equity_curve.last_mut() {
                point.equity = capital;
            }
        }

        let curve: Vec<(i64, Decimal)> = equity_curve.iter().map(|p| (p.timestamp, p.equity)).collect();
        let metrics = PerformanceMetrics::calculate(&trades, &curve, initial, &self.config.targets);

        tracing::debug!(
            trades = trades.len(),
            final_equity = %metrics.final_equity,
            sharpe = metrics.sharpe_ratio,
            max_drawdown = metrics.max_drawdown,
            "Backtest complete"
        );

        Ok(BacktestResult {
            symbol: series.symbol.clone(),
            timeframe,
            params: IndicatorParams::empty(),
            initial_capital: initial,
            trades,
            equity_curve,
            metrics,
            bars_processed: bars.len(),
            long_signals: signals.long_count(),
            short_signals: signals.short_count(),
            signals: signals.signals(&series.timestamps()),
            halted: risk.is_halted(),
        })
    }

    fn open_position(
        &self,
        risk: &RiskManager,
        signals: &SignalFrame,
        i: usize,
        bar: &Bar,
        direction: Direction,
        capital: Decimal,
    ) -> Option<OpenPosition> {
        let (Some(stop_distance), Some(target_distance)) =
            (signals.stop_distance[i], signals.take_profit_distance[i])
        else {
            return None;
        };

        let raw = Decimal::try_from(bar.close).ok()?;
        let fill = self.slipped(raw, direction, true);
        let fill_f64 = fill.to_f64()?;
        let (stop, target) = exit_levels(direction, fill_f64, stop_distance, target_distance);

        match risk.evaluate_entry(capital, fill_f64, stop) {
            RiskDecision::Approved { size } => {
                let entry_commission = fill * size * self.config.commission;
                tracing::debug!(
                    %direction,
                    price = %fill,
                    %size,
                    stop,
                    target,
                    "Opened position"
                );
                Some(OpenPosition {
                    direction,
                    entry_time: bar.timestamp,
                    entry_price: fill,
                    size,
                    stop_loss: stop,
                    take_profit: target,
                    initial_stop: stop,
                    entry_commission,
                })
            }
            RiskDecision::Rejected { reason } => {
                tracing::debug!(%reason, "Entry skipped");
                None
            }
        }
    }

    fn close_position(
        &self,
        position: OpenPosition,
        timestamp: i64,
        price: f64,
        reason: ExitReason,
    ) -> Trade {
        let raw = Decimal::try_from(price).unwrap_or(position.entry_price);
        let exit_price = self.slipped(raw, position.direction, false);
        let exit_commission = exit_price * position.size * self.config.commission;
        let gross = (exit_price - position.entry_price) * position.size * position.direction.sign();
        let commission = position.entry_commission + exit_commission;
        let pnl = gross - commission;

        tracing::debug!(
            direction = %position.direction,
            exit_price = %exit_price,
            %pnl,
            %reason,
            "Closed position"
        );

        Trade {
            direction: position.direction,
            entry_time: position.entry_time,
            exit_time: timestamp,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            stop_loss: Decimal::try_from(position.initial_stop).unwrap_or_default(),
            take_profit: Decimal::try_from(position.take_profit).unwrap_or_default(),
            commission,
            pnl,
            exit_reason: reason,
        }
    }

    /// Fill price after adverse slippage.
    fn slipped(&self, price: Decimal, direction: Direction, entering: bool) -> Decimal {
        let buying = (direction == Direction::Long) == entering;
        if buying {
            price * (Decimal::ONE + self.config.slippage)
        } else {
            price * (Decimal::ONE - self.config.slippage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frictionless() -> BacktestConfig {
        BacktestConfig {
            initial_capital: dec!(100000),
            commission: Decimal::ZERO,
            slippage: Decimal::ZERO,
            ..BacktestConfig::default()
        }
    }

    /// Daily bars so every bar is tradable and never end of day.
    fn daily(closes: &[(f64, f64, f64)]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                Bar::new(start + i as i64 * 86_400_000, close, high, low, close, 1000.0)
            })
            .collect();
        BarSeries::from_bars("SPX", Timeframe::Daily, bars)
    }

    fn long_at(len: usize, i: usize, stop: f64, target: f64) -> SignalFrame {
        let mut s = SignalFrame::with_len(len);
        s.long_signal[i] = true;
        s.long_strength[i] = 2;
        s.stop_distance[i] = Some(stop);
        s.take_profit_distance[i] = Some(target);
        s
    }

    #[test]
    fn test_take_profit_trade() {
        let series = daily(&[
            (101.0, 99.0, 100.0),
            (101.0, 99.0, 100.0),
            // Trailing stop moves to 102 at this close before exits are checked
            (105.0, 102.5, 104.0),
            (104.0, 103.0, 103.5),
        ]);
        let signals = long_at(4, 1, 2.0, 4.0);
        let engine = BacktestEngine::new(frictionless());
        let result = engine.simulate(&series, &signals).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.entry_price, dec!(100));
        assert_eq!(trade.exit_price, dec!(104));
        // floor(100000 * 0.02 / 2) = 1000 shares, capped at 1000
        assert_eq!(trade.size, dec!(1000));
        assert_eq!(trade.pnl, dec!(4000));
        assert_eq!(result.final_equity(), dec!(104000));
        assert_eq!(result.equity_curve.len(), 4);
        assert_eq!(result.equity_curve[0].equity, dec!(100000));
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].timestamp, series.get(1).unwrap().timestamp);
        assert_eq!(result.signals[0].direction, Direction::Long);
    }

    #[test]
    fn test_stop_loss_trade() {
        let series = daily(&[
            (101.0, 99.0, 100.0),
            (101.0, 99.0, 100.0),
            (100.5, 97.0, 98.5),
        ]);
        let signals = long_at(3, 1, 2.0, 4.0);
        let result = BacktestEngine::new(frictionless()).simulate(&series, &signals).unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_price, dec!(98));
        assert_eq!(trade.pnl, dec!(-2000));
        assert_eq!(result.metrics.losing_trades, 1);
    }

    #[test]
    fn test_open_position_closed_at_end() {
        let series = daily(&[
            (101.0, 99.0, 100.0),
            (101.0, 99.0, 100.0),
            (102.0, 99.5, 101.0),
        ]);
        let signals = long_at(3, 1, 2.0, 4.0);
        let result = BacktestEngine::new(frictionless()).simulate(&series, &signals).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfBacktest);
        assert_eq!(result.trades[0].exit_price, dec!(101));
        assert_eq!(result.equity_curve.last().unwrap().equity, result.final_equity());
    }

    #[test]
    fn test_costs_reduce_pnl() {
        let series = daily(&[
            (101.0, 99.0, 100.0),
            (101.0, 99.0, 100.0),
            (105.0, 102.5, 104.0),
        ]);
        let signals = long_at(3, 1, 2.0, 4.0);

        let config = BacktestConfig {
            commission: dec!(0.001),
            slippage: dec!(0.0005),
            ..frictionless()
        };
        let with_costs = BacktestEngine::new(config).simulate(&series, &signals).unwrap();
        let without = BacktestEngine::new(frictionless()).simulate(&series, &signals).unwrap();

        let trade = &with_costs.trades[0];
        assert_eq!(trade.entry_price, dec!(100.05));
        assert!(trade.commission > Decimal::ZERO);
        assert!(trade.pnl < without.trades[0].pnl);
    }

    #[test]
    fn test_drawdown_halt_blocks_later_entries() {
        let series = daily(&[
            (101.0, 99.0, 100.0),
            (101.0, 99.0, 100.0),
            (100.5, 97.0, 98.5),
            (99.0, 98.0, 98.5),
            (99.0, 98.0, 98.5),
            (100.0, 98.0, 99.0),
        ]);
        let mut signals = long_at(6, 1, 2.0, 4.0);
        signals.long_signal[4] = true;
        signals.long_strength[4] = 2;
        signals.stop_distance[4] = Some(2.0);
        signals.take_profit_distance[4] = Some(4.0);

        let config = BacktestConfig {
            risk: RiskConfig {
                max_drawdown: 0.01,
                ..RiskConfig::default()
            },
            ..frictionless()
        };
        let result = BacktestEngine::new(config).simulate(&series, &signals).unwrap();

        // The 2% stop-out trips the 1% limit; the bar 4 signal is ignored
        assert!(result.halted);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(result.final_equity(), dec!(98000));

        // Same signals without the tight limit trade twice
        let unhalted = BacktestEngine::new(frictionless()).simulate(&series, &signals).unwrap();
        assert!(!unhalted.halted);
        assert_eq!(unhalted.trades.len(), 2);
    }

    #[test]
    fn test_intraday_position_closed_at_end_of_day() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(15, 40, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let closes = [100.0, 100.0, 100.2, 100.5, 100.4];
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + i as i64 * 300_000, c, 101.0, 99.5, c, 1000.0))
            .collect();
        let series = BarSeries::from_bars("^GSPC", Timeframe::Minute5, bars);
        let signals = long_at(5, 1, 2.0, 4.0);

        let result = BacktestEngine::new(frictionless()).simulate(&series, &signals).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfDay);
        // Bar 3 is 15:55
        assert_eq!(trade.exit_time, series.get(3).unwrap().timestamp);
        assert_eq!(trade.exit_price, dec!(100.5));
        assert_eq!(trade.pnl, dec!(500));
    }

    #[test]
    fn test_no_signals_no_trades() {
        let series = daily(&[(101.0, 99.0, 100.0); 5]);
        let result = BacktestEngine::new(frictionless())
            .simulate(&series, &SignalFrame::with_len(5))
            .unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.metrics.final_equity, dec!(100000));
        assert!(result.equity_curve.iter().all(|p| p.equity == dec!(100000)));
    }

    #[test]
    fn test_run_rejects_tiny_series() {
        let series = daily(&[(101.0, 99.0, 100.0)]);
        let result = BacktestEngine::default().run(&series, &IndicatorParams::default());
        assert!(matches!(result, Err(StrategyError::InsufficientData { .. })));
    }

    #[test]
    fn test_run_end_to_end() {
        let closes: Vec<(f64, f64, f64)> = (0..300)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.15).sin() * 8.0 + i as f64 * 0.02;
                (c + 1.5, c - 1.5, c)
            })
            .collect();
        let series = daily(&closes);
        let result = BacktestEngine::new(frictionless())
            .run(&series, &IndicatorParams::default())
            .unwrap();

        assert_eq!(result.bars_processed, 300);
        assert_eq!(result.equity_curve.len(), 300);
        assert_eq!(result.metrics.total_trades, result.trades.len());
        assert!(result.params.rsi.is_some());
    }
}
