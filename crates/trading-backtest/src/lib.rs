//! Backtesting engine, performance statistics, reports and parameter
//! optimization.

mod engine;
mod optimizer;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, BacktestResult, EquityPoint};
pub use optimizer::{
    save_walk_forward, OptimizationResult, Optimizer, OptimizerConfig, SearchSummary,
    TrainTestResult, WalkForwardWindow, COMBINATIONS,
};
pub use report::{format_money, BacktestReport, ExitBreakdown, SavedReport};
pub use statistics::{
    max_drawdown, pct_change, sharpe, sortino, PerformanceMetrics, PerformanceTargets,
    TargetChecks,
};
