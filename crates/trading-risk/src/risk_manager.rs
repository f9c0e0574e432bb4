//! Unified risk manager.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::types::TradingSession;

use crate::{ExitRules, PositionSizer, PositionSizingMethod, StopLossManager};

/// Risk management configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub position_sizing: PositionSizingMethod,
    /// Halt new entries once the drawdown from peak equity exceeds this
    /// fraction
    pub max_drawdown: f64,
    pub exit_rules: ExitRules,
    pub session: TradingSession,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            position_sizing: PositionSizingMethod::default(),
            max_drawdown: 0.20,
            exit_rules: ExitRules::default(),
            session: TradingSession::default(),
        }
    }
}

/// Decision for a prospective entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Approved { size: Decimal },
    Rejected { reason: String },
}

impl RiskDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskDecision::Approved { .. })
    }

    pub fn size(&self) -> Option<Decimal> {
        match self {
            RiskDecision::Approved { size } => Some(*size),
            RiskDecision::Rejected { .. } => None,
        }
    }
}

/// Sizes entries and enforces the drawdown guard for one simulation.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    position_sizer: PositionSizer,
    stop_loss_manager: StopLossManager,
    peak_equity: Decimal,
    equity: Decimal,
    halted: bool,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        let position_sizer = PositionSizer::new(config.position_sizing.clone());
        let stop_loss_manager =
            StopLossManager::new(config.exit_rules.clone(), config.session.clone());
        Self {
            config,
            position_sizer,
            stop_loss_manager,
            peak_equity: Decimal::ZERO,
            equity: Decimal::ZERO,
            halted: false,
        }
    }

    pub fn stop_loss(&self) -> &StopLossManager {
        &self.stop_loss_manager
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.position_sizer
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Record the latest equity; trips the halt when drawdown exceeds the
    /// limit.
    pub fn update_equity(&mut self, equity: Decimal) {
        self.equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if !self.halted && self.drawdown() > self.config.max_drawdown {
            self.halted = true;
            tracing::warn!(
                drawdown = self.drawdown(),
                limit = self.config.max_drawdown,
                "Max drawdown exceeded, halting new entries"
            );
        }
    }

    /// Current drawdown from peak as a fraction.
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity <= Decimal::ZERO {
            return 0.0;
        }
        ((self.peak_equity - self.equity) / self.peak_equity)
            .to_f64()
            .unwrap_or_default()
            .max(0.0)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Size an entry at `price` with a stop at `stop_price`.
    pub fn evaluate_entry(&self, equity: Decimal, price: f64, stop_price: f64) -> RiskDecision {
        if self.halted {
            return RiskDecision::Rejected {
                reason: "Trading halted by drawdown limit".to_string(),
            };
        }
        let price = Decimal::try_from(price).unwrap_or_default();
        let stop = Decimal::try_from(stop_price).unwrap_or_default();
        let size = self.position_sizer.calculate(equity, price, stop);
        if size <= Decimal::ZERO {
            return RiskDecision::Rejected {
                reason: "Calculated position size is zero".to_string(),
            };
        }
        RiskDecision::Approved { size }
    }

    /// Forget peak equity and lift the halt.
    pub fn reset(&mut self) {
        self.peak_equity = Decimal::ZERO;
        self.equity = Decimal::ZERO;
        self.halted = false;
    }
}
