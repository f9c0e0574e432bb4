//! Multi-indicator confluence strategy.
//!
//! Each enabled rule votes long or short on a bar. A bar becomes a signal
//! when enough rules agree, and bars where both sides reach the threshold are
//! dropped as conflicting.

use serde::{Deserialize, Serialize};
use trading_core::error::StrategyError;
use trading_core::types::{BarSeries, SignalFrame, TradingSession};
use trading_indicators::{keys, IndicatorFrame, IndicatorParams};
use trading_risk::ExitRules;

use crate::rules::all_rules;
use crate::Strategy;

/// Confluence strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// Rules that must agree before a signal fires
    pub min_confirmations: usize,
    pub session: TradingSession,
    pub exit_rules: ExitRules,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 2,
            session: TradingSession::default(),
            exit_rules: ExitRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfluenceStrategy {
    config: ConfluenceConfig,
}

impl ConfluenceStrategy {
    pub fn new(config: ConfluenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }

    /// Confirmations needed for `params`.
    ///
    /// A parameter set with fewer rules than `min_confirmations` could never
    /// signal, so the requirement is capped at the rule count (never below
    /// one).
    pub fn required_confirmations(&self, params: &IndicatorParams) -> u32 {
        let cap = params.signal_rule_count().max(1);
        self.config.min_confirmations.clamp(1, cap) as u32
    }
}

impl Strategy for ConfluenceStrategy {
    fn name(&self) -> &str {
        "confluence"
    }

    fn generate(
        &self,
        series: &BarSeries,
        frame: &IndicatorFrame,
        params: &IndicatorParams,
    ) -> Result<SignalFrame, StrategyError> {
        if params.signal_rule_count() == 0 {
            return Err(StrategyError::NoIndicators);
        }
        if frame.len() != series.len() {
            return Err(StrategyError::Internal(format!(
                "indicator frame has {} rows for {} bars",
                frame.len(),
                series.len()
            )));
        }
        if series.len() < 2 {
            return Err(StrategyError::InsufficientData {
                required: 2,
                available: series.len(),
            });
        }

        let n = series.len();
        let bars = series.bars();
        let mut signals = SignalFrame::with_len(n);

        for (i, bar) in bars.iter().enumerate() {
            signals.tradable[i] = self.config.session.is_tradable(bar, series.timeframe);
        }

        let rules = all_rules(series, frame, params);
        for rule in &rules {
            tracing::trace!(
                rule = %rule.name,
                long = rule.long_count(),
                short = rule.short_count(),
                "Rule evaluated"
            );
            for i in 0..n {
                if !signals.tradable[i] {
                    continue;
                }
                if rule.long[i] {
                    signals.long_strength[i] += 1;
                }
                if rule.short[i] {
                    signals.short_strength[i] += 1;
                }
            }
        }

        let required = self.required_confirmations(params);
        let atr = params
            .atr_stop()
            .map(|(period, mult)| (keys::atr(period), mult));

        for (i, bar) in bars.iter().enumerate() {
            let long = signals.long_strength[i] >= required;
            let short = signals.short_strength[i] >= required;
            signals.long_signal[i] = long && !short;
            signals.short_signal[i] = short && !long;

            let atr_stop = atr
                .as_ref()
                .and_then(|(column, mult)| frame.value(column, i).map(|v| v * mult));
            let (stop, target) = self.config.exit_rules.distances(bar.close, atr_stop);
            signals.stop_distance[i] = Some(stop);
            signals.take_profit_distance[i] = Some(target);
        }

        tracing::debug!(
            rules = rules.len(),
            required,
            long = signals.long_count(),
            short = signals.short_count(),
            params = %params.describe(),
            "Signals generated"
        );

        Ok(signals)
    }
}
