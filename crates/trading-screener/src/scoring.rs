//! Fundamental score, conviction and the resulting recommendation.

use serde::{Deserialize, Serialize};
use std::fmt;
use trading_core::types::Fundamentals;

use crate::signals::TechnicalSignals;

const TECHNICAL_WEIGHT: f64 = 0.6;
const FUNDAMENTAL_WEIGHT: f64 = 0.4;

/// Valuation, growth, profitability and leverage score in 0..=100.
///
/// Starts at 50; a missing metric contributes nothing.
pub fn fundamental_score(f: &Fundamentals) -> f64 {
    let mut score: f64 = 50.0;

    if let Some(pe) = f.pe_ratio {
        if pe > 0.0 && pe < 15.0 {
            score += 10.0;
        } else if (15.0..25.0).contains(&pe) {
            score += 5.0;
        } else if pe > 40.0 {
            score -= 10.0;
        }
    }

    if let Some(growth) = f.revenue_growth {
        if growth > 0.15 {
            score += 10.0;
        } else if growth > 0.05 {
            score += 5.0;
        }
    }

    if let Some(margin) = f.profit_margin {
        if margin > 0.20 {
            score += 10.0;
        } else if margin > 0.10 {
            score += 5.0;
        }
    }

    if let Some(de) = f.debt_to_equity {
        if de < 0.5 {
            score += 5.0;
        } else if de > 2.0 {
            score -= 10.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Weighted blend of momentum and fundamentals plus signal bonuses,
/// capped at 100.
pub fn conviction_score(signals: &TechnicalSignals, fundamental: f64) -> f64 {
    let mut score =
        signals.momentum_score as f64 * TECHNICAL_WEIGHT + fundamental * FUNDAMENTAL_WEIGHT;
    if signals.golden_cross {
        score += 5.0;
    }
    if signals.rsi_bullish_divergence {
        score += 5.0;
    }
    if signals.macd_cross_up {
        score += 3.0;
    }
    score.min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "REDUCE")]
    Reduce,
    #[serde(rename = "SELL")]
    Sell,
}

impl Recommendation {
    pub fn from_conviction(score: f64) -> Self {
        if score >= 75.0 {
            Self::StrongBuy
        } else if score >= 65.0 {
            Self::Buy
        } else if score >= 50.0 {
            Self::Hold
        } else if score >= 40.0 {
            Self::Reduce
        } else {
            Self::Sell
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Reduce => "REDUCE",
            Self::Sell => "SELL",
        }
    }

    /// Suggested action text.
    pub fn action(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Accumulate on any weakness",
            Self::Buy => "Build position gradually",
            Self::Hold => "Monitor for better entry",
            Self::Reduce => "Take partial profits",
            Self::Sell => "Exit position",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Reduce | Self::Sell)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "High - Overbought")]
    Overbought,
    #[serde(rename = "Medium - Oversold bounce expected")]
    Oversold,
    #[serde(rename = "Medium - Near resistance")]
    NearResistance,
    #[serde(rename = "Low")]
    Low,
}

impl RiskLevel {
    /// First matching rule wins: overbought, oversold, within 2% of the
    /// first resistance, otherwise low.
    pub fn assess(rsi: Option<f64>, price: f64, resistance: f64) -> Self {
        match rsi {
            Some(r) if r > 70.0 => Self::Overbought,
            Some(r) if r < 30.0 => Self::Oversold,
            _ if price > resistance * 0.98 => Self::NearResistance,
            _ => Self::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Overbought => "High - Overbought",
            Self::Oversold => "Medium - Oversold bounce expected",
            Self::NearResistance => "Medium - Near resistance",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(momentum: u32) -> TechnicalSignals {
        TechnicalSignals {
            price: 100.0,
            rsi: Some(50.0),
            above_sma_20: false,
            above_sma_50: false,
            above_sma_200: false,
            golden_cross: false,
            death_cross: false,
            rsi_oversold: false,
            rsi_overbought: false,
            rsi_bullish_divergence: false,
            macd_bullish: false,
            macd_cross_up: false,
            bb_squeeze: false,
            price_below_lower_bb: false,
            price_above_upper_bb: false,
            volume_surge: false,
            momentum_score: momentum,
        }
    }

    #[test]
    fn test_fundamental_score() {
        let mut f = Fundamentals::empty("AAA");
        assert!((fundamental_score(&f) - 50.0).abs() < 1e-10);

        f.pe_ratio = Some(12.0);
        f.revenue_growth = Some(0.2);
        f.profit_margin = Some(0.25);
        f.debt_to_equity = Some(0.3);
        assert!((fundamental_score(&f) - 85.0).abs() < 1e-10);

        f.pe_ratio = Some(50.0);
        f.revenue_growth = Some(0.08);
        f.profit_margin = Some(0.12);
        f.debt_to_equity = Some(3.0);
        assert!((fundamental_score(&f) - 40.0).abs() < 1e-10);

        // negative earnings get no valuation credit
        let mut loss = Fundamentals::empty("BBB");
        loss.pe_ratio = Some(-5.0);
        assert!((fundamental_score(&loss) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_conviction_blend_and_bonuses() {
        let s = signals(60);
        assert!((conviction_score(&s, 85.0) - 70.0).abs() < 1e-10);

        let mut s = signals(60);
        s.golden_cross = true;
        s.rsi_bullish_divergence = true;
        s.macd_cross_up = true;
        assert!((conviction_score(&s, 85.0) - 83.0).abs() < 1e-10);

        let mut s = signals(100);
        s.golden_cross = true;
        assert!((conviction_score(&s, 100.0) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_conviction(75.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_conviction(74.9), Recommendation::Buy);
        assert_eq!(Recommendation::from_conviction(65.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_conviction(50.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_conviction(40.0), Recommendation::Reduce);
        assert_eq!(Recommendation::from_conviction(39.9), Recommendation::Sell);
        assert_eq!(Recommendation::Buy.action(), "Build position gradually");
        assert_eq!(Recommendation::StrongBuy.to_string(), "STRONG BUY");
        assert!(Recommendation::Reduce.is_bearish());
    }

    #[test]
    fn test_risk_level_order() {
        assert_eq!(RiskLevel::assess(Some(75.0), 100.0, 100.0), RiskLevel::Overbought);
        assert_eq!(RiskLevel::assess(Some(25.0), 100.0, 100.0), RiskLevel::Oversold);
        assert_eq!(RiskLevel::assess(Some(50.0), 99.0, 100.0), RiskLevel::NearResistance);
        assert_eq!(RiskLevel::assess(None, 90.0, 100.0), RiskLevel::Low);
        assert_eq!(RiskLevel::Low.to_string(), "Low");
    }
}
