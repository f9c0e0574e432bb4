//! Indicator parameter grids.
//!
//! An [`IndicatorParams`] holds, per indicator kind, lists of candidate
//! values. The signal generator uses every value in the lists; the optimizer
//! expands the lists into single-valued parameter sets with
//! [`IndicatorParams::combinations`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trading_core::error::IndicatorError;

/// Indicator families that take part in signal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Ema,
    Macd,
    Bollinger,
    Atr,
}

impl IndicatorKind {
    pub fn all() -> &'static [IndicatorKind] {
        &[
            IndicatorKind::Rsi,
            IndicatorKind::Ema,
            IndicatorKind::Macd,
            IndicatorKind::Bollinger,
            IndicatorKind::Atr,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Bollinger => "BB",
            IndicatorKind::Atr => "ATR",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => {
                "RSI crossing back above oversold (long) or below overbought (short)"
            }
            IndicatorKind::Ema => "Short EMA crossing above (long) or below (short) a long EMA",
            IndicatorKind::Macd => "MACD line crossing its signal line",
            IndicatorKind::Bollinger => {
                "Rejection candle at the lower (long) or upper (short) band"
            }
            IndicatorKind::Atr => "No entries; sizes stops as a multiple of ATR",
        }
    }

    /// ATR only shapes exits; every other kind votes on entries.
    pub fn produces_signals(&self) -> bool {
        !matches!(self, IndicatorKind::Atr)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rsi" => Ok(IndicatorKind::Rsi),
            "ema" => Ok(IndicatorKind::Ema),
            "macd" => Ok(IndicatorKind::Macd),
            "bb" | "bollinger" | "bollinger_bands" => Ok(IndicatorKind::Bollinger),
            "atr" => Ok(IndicatorKind::Atr),
            _ => Err(format!("Unknown indicator: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub periods: Vec<usize>,
    pub oversold: Vec<f64>,
    pub overbought: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaParams {
    pub short_periods: Vec<usize>,
    pub long_periods: Vec<usize>,
}

impl EmaParams {
    /// (short, long) pairs where the short period really is shorter.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for &s in &self.short_periods {
            for &l in &self.long_periods {
                if s < l {
                    pairs.push((s, l));
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
    pub signal: Vec<usize>,
}

impl MacdParams {
    /// (fast, slow, signal) triples with fast < slow.
    pub fn triples(&self) -> Vec<(usize, usize, usize)> {
        let mut out = Vec::new();
        for &f in &self.fast {
            for &s in &self.slow {
                if f >= s {
                    continue;
                }
                for &sig in &self.signal {
                    out.push((f, s, sig));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub periods: Vec<usize>,
    pub std_dev: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrParams {
    pub periods: Vec<usize>,
    pub stop_loss_multiplier: Vec<f64>,
}

/// Candidate parameter values per indicator kind. Absent kinds are off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<RsiParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema: Option<EmaParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr: Option<AtrParams>,
}

impl Default for IndicatorParams {
    /// The full SPX search grid.
    fn default() -> Self {
        Self {
            rsi: Some(RsiParams {
                periods: vec![9, 14, 21],
                oversold: vec![20.0, 30.0],
                overbought: vec![70.0, 80.0],
            }),
            ema: Some(EmaParams {
                short_periods: vec![10, 20],
                long_periods: vec![50, 100],
            }),
            macd: Some(MacdParams {
                fast: vec![8, 12],
                slow: vec![21, 26],
                signal: vec![5, 9],
            }),
            bollinger: Some(BollingerParams {
                periods: vec![20],
                std_dev: vec![2.0, 2.5],
            }),
            atr: Some(AtrParams {
                periods: vec![14],
                stop_loss_multiplier: vec![1.0, 2.0, 3.0],
            }),
        }
    }
}

fn expand<T>(
    base: Vec<IndicatorParams>,
    variants: &[T],
    set: impl Fn(&mut IndicatorParams, &T),
) -> Vec<IndicatorParams> {
    if variants.is_empty() {
        return base;
    }
    let mut out = Vec::with_capacity(base.len() * variants.len());
    for b in &base {
        for v in variants {
            let mut p = b.clone();
            set(&mut p, v);
            out.push(p);
        }
    }
    out
}

impl IndicatorParams {
    /// No indicators enabled.
    pub fn empty() -> Self {
        Self {
            rsi: None,
            ema: None,
            macd: None,
            bollinger: None,
            atr: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.available_kinds().is_empty()
    }

    pub fn has(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::Rsi => self.rsi.is_some(),
            IndicatorKind::Ema => self.ema.is_some(),
            IndicatorKind::Macd => self.macd.is_some(),
            IndicatorKind::Bollinger => self.bollinger.is_some(),
            IndicatorKind::Atr => self.atr.is_some(),
        }
    }

    /// Enabled kinds in canonical order.
    pub fn available_kinds(&self) -> Vec<IndicatorKind> {
        IndicatorKind::all()
            .iter()
            .copied()
            .filter(|k| self.has(*k))
            .collect()
    }

    /// Keep only the listed kinds.
    pub fn subset(&self, kinds: &[IndicatorKind]) -> IndicatorParams {
        let keep = |k: IndicatorKind| kinds.contains(&k);
        IndicatorParams {
            rsi: self.rsi.clone().filter(|_| keep(IndicatorKind::Rsi)),
            ema: self.ema.clone().filter(|_| keep(IndicatorKind::Ema)),
            macd: self.macd.clone().filter(|_| keep(IndicatorKind::Macd)),
            bollinger: self
                .bollinger
                .clone()
                .filter(|_| keep(IndicatorKind::Bollinger)),
            atr: self.atr.clone().filter(|_| keep(IndicatorKind::Atr)),
        }
    }

    /// Cartesian product of every candidate value, one value per list.
    ///
    /// EMA pairs with short >= long and MACD triples with fast >= slow are
    /// dropped.
    pub fn combinations(&self) -> Vec<IndicatorParams> {
        let mut out = vec![IndicatorParams::empty()];

        if let Some(rsi) = &self.rsi {
            let mut variants = Vec::new();
            for &p in &rsi.periods {
                for &os in &rsi.oversold {
                    for &ob in &rsi.overbought {
                        variants.push(RsiParams {
                            periods: vec![p],
                            oversold: vec![os],
                            overbought: vec![ob],
                        });
                    }
                }
            }
            out = expand(out, &variants, |p, v| p.rsi = Some(v.clone()));
        }

        if let Some(ema) = &self.ema {
            let variants: Vec<EmaParams> = ema
                .pairs()
                .into_iter()
                .map(|(s, l)| EmaParams {
                    short_periods: vec![s],
                    long_periods: vec![l],
                })
                .collect();
            out = expand(out, &variants, |p, v| p.ema = Some(v.clone()));
        }

        if let Some(macd) = &self.macd {
            let variants: Vec<MacdParams> = macd
                .triples()
                .into_iter()
                .map(|(f, s, sig)| MacdParams {
                    fast: vec![f],
                    slow: vec![s],
                    signal: vec![sig],
                })
                .collect();
            out = expand(out, &variants, |p, v| p.macd = Some(v.clone()));
        }

        if let Some(bb) = &self.bollinger {
            let mut variants = Vec::new();
            for &period in &bb.periods {
                for &std in &bb.std_dev {
                    variants.push(BollingerParams {
                        periods: vec![period],
                        std_dev: vec![std],
                    });
                }
            }
            out = expand(out, &variants, |p, v| p.bollinger = Some(v.clone()));
        }

        if let Some(atr) = &self.atr {
            let mut variants = Vec::new();
            for &period in &atr.periods {
                for &mult in &atr.stop_loss_multiplier {
                    variants.push(AtrParams {
                        periods: vec![period],
                        stop_loss_multiplier: vec![mult],
                    });
                }
            }
            out = expand(out, &variants, |p, v| p.atr = Some(v.clone()));
        }

        out.retain(|p| !p.is_empty());
        out
    }

    /// Number of entry rules the signal generator evaluates for these
    /// parameters.
    pub fn signal_rule_count(&self) -> usize {
        let rsi = self
            .rsi
            .as_ref()
            .map(|r| r.periods.len())
            .unwrap_or(0);
        let ema = self.ema.as_ref().map(|e| e.pairs().len()).unwrap_or(0);
        let macd = self.macd.as_ref().map(|m| m.triples().len()).unwrap_or(0);
        let bb = self
            .bollinger
            .as_ref()
            .map(|b| b.periods.len() * b.std_dev.len())
            .unwrap_or(0);
        rsi + ema + macd + bb
    }

    /// ATR period and stop multiplier used for stop distances (first
    /// candidates).
    pub fn atr_stop(&self) -> Option<(usize, f64)> {
        let atr = self.atr.as_ref()?;
        let period = *atr.periods.first()?;
        let mult = atr.stop_loss_multiplier.first().copied().unwrap_or(2.0);
        Some((period, mult))
    }

    /// Check every candidate value.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        fn periods_ok(name: &str, periods: &[usize]) -> Result<(), IndicatorError> {
            if periods.is_empty() {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} needs at least one period",
                    name
                )));
            }
            if periods.iter().any(|p| *p == 0) {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} periods must be positive",
                    name
                )));
            }
            Ok(())
        }

        if let Some(rsi) = &self.rsi {
            periods_ok("RSI", &rsi.periods)?;
            for &os in &rsi.oversold {
                for &ob in &rsi.overbought {
                    if !(0.0..=100.0).contains(&os) || !(0.0..=100.0).contains(&ob) || os >= ob {
                        return Err(IndicatorError::InvalidParameter(format!(
                            "RSI thresholds must satisfy 0 <= oversold < overbought <= 100, got {} / {}",
                            os, ob
                        )));
                    }
                }
            }
        }
        if let Some(ema) = &self.ema {
            periods_ok("EMA short", &ema.short_periods)?;
            periods_ok("EMA long", &ema.long_periods)?;
            if ema.pairs().is_empty() {
                return Err(IndicatorError::InvalidParameter(
                    "EMA needs a short period below a long period".to_string(),
                ));
            }
        }
        if let Some(macd) = &self.macd {
            periods_ok("MACD fast", &macd.fast)?;
            periods_ok("MACD slow", &macd.slow)?;
            periods_ok("MACD signal", &macd.signal)?;
            if macd.triples().is_empty() {
                return Err(IndicatorError::InvalidParameter(
                    "MACD needs a fast period below a slow period".to_string(),
                ));
            }
        }
        if let Some(bb) = &self.bollinger {
            periods_ok("Bollinger", &bb.periods)?;
            if bb.periods.iter().any(|p| *p < 2) {
                return Err(IndicatorError::InvalidParameter(
                    "Bollinger periods must be at least 2".to_string(),
                ));
            }
            if bb.std_dev.is_empty() || bb.std_dev.iter().any(|s| *s <= 0.0) {
                return Err(IndicatorError::InvalidParameter(
                    "Bollinger std_dev values must be positive".to_string(),
                ));
            }
        }
        if let Some(atr) = &self.atr {
            periods_ok("ATR", &atr.periods)?;
            if atr.stop_loss_multiplier.iter().any(|m| *m <= 0.0) {
                return Err(IndicatorError::InvalidParameter(
                    "ATR stop multipliers must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Compact description, e.g. `RSI(14,30,70) + MACD(12,26,9)`.
    pub fn describe(&self) -> String {
        fn list<T: fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("/")
        }

        let mut parts = Vec::new();
        if let Some(r) = &self.rsi {
            parts.push(format!(
                "RSI({},{},{})",
                list(&r.periods),
                list(&r.oversold),
                list(&r.overbought)
            ));
        }
        if let Some(e) = &self.ema {
            parts.push(format!(
                "EMA({},{})",
                list(&e.short_periods),
                list(&e.long_periods)
            ));
        }
        if let Some(m) = &self.macd {
            parts.push(format!(
                "MACD({},{},{})",
                list(&m.fast),
                list(&m.slow),
                list(&m.signal)
            ));
        }
        if let Some(b) = &self.bollinger {
            parts.push(format!("BB({},{})", list(&b.periods), list(&b.std_dev)));
        }
        if let Some(a) = &self.atr {
            parts.push(format!(
                "ATR({},x{})",
                list(&a.periods),
                list(&a.stop_loss_multiplier)
            ));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" + ")
        }
    }
}
