//! Indicator columns aligned to a bar series.

use std::collections::BTreeMap;
use trading_core::traits::{Indicator, MultiOutputIndicator};
use trading_core::types::BarSeries;

use crate::levels::{rolling_max, rolling_min, PivotLevels};
use crate::momentum::{Macd, Roc, Rsi, Stochastic};
use crate::moving_average::{Ema, Sma};
use crate::params::IndicatorParams;
use crate::trend::{Adx, Cci};
use crate::volatility::{Atr, BollingerBands};
use crate::volume::{mfi, obv, vwap};

/// Column names.
pub mod keys {
    pub fn sma(period: usize) -> String {
        format!("SMA_{}", period)
    }

    pub fn ema(period: usize) -> String {
        format!("EMA_{}", period)
    }

    pub fn rsi(period: usize) -> String {
        format!("RSI_{}", period)
    }

    pub fn macd(fast: usize, slow: usize, signal: usize) -> String {
        format!("MACD_{}_{}_{}", fast, slow, signal)
    }

    pub fn macd_signal(fast: usize, slow: usize, signal: usize) -> String {
        format!("MACD_signal_{}_{}_{}", fast, slow, signal)
    }

    pub fn macd_hist(fast: usize, slow: usize, signal: usize) -> String {
        format!("MACD_hist_{}_{}_{}", fast, slow, signal)
    }

    pub fn bb_upper(period: usize, std: f64) -> String {
        format!("BB_upper_{}_{}", period, std)
    }

    pub fn bb_middle(period: usize, std: f64) -> String {
        format!("BB_middle_{}_{}", period, std)
    }

    pub fn bb_lower(period: usize, std: f64) -> String {
        format!("BB_lower_{}_{}", period, std)
    }

    pub fn bb_bandwidth(period: usize, std: f64) -> String {
        format!("BB_bandwidth_{}_{}", period, std)
    }

    pub fn bb_percent(period: usize, std: f64) -> String {
        format!("BB_percent_{}_{}", period, std)
    }

    pub fn atr(period: usize) -> String {
        format!("ATR_{}", period)
    }

    pub const STOCH_K: &str = "Stoch_K_14";
    pub const STOCH_D: &str = "Stoch_D_14";
    pub const OBV: &str = "OBV";
    pub const VWAP: &str = "VWAP";
    pub const VOLUME_ROC: &str = "VROC_10";
    pub const MFI: &str = "MFI_14";
    pub const ADX: &str = "ADX_14";
    pub const PLUS_DI: &str = "DI_plus_14";
    pub const MINUS_DI: &str = "DI_minus_14";
    pub const CCI: &str = "CCI_20";
    pub const RESISTANCE: &str = "Resistance_20";
    pub const SUPPORT: &str = "Support_20";
    pub const PIVOT: &str = "Pivot";
    pub const R1: &str = "R1";
    pub const S1: &str = "S1";
    pub const R2: &str = "R2";
    pub const S2: &str = "S2";
    pub const HL2: &str = "HL2";
    pub const HLC3: &str = "HLC3";
    pub const OHLC4: &str = "OHLC4";
}

/// Named indicator columns, each exactly as long as the source series.
/// Warm-up positions hold `None`.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    len: usize,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorFrame {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            columns: BTreeMap::new(),
        }
    }

    /// Columns for every candidate in `params`, plus SMA 20/50/200.
    pub fn compute(series: &BarSeries, params: &IndicatorParams) -> Self {
        let mut frame = Self::new(series.len());
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        for period in [20, 50, 200] {
            frame.insert_aligned(keys::sma(period), Sma::new(period).calculate(&closes));
        }

        if let Some(rsi) = &params.rsi {
            for &period in &rsi.periods {
                frame.insert_aligned(keys::rsi(period), Rsi::new(period).calculate(&closes));
            }
        }

        if let Some(ema) = &params.ema {
            for &period in ema.short_periods.iter().chain(ema.long_periods.iter()) {
                if !frame.contains(&keys::ema(period)) {
                    frame.insert_aligned(keys::ema(period), Ema::new(period).calculate(&closes));
                }
            }
        }

        if let Some(macd) = &params.macd {
            for (fast, slow, signal) in macd.triples() {
                let out = Macd::with_periods(fast, slow, signal).calculate(&closes);
                frame.insert_aligned(
                    keys::macd(fast, slow, signal),
                    out.iter().map(|o| o.macd).collect(),
                );
                frame.insert_aligned(
                    keys::macd_signal(fast, slow, signal),
                    out.iter().map(|o| o.signal).collect(),
                );
                frame.insert_aligned(
                    keys::macd_hist(fast, slow, signal),
                    out.iter().map(|o| o.histogram).collect(),
                );
            }
        }

        if let Some(bb) = &params.bollinger {
            for &period in &bb.periods {
                if period < 2 {
                    continue;
                }
                for &std in &bb.std_dev {
                    if std <= 0.0 {
                        continue;
                    }
                    frame.insert_bollinger(&closes, period, std);
                }
            }
        }

        if let Some(atr) = &params.atr {
            for &period in &atr.periods {
                frame.insert_aligned(
                    keys::atr(period),
                    Atr::new(period).calculate_ohlc(&highs, &lows, &closes),
                );
            }
        }

        frame
    }

    /// The fixed overview columns (oscillators, volume, trend, levels and
    /// price averages) added on top of `compute`.
    pub fn with_overview(mut self, series: &BarSeries) -> Self {
        let bars = series.bars();
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        let stoch = Stochastic::new().calculate_ohlc(&highs, &lows, &closes);
        self.insert_aligned(keys::STOCH_K, stoch.iter().map(|s| s.k).collect());
        self.insert_aligned(keys::STOCH_D, stoch.iter().map(|s| s.d).collect());

        self.insert_aligned(keys::OBV, obv(bars));
        self.insert(keys::VWAP, vwap(bars, series.timeframe.is_intraday()));
        self.insert_aligned(keys::VOLUME_ROC, Roc::new(10).calculate(&series.volumes()));
        self.insert_aligned(keys::MFI, mfi(bars, 14));

        let adx = Adx::new(14).calculate(bars);
        self.insert_aligned(keys::ADX, adx.iter().map(|a| a.adx).collect());
        self.insert_aligned(keys::PLUS_DI, adx.iter().map(|a| a.plus_di).collect());
        self.insert_aligned(keys::MINUS_DI, adx.iter().map(|a| a.minus_di).collect());
        self.insert_aligned(keys::CCI, Cci::new(20).calculate(bars));

        self.insert_aligned(keys::RESISTANCE, rolling_max(&highs, 20));
        self.insert_aligned(keys::SUPPORT, rolling_min(&lows, 20));

        let pivots: Vec<PivotLevels> = bars.iter().map(PivotLevels::from_bar).collect();
        self.insert_aligned(keys::PIVOT, pivots.iter().map(|p| p.pivot).collect());
        self.insert_aligned(keys::R1, pivots.iter().map(|p| p.r1).collect());
        self.insert_aligned(keys::S1, pivots.iter().map(|p| p.s1).collect());
        self.insert_aligned(keys::R2, pivots.iter().map(|p| p.r2).collect());
        self.insert_aligned(keys::S2, pivots.iter().map(|p| p.s2).collect());

        self.insert_aligned(keys::HL2, bars.iter().map(|b| b.hl2()).collect());
        self.insert_aligned(keys::HLC3, bars.iter().map(|b| b.hlc3()).collect());
        self.insert_aligned(keys::OHLC4, bars.iter().map(|b| b.ohlc4()).collect());

        self
    }

    fn insert_bollinger(&mut self, closes: &[f64], period: usize, std: f64) {
        let out = BollingerBands::with_params(period, std).calculate(closes);
        self.insert_aligned(keys::bb_upper(period, std), out.iter().map(|o| o.upper).collect());
        self.insert_aligned(keys::bb_middle(period, std), out.iter().map(|o| o.middle).collect());
        self.insert_aligned(keys::bb_lower(period, std), out.iter().map(|o| o.lower).collect());
        self.insert_aligned(
            keys::bb_bandwidth(period, std),
            out.iter().map(|o| o.bandwidth).collect(),
        );
        self.insert_aligned(
            keys::bb_percent(period, std),
            out.iter().map(|o| o.percent_b).collect(),
        );
    }

    /// Insert a trailing-aligned indicator output, padding the head with
    /// `None`. Values longer than the frame keep their last `len` entries.
    pub fn insert_aligned(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let column = if values.len() >= self.len {
            values[values.len() - self.len..]
                .iter()
                .map(|v| Some(*v))
                .collect()
        } else {
            let pad = self.len - values.len();
            std::iter::repeat(None)
                .take(pad)
                .chain(values.into_iter().map(Some))
                .collect()
        };
        self.columns.insert(name.into(), column);
    }

    /// Insert a column that is already one value per bar.
    pub fn insert(&mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) {
        values.resize(self.len, None);
        self.columns.insert(name.into(), values);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Value of `name` at bar `i`, `None` during warm-up or when absent.
    pub fn value(&self, name: &str, i: usize) -> Option<f64> {
        self.columns.get(name)?.get(i).copied().flatten()
    }

    /// Value on the last bar.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.len.checked_sub(1).and_then(|i| self.value(name, i))
    }

    /// Value `n` bars before the last one.
    pub fn back(&self, name: &str, n: usize) -> Option<f64> {
        self.len
            .checked_sub(1 + n)
            .and_then(|i| self.value(name, i))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
