//! Momentum indicators.

use serde::{Deserialize, Serialize};
use trading_core::traits::{Indicator, MultiOutputIndicator};

use crate::moving_average::{wilder_smooth, Ema};

/// Relative Strength Index (RSI) with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Common periods are 9, 14 and 21.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let avg_gains = wilder_smooth(&gains, self.period);
        let avg_losses = wilder_smooth(&losses, self.period);

        avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if loss == 0.0 {
                    if gain == 0.0 {
                        50.0
                    } else {
                        100.0
                    }
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD output for one bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdOutput {
    /// Fast EMA minus slow EMA
    pub macd: f64,
    /// EMA of the MACD line
    pub signal: f64,
    pub histogram: f64,
}

/// Moving Average Convergence Divergence.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// Standard 12/26/9.
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        if data.len() < self.period() {
            return vec![];
        }

        let fast_ema = Ema::new(self.fast_period).calculate(data);
        let slow_ema = Ema::new(self.slow_period).calculate(data);

        // The fast EMA starts earlier; drop its head so both line up.
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period).calculate(&macd_line);

        let offset = self.signal_period - 1;
        macd_line[offset..]
            .iter()
            .zip(signal_line.iter())
            .map(|(&macd, &signal)| MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Stochastic oscillator output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochasticOutput {
    pub k: f64,
    /// SMA of %K
    pub d: f64,
}

/// Stochastic oscillator (%K / %D).
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Stochastic {
    /// Standard 14/3.
    pub fn new() -> Self {
        Self::with_periods(14, 3)
    }

    pub fn with_periods(k_period: usize, d_period: usize) -> Self {
        assert!(k_period > 0 && d_period > 0);
        Self { k_period, d_period }
    }

    pub fn period(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    pub fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<StochasticOutput> {
        let len = high.len().min(low.len()).min(close.len());
        if len < self.period() {
            return vec![];
        }

        let mut k_values = Vec::with_capacity(len - self.k_period + 1);
        for i in (self.k_period - 1)..len {
            let start = i + 1 - self.k_period;
            let highest = high[start..=i]
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest = low[start..=i].iter().cloned().fold(f64::INFINITY, f64::min);

            let range = highest - lowest;
            let k = if range == 0.0 {
                50.0
            } else {
                ((close[i] - lowest) / range) * 100.0
            };
            k_values.push(k);
        }

        let d_period_f64 = self.d_period as f64;
        ((self.d_period - 1)..k_values.len())
            .map(|i| {
                let d = k_values[(i + 1 - self.d_period)..=i].iter().sum::<f64>() / d_period_f64;
                StochasticOutput { k: k_values[i], d }
            })
            .collect()
    }
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate of change in percent over `period` values.
///
/// Applied to volume for the volume ROC column.
#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Roc {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }
        data[self.period..]
            .iter()
            .zip(data.iter())
            .map(|(&cur, &prev)| {
                if prev == 0.0 {
                    0.0
                } else {
                    (cur - prev) / prev * 100.0
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ROC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_bounded() {
        let rsi = Rsi::new(14);
        let data: Vec<f64> = (0..60)
            .map(|i| 4500.0 + (i as f64 * 0.4).sin() * 12.0)
            .collect();

        let result = rsi.calculate(&data);
        assert_eq!(result.len(), data.len() - 14);
        assert!(result.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn test_rsi_extremes() {
        let rsi = Rsi::new(5);
        let rising = rsi.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!((rising[0] - 100.0).abs() < 1e-10);

        let falling = rsi.calculate(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        assert!(falling[0].abs() < 1e-10);

        let flat = rsi.calculate(&[3.0; 8]);
        assert!((flat[0] - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_macd_alignment() {
        let macd = Macd::with_periods(3, 6, 4);
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = macd.calculate(&data);

        // 6 + 4 - 1 = 9 points of warm-up
        assert_eq!(result.len(), data.len() - 9 + 1);
        let last = result.last().unwrap();
        assert!(last.macd > 0.0);
        assert!((last.histogram - (last.macd - last.signal)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_insufficient_data() {
        let macd = Macd::new();
        assert!(macd.calculate(&[1.0; 30]).is_empty());
        assert!(!macd.calculate(&[1.0; 34]).is_empty());
    }

    #[test]
    fn test_stochastic_close_at_high() {
        let stoch = Stochastic::with_periods(5, 3);
        let high = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];
        let low = vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];

        let result = stoch.calculate_ohlc(&high, &low, &high);
        assert_eq!(result.len(), 8 - 7 + 1);
        assert!((result.last().unwrap().k - 100.0).abs() < 1e-10);
        assert!((result.last().unwrap().d - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_roc() {
        let roc = Roc::new(2);
        let result = roc.calculate(&[100.0, 50.0, 110.0, 100.0]);
        assert_eq!(result.len(), 2);
        assert!((result[0] - 10.0).abs() < 1e-10);
        assert!((result[1] - 100.0).abs() < 1e-10);
    }
}
