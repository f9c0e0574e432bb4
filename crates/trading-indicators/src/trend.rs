//! Trend strength indicators: ADX and CCI.

use serde::{Deserialize, Serialize};
use trading_core::types::Bar;

use crate::moving_average::wilder_smooth;

/// ADX output for one bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdxOutput {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Average Directional Index.
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Bars needed for the first value.
    pub fn period(&self) -> usize {
        2 * self.period
    }

    /// First output lines up with input index `2 * period - 1`.
    pub fn calculate(&self, bars: &[Bar]) -> Vec<AdxOutput> {
        if bars.len() < self.period() {
            return vec![];
        }

        let mut tr = Vec::with_capacity(bars.len() - 1);
        let mut plus_dm = Vec::with_capacity(bars.len() - 1);
        let mut minus_dm = Vec::with_capacity(bars.len() - 1);

        for w in bars.windows(2) {
            let (prev, cur) = (&w[0], &w[1]);
            let up = cur.high - prev.high;
            let down = prev.low - cur.low;
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
            tr.push(cur.true_range(Some(prev.close)));
        }

        let tr_s = wilder_smooth(&tr, self.period);
        let plus_s = wilder_smooth(&plus_dm, self.period);
        let minus_s = wilder_smooth(&minus_dm, self.period);

        let di: Vec<(f64, f64)> = tr_s
            .iter()
            .zip(plus_s.iter().zip(minus_s.iter()))
            .map(|(&t, (&p, &m))| {
                if t == 0.0 {
                    (0.0, 0.0)
                } else {
                    (100.0 * p / t, 100.0 * m / t)
                }
            })
            .collect();

        let dx: Vec<f64> = di
            .iter()
            .map(|&(p, m)| {
                let sum = p + m;
                if sum == 0.0 {
                    0.0
                } else {
                    100.0 * (p - m).abs() / sum
                }
            })
            .collect();

        let adx = wilder_smooth(&dx, self.period);
        let offset = self.period - 1;
        adx.iter()
            .zip(di[offset..].iter())
            .map(|(&adx, &(plus_di, minus_di))| AdxOutput {
                adx,
                plus_di,
                minus_di,
            })
            .collect()
    }
}

/// Commodity Channel Index on the typical price.
#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// First output lines up with input index `period - 1`.
    pub fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        if bars.len() < self.period {
            return vec![];
        }
        let tp: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();
        let n = self.period as f64;

        tp.windows(self.period)
            .map(|w| {
                let mean = w.iter().sum::<f64>() / n;
                let mean_dev = w.iter().map(|x| (x - mean).abs()).sum::<f64>() / n;
                let last = w[w.len() - 1];
                if mean_dev == 0.0 {
                    0.0
                } else {
                    (last - mean) / (0.015 * mean_dev)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize, step: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64 * step;
                Bar::new(i as i64, c, c + 1.0, c - 1.0, c, 1000.0)
            })
            .collect()
    }

    #[test]
    fn test_adx_strong_uptrend() {
        let adx = Adx::new(5);
        let bars = trending(30, 2.0);
        let result = adx.calculate(&bars);

        assert_eq!(result.len(), 30 - 10 + 1);
        let last = result.last().unwrap();
        assert!(last.plus_di > last.minus_di);
        assert!(last.adx > 90.0);
    }

    #[test]
    fn test_adx_insufficient() {
        assert!(Adx::new(14).calculate(&trending(20, 1.0)).is_empty());
    }

    #[test]
    fn test_cci_sign() {
        let cci = Cci::new(5);
        let up = cci.calculate(&trending(10, 1.0));
        assert_eq!(up.len(), 6);
        assert!(up.iter().all(|v| *v > 0.0));

        let flat = cci.calculate(&trending(10, 0.0));
        assert!(flat.iter().all(|v| *v == 0.0));
    }
}
