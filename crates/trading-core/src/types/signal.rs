//! Trading signals.

use serde::{Deserialize, Serialize};

use super::Direction;

/// An entry signal on a single bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: i64,
    pub direction: Direction,
    /// Number of confirming rules that fired on this bar
    pub strength: u32,
    pub stop_distance: f64,
    pub take_profit_distance: f64,
}

/// Per-bar signal columns aligned with the bar series they were built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalFrame {
    pub tradable: Vec<bool>,
    pub long_strength: Vec<u32>,
    pub short_strength: Vec<u32>,
    pub long_signal: Vec<bool>,
    pub short_signal: Vec<bool>,
    pub stop_distance: Vec<Option<f64>>,
    pub take_profit_distance: Vec<Option<f64>>,
}

impl SignalFrame {
    /// Empty columns for `len` bars.
    pub fn with_len(len: usize) -> Self {
        Self {
            tradable: vec![false; len],
            long_strength: vec![0; len],
            short_strength: vec![0; len],
            long_signal: vec![false; len],
            short_signal: vec![false; len],
            stop_distance: vec![None; len],
            take_profit_distance: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.long_signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_signal.is_empty()
    }

    /// Direction to enter on bar `i`, if a signal switched on there.
    ///
    /// Only the first bar of a run of consecutive signals counts.
    pub fn entry_at(&self, i: usize) -> Option<Direction> {
        if i == 0 || i >= self.len() {
            return None;
        }
        if self.long_signal[i] && !self.long_signal[i - 1] {
            Some(Direction::Long)
        } else if self.short_signal[i] && !self.short_signal[i - 1] {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Collect every bar with an active signal and known exit distances.
    pub fn signals(&self, timestamps: &[i64]) -> Vec<Signal> {
        let mut out = Vec::new();
        for (i, &ts) in timestamps.iter().enumerate().take(self.len()) {
            let direction = if self.long_signal[i] {
                Direction::Long
            } else if self.short_signal[i] {
                Direction::Short
            } else {
                continue;
            };
            let (Some(stop), Some(target)) = (self.stop_distance[i], self.take_profit_distance[i])
            else {
                continue;
            };
            let strength = match direction {
                Direction::Long => self.long_strength[i],
                Direction::Short => self.short_strength[i],
            };
            out.push(Signal {
                timestamp: ts,
                direction,
                strength,
                stop_distance: stop,
                take_profit_distance: target,
            });
        }
        out
    }

    pub fn long_count(&self) -> usize {
        self.long_signal.iter().filter(|s| **s).count()
    }

    pub fn short_count(&self) -> usize {
        self.short_signal.iter().filter(|s| **s).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_requires_rising_edge() {
        let mut frame = SignalFrame::with_len(5);
        frame.long_signal = vec![false, true, true, false, false];
        frame.short_signal = vec![false, false, false, false, true];

        assert_eq!(frame.entry_at(0), None);
        assert_eq!(frame.entry_at(1), Some(Direction::Long));
        assert_eq!(frame.entry_at(2), None);
        assert_eq!(frame.entry_at(4), Some(Direction::Short));
        assert_eq!(frame.entry_at(9), None);
    }

    #[test]
    fn test_signals_skip_missing_distances() {
        let mut frame = SignalFrame::with_len(3);
        frame.long_signal = vec![true, false, true];
        frame.long_strength = vec![2, 0, 3];
        frame.stop_distance = vec![None, None, Some(4.0)];
        frame.take_profit_distance = vec![None, None, Some(8.0)];

        let signals = frame.signals(&[10, 20, 30]);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].timestamp, 30);
        assert_eq!(signals[0].strength, 3);
        assert_eq!(frame.long_count(), 2);
        assert_eq!(frame.short_count(), 0);
    }
}
