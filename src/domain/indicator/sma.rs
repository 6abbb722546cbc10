//! Simple Moving Average: arithmetic mean of the last `n` closes.
//!
//! Warmup: first (n-1) observations are undefined.

use std::collections::VecDeque;

/// Carry state for incremental SMA computation: the last `n` closes.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaState {
    period: usize,
    window: VecDeque<f64>,
}

impl SmaState {
    pub fn new(period: usize) -> Self {
        SmaState {
            period,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn push(&mut self, close: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(close);
        if self.window.len() < self.period {
            return None;
        }
        // Summed front-to-back so the result matches `calculate_sma` exactly.
        Some(self.window.iter().sum::<f64>() / self.period as f64)
    }
}

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = vec![None; closes.len()];
    for (end, window) in closes.windows(period).enumerate() {
        values[end + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    values
}
