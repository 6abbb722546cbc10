//! Threshold-and-crossover signal rules.
//!
//! BUY:  RSI < buy_rsi, or RSI < buy_cross_rsi and the short SMA crosses above the long SMA
//! SELL: RSI > sell_rsi, or RSI > sell_cross_rsi and the short SMA crosses below the long SMA
//!
//! A signal at `t` reads only the frames at `t` and `t-1`.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::indicator::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSignal {
    pub symbol: String,
    pub date: NaiveDate,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub buy_rsi: f64,
    pub buy_cross_rsi: f64,
    pub sell_cross_rsi: f64,
    pub sell_rsi: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        SignalThresholds {
            buy_rsi: 35.0,
            buy_cross_rsi: 45.0,
            sell_cross_rsi: 55.0,
            sell_rsi: 65.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish,
    Bearish,
    None,
}

pub fn detect_crossover(prev_short: f64, prev_long: f64, short: f64, long: f64) -> Crossover {
    if prev_short <= prev_long && short > long {
        Crossover::Bullish
    } else if prev_short >= prev_long && short < long {
        Crossover::Bearish
    } else {
        Crossover::None
    }
}

/// Signal for one step from the current and previous frame.
///
/// Hold whenever either frame is still inside a warm-up window.
pub fn generate_signal(
    prev: &IndicatorFrame,
    current: &IndicatorFrame,
    thresholds: &SignalThresholds,
) -> Signal {
    if !(prev.is_complete() && current.is_complete()) {
        return Signal::Hold;
    }
    let (Some(rsi), Some(short), Some(long), Some(prev_short), Some(prev_long)) = (
        current.rsi,
        current.sma_short,
        current.sma_long,
        prev.sma_short,
        prev.sma_long,
    ) else {
        return Signal::Hold;
    };

    let cross = detect_crossover(prev_short, prev_long, short, long);

    if rsi < thresholds.buy_rsi || (rsi < thresholds.buy_cross_rsi && cross == Crossover::Bullish)
    {
        Signal::Buy
    } else if rsi > thresholds.sell_rsi
        || (rsi > thresholds.sell_cross_rsi && cross == Crossover::Bearish)
    {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Signals aligned 1:1 with `frames`; the first step has no predecessor and is Hold.
pub fn generate_signals(frames: &[IndicatorFrame], thresholds: &SignalThresholds) -> Vec<Signal> {
    let mut signals = Vec::with_capacity(frames.len());
    if frames.is_empty() {
        return signals;
    }
    signals.push(Signal::Hold);
    for w in frames.windows(2) {
        signals.push(generate_signal(&w[0], &w[1], thresholds));
    }
    signals
}
