//! Indicator engine: RSI and the short/long simple moving averages.
//!
//! Two equivalent entry points:
//! - [`compute_frames`]: one batch pass over a full price series
//! - [`IndicatorEngine::push`]: streaming, one close at a time, carrying
//!   [`RsiState`] and two [`SmaState`] windows
//!
//! Both produce bit-identical [`IndicatorFrame`] sequences.

pub mod ema;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;

use crate::domain::ohlcv::PricePoint;
use rsi::{calculate_rsi, RsiState};
use sma::{calculate_sma, SmaState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub sma_short: usize,
    pub sma_long: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: 14,
            sma_short: 20,
            sma_long: 50,
        }
    }
}

impl IndicatorParams {
    /// Observations needed before every indicator in a frame is defined.
    pub fn longest_lookback(&self) -> usize {
        (self.rsi_period + 1).max(self.sma_short).max(self.sma_long)
    }
}

/// Indicator values for one timestamp; `None` inside the warm-up window.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub date: NaiveDate,
    pub rsi: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
}

impl IndicatorFrame {
    pub fn is_complete(&self) -> bool {
        self.rsi.is_some() && self.sma_short.is_some() && self.sma_long.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    rsi: RsiState,
    short: SmaState,
    long: SmaState,
}

impl IndicatorEngine {
    pub fn new(params: &IndicatorParams) -> Self {
        IndicatorEngine {
            rsi: RsiState::new(params.rsi_period),
            short: SmaState::new(params.sma_short),
            long: SmaState::new(params.sma_long),
        }
    }

    pub fn push(&mut self, date: NaiveDate, close: f64) -> IndicatorFrame {
        IndicatorFrame {
            date,
            rsi: self.rsi.push(close),
            sma_short: self.short.push(close),
            sma_long: self.long.push(close),
        }
    }
}

pub fn compute_frames(points: &[PricePoint], params: &IndicatorParams) -> Vec<IndicatorFrame> {
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let rsi = calculate_rsi(&closes, params.rsi_period);
    let short = calculate_sma(&closes, params.sma_short);
    let long = calculate_sma(&closes, params.sma_long);

    points
        .iter()
        .enumerate()
        .map(|(i, p)| IndicatorFrame {
            date: p.date,
            rsi: rsi[i],
            sma_short: short[i],
            sma_long: long[i],
        })
        .collect()
}

pub fn stream_frames(points: &[PricePoint], params: &IndicatorParams) -> Vec<IndicatorFrame> {
    let mut engine = IndicatorEngine::new(params);
    points.iter().map(|p| engine.push(p.date, p.close)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_points(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                symbol: "TEST".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 / 4.0).sin() * 8.0 + (i as f64 / 11.0).cos() * 3.0)
            .collect()
    }

    #[test]
    fn frames_align_with_points() {
        let points = make_points(&wavy(60));
        let frames = compute_frames(&points, &IndicatorParams::default());
        assert_eq!(frames.len(), points.len());
        for (f, p) in frames.iter().zip(&points) {
            assert_eq!(f.date, p.date);
        }
    }

    #[test]
    fn warmup_windows() {
        let params = IndicatorParams {
            rsi_period: 3,
            sma_short: 2,
            sma_long: 5,
        };
        let frames = compute_frames(&make_points(&wavy(8)), &params);

        assert!(frames[0].sma_short.is_none());
        assert!(frames[1].sma_short.is_some());
        assert!(frames[2].rsi.is_none());
        assert!(frames[3].rsi.is_some());
        assert!(frames[3].sma_long.is_none());
        assert!(frames[4].is_complete());
        assert_eq!(params.longest_lookback(), 5);
    }

    #[test]
    fn batch_and_streaming_identical() {
        let points = make_points(&wavy(200));
        let params = IndicatorParams::default();
        assert_eq!(compute_frames(&points, &params), stream_frames(&points, &params));
    }

    #[test]
    fn computation_is_idempotent() {
        let points = make_points(&wavy(120));
        let params = IndicatorParams::default();
        assert_eq!(compute_frames(&points, &params), compute_frames(&points, &params));
    }

    #[test]
    fn flat_series_rsi_neutral_smas_equal() {
        let points = make_points(&[500.0; 80]);
        let frames = compute_frames(&points, &IndicatorParams::default());
        let last = frames.last().unwrap();
        assert_eq!(last.rsi, Some(50.0));
        assert_eq!(last.sma_short, Some(500.0));
        assert_eq!(last.sma_long, Some(500.0));
    }

    #[test]
    fn longest_lookback_rsi_dominates() {
        let params = IndicatorParams {
            rsi_period: 30,
            sma_short: 5,
            sma_long: 10,
        };
        assert_eq!(params.longest_lookback(), 31);
    }
}
