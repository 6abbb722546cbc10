//! Feature rows for the next-day direction model.
//!
//! Columns: daily return, RSI, MACD (EMA12 - EMA26), MACD signal (EMA9 of
//! MACD), 20-day volume z-score, 5- and 20-day momentum. Leading rows where
//! any column is undefined are dropped.

use chrono::NaiveDate;

use crate::domain::indicator::ema::{calculate_ema, calculate_ema_partial};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::ohlcv::PricePoint;

pub const FEATURE_NAMES: [&str; 7] = [
    "ret",
    "rsi",
    "macd",
    "macd_signal",
    "vol_z",
    "mom5",
    "mom20",
];

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const VOLUME_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub values: Vec<f64>,
}

pub fn make_features(points: &[PricePoint], rsi_period: usize) -> Vec<FeatureRow> {
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let volumes: Vec<f64> = points.iter().map(|p| p.volume as f64).collect();

    let rsi = calculate_rsi(&closes, rsi_period);
    let fast = calculate_ema(&closes, MACD_FAST);
    let slow = calculate_ema(&closes, MACD_SLOW);
    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let macd_signal = calculate_ema_partial(&macd, MACD_SIGNAL);
    let vol_z = volume_zscore(&volumes, VOLUME_WINDOW);

    (0..points.len())
        .filter_map(|i| {
            let values = vec![
                pct_change(points, i, 1)?,
                rsi[i]?,
                macd[i]?,
                macd_signal[i]?,
                vol_z[i],
                pct_change(points, i, 5)?,
                pct_change(points, i, 20)?,
            ];
            Some(FeatureRow {
                date: points[i].date,
                close: closes[i],
                values,
            })
        })
        .collect()
}

/// `true` where the next row's close is above this row's; one fewer than `rows`.
pub fn next_day_labels(rows: &[FeatureRow]) -> Vec<bool> {
    rows.windows(2).map(|w| w[1].close > w[0].close).collect()
}

fn pct_change(points: &[PricePoint], i: usize, lag: usize) -> Option<f64> {
    let prev = points.get(i.checked_sub(lag)?)?;
    points[i].return_since(prev.close)
}

/// Rolling z-score with population std; 0 inside the warm-up and when the
/// window is constant.
fn volume_zscore(volumes: &[f64], window: usize) -> Vec<f64> {
    (0..volumes.len())
        .map(|i| {
            if i + 1 < window {
                return 0.0;
            }
            let slice = &volumes[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
            let std = var.sqrt();
            if std > 0.0 {
                (volumes[i] - mean) / std
            } else {
                0.0
            }
        })
        .collect()
}
