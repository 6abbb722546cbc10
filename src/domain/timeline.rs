//! Per-symbol series and the unified multi-symbol timeline.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::indicator::{compute_frames, IndicatorFrame, IndicatorParams};
use crate::domain::ohlcv::PricePoint;
use crate::domain::signal::{generate_signals, Signal, SignalThresholds};

/// One symbol's prices with indicator frames and signals aligned 1:1.
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub frames: Vec<IndicatorFrame>,
    pub signals: Vec<Signal>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl SymbolData {
    pub fn new(symbol: String, points: Vec<PricePoint>, signals: Vec<Signal>) -> Self {
        Self::with_frames(symbol, points, Vec::new(), signals)
    }

    fn with_frames(
        symbol: String,
        points: Vec<PricePoint>,
        frames: Vec<IndicatorFrame>,
        signals: Vec<Signal>,
    ) -> Self {
        let date_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Self {
            symbol,
            points,
            frames,
            signals,
            date_index,
        }
    }

    /// Run the indicator engine and signal generator over `points`.
    pub fn analyse(
        symbol: String,
        points: Vec<PricePoint>,
        params: &IndicatorParams,
        thresholds: &SignalThresholds,
    ) -> Self {
        let frames = compute_frames(&points, params);
        let signals = generate_signals(&frames, thresholds);
        Self::with_frames(symbol, points, frames, signals)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn point_at(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.index_of(date).map(|i| &self.points[i])
    }

    /// Signal at `date`; a date the symbol has no data for is Hold.
    pub fn signal_at(&self, date: NaiveDate) -> Signal {
        self.index_of(date)
            .and_then(|i| self.signals.get(i).copied())
            .unwrap_or(Signal::Hold)
    }
}

pub fn build_unified_timeline(series: &BTreeMap<String, SymbolData>) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .values()
        .flat_map(|sd| sd.points.iter().map(|p| p.date))
        .collect();
    unique_dates.into_iter().collect()
}
