#![allow(dead_code)]

use chrono::NaiveDate;
use rsitrader::domain::config::RunConfig;
use rsitrader::domain::error::TraderError;
use rsitrader::domain::indicator::IndicatorParams;
pub use rsitrader::domain::ohlcv::PricePoint;
use rsitrader::domain::predictor::ModelParams;
use rsitrader::domain::signal::SignalThresholds;
use rsitrader::ports::data_port::DataPort;
use rsitrader::ports::report_port::{ReportRecord, ReportSink};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let points: Vec<PricePoint> = self
            .data
            .get(symbol)
            .map(|ps| {
                ps.iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if points.is_empty() {
            return Err(TraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no rows in range".to_string(),
            });
        }
        Ok(points)
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<ReportRecord>,
    pub flushed: bool,
}

impl ReportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&mut self, record: &ReportRecord) -> Result<(), TraderError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TraderError> {
        self.flushed = true;
        Ok(())
    }
}

pub struct FailingSink;

impl ReportSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn write(&mut self, _record: &ReportRecord) -> Result<(), TraderError> {
        Err(TraderError::Sink {
            reason: "connection refused".to_string(),
        })
    }

    fn flush(&mut self) -> Result<(), TraderError> {
        Err(TraderError::Sink {
            reason: "connection refused".to_string(),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(symbol: &str, date: NaiveDate, close: f64) -> PricePoint {
    PricePoint {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: (close - 1.0).max(0.01),
        close,
        volume: 1000,
    }
}

/// One point per calendar day starting at `start`.
pub fn points_from_closes(symbol: &str, start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_point(symbol, start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Oscillating series that crosses RSI thresholds in both directions.
pub fn wave_closes(count: usize, base: f64, amplitude: f64, period: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect()
}

pub fn sample_config(symbols: &[&str], initial_cash: f64) -> RunConfig {
    RunConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        start_date: date(2023, 1, 1),
        end_date: date(2024, 12, 31),
        initial_cash,
        commission_rate: 0.0005,
        indicators: IndicatorParams::default(),
        thresholds: SignalThresholds::default(),
        exposure_cap: 0.25,
        cash_reserve: 0.10,
        data_dir: PathBuf::from("data"),
        output_dir: PathBuf::from("reports"),
        predictor_enabled: false,
        model: ModelParams::default(),
    }
}

/// Small windows so short fixtures get past warm-up.
pub fn fast_indicators() -> IndicatorParams {
    IndicatorParams {
        rsi_period: 3,
        sma_short: 2,
        sma_long: 4,
    }
}
