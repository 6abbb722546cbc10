//! CSV price file adapter: one `<SYMBOL>.csv` per symbol.
//!
//! Expected header: `date,open,high,low,close,volume`.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn unavailable(symbol: &str, reason: String) -> TraderError {
    TraderError::DataUnavailable {
        symbol: symbol.to_string(),
        reason,
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<&'r str, TraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| unavailable(symbol, format!("missing {name} column")))
}

fn price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<f64, TraderError> {
    field(record, index, name, symbol)?
        .parse()
        .map_err(|e| unavailable(symbol, format!("invalid {name} value: {e}")))
}

fn volume(record: &csv::StringRecord, symbol: &str) -> Result<i64, TraderError> {
    let raw = field(record, 5, "volume", symbol)?;
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
        .map_err(|e| unavailable(symbol, format!("invalid volume value: {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, TraderError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| unavailable(symbol, format!("failed to read {}: {e}", path.display())))?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| unavailable(symbol, format!("CSV parse error: {e}")))?;

            let date_str = field(&record, 0, "date", symbol)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| unavailable(symbol, format!("invalid date format: {e}")))?;

            if date < start_date || date > end_date {
                continue;
            }

            points.push(PricePoint {
                symbol: symbol.to_string(),
                date,
                open: price(&record, 1, "open", symbol)?,
                high: price(&record, 2, "high", symbol)?,
                low: price(&record, 3, "low", symbol)?,
                close: price(&record, 4, "close", symbol)?,
                volume: volume(&record, symbol)?,
            });
        }

        // stable sort, so for repeated dates the later row wins
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        if deduped.is_empty() {
            return Err(unavailable(
                symbol,
                format!("no rows between {start_date} and {end_date}"),
            ));
        }

        debug!(%symbol, rows = deduped.len(), path = %path.display(), "price file read");
        Ok(deduped)
    }
}
