//! Reporting sink port: an append-only stream of run records.

use chrono::NaiveDate;

use crate::domain::error::TraderError;
use crate::domain::portfolio::NavPoint;
use crate::domain::signal::Signal;
use crate::domain::trade::Trade;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportRecord {
    Signal {
        symbol: String,
        date: NaiveDate,
        signal: Signal,
    },
    Trade(Trade),
    Nav(NavPoint),
}

impl ReportRecord {
    pub fn date(&self) -> NaiveDate {
        match self {
            ReportRecord::Signal { date, .. } => *date,
            ReportRecord::Trade(trade) => trade.date,
            ReportRecord::Nav(nav) => nav.date,
        }
    }
}

/// Delivery may fail; callers log and count failures rather than abort.
pub trait ReportSink {
    fn name(&self) -> &str;

    fn write(&mut self, record: &ReportRecord) -> Result<(), TraderError>;

    fn flush(&mut self) -> Result<(), TraderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Side;

    #[test]
    fn every_record_kind_carries_its_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let records = [
            ReportRecord::Signal {
                symbol: "SBIN".into(),
                date: day,
                signal: Signal::Buy,
            },
            ReportRecord::Trade(Trade {
                symbol: "SBIN".into(),
                date: day,
                side: Side::Buy,
                price: 600.0,
                quantity: 4,
                value: 2400.0,
                commission: 1.2,
                cash_after: 7598.8,
            }),
            ReportRecord::Nav(NavPoint {
                date: day,
                cash: 7598.8,
                positions_value: 2400.0,
                total_equity: 9998.8,
            }),
        ];
        assert!(records.iter().all(|r| r.date() == day));
    }
}
