//! Report sink that emits every record as a structured `tracing` event.

use tracing::{debug, info};

use crate::domain::error::TraderError;
use crate::ports::report_port::{ReportRecord, ReportSink};

#[derive(Debug, Default)]
pub struct LogSink {
    written: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn write(&mut self, record: &ReportRecord) -> Result<(), TraderError> {
        let date = record.date();
        match record {
            ReportRecord::Signal { symbol, signal, .. } => info!(%symbol, %date, %signal, "signal"),
            ReportRecord::Trade(t) => info!(
                symbol = %t.symbol,
                %date,
                side = %t.side,
                price = t.price,
                quantity = t.quantity,
                commission = t.commission,
                cash_after = t.cash_after,
                "trade"
            ),
            ReportRecord::Nav(n) => debug!(
                %date,
                cash = n.cash,
                positions_value = n.positions_value,
                total_equity = n.total_equity,
                "nav"
            ),
        }
        self.written += 1;
        Ok(())
    }
}
