//! CSV ledgers: `signals.csv`, `trades.csv`, `nav.csv` and `summary.csv`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::domain::error::TraderError;
use crate::domain::metrics::SymbolSummary;
use crate::ports::report_port::{ReportRecord, ReportSink};

pub struct CsvReportSink {
    dir: PathBuf,
    signals: csv::Writer<File>,
    trades: csv::Writer<File>,
    nav: csv::Writer<File>,
}

impl CsvReportSink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, TraderError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut signals = csv::Writer::from_path(dir.join("signals.csv"))?;
        signals.write_record(["date", "symbol", "signal"])?;

        let mut trades = csv::Writer::from_path(dir.join("trades.csv"))?;
        trades.write_record([
            "date",
            "symbol",
            "side",
            "price",
            "quantity",
            "value",
            "commission",
            "cash_after",
        ])?;

        let mut nav = csv::Writer::from_path(dir.join("nav.csv"))?;
        nav.write_record(["date", "cash", "positions_value", "total_equity"])?;

        Ok(Self {
            dir,
            signals,
            trades,
            nav,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for CsvReportSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&mut self, record: &ReportRecord) -> Result<(), TraderError> {
        match record {
            ReportRecord::Signal {
                symbol,
                date,
                signal,
            } => self.signals.write_record([
                date.to_string(),
                symbol.clone(),
                signal.to_string(),
            ])?,
            ReportRecord::Trade(t) => self.trades.write_record([
                t.date.to_string(),
                t.symbol.clone(),
                t.side.to_string(),
                format!("{:.4}", t.price),
                t.quantity.to_string(),
                format!("{:.4}", t.value),
                format!("{:.4}", t.commission),
                format!("{:.4}", t.cash_after),
            ])?,
            ReportRecord::Nav(n) => self.nav.write_record([
                n.date.to_string(),
                format!("{:.4}", n.cash),
                format!("{:.4}", n.positions_value),
                format!("{:.4}", n.total_equity),
            ])?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TraderError> {
        self.signals.flush()?;
        self.trades.flush()?;
        self.nav.flush()?;
        Ok(())
    }
}

/// One row per symbol: portfolio share plus the standalone backtest.
pub fn write_symbol_summaries<P: AsRef<Path>>(
    path: P,
    summaries: &[SymbolSummary],
) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "symbol",
        "trades",
        "total_invested",
        "total_received",
        "realized_pnl",
        "shares",
        "position_value",
        "unrealized_pnl",
        "insufficient_history",
        "standalone_final_nav",
        "standalone_return_pct",
        "standalone_win_rate",
        "standalone_max_drawdown_pct",
        "standalone_avg_holding_days",
    ])?;
    for s in summaries {
        wtr.write_record([
            s.symbol.clone(),
            s.trade_count.to_string(),
            format!("{:.2}", s.total_invested),
            format!("{:.2}", s.total_received),
            format!("{:.2}", s.realized_pnl),
            s.shares.to_string(),
            format!("{:.2}", s.position_value),
            format!("{:.2}", s.unrealized_pnl),
            s.insufficient_history.to_string(),
            format!("{:.2}", s.standalone.final_value),
            format!("{:.2}", s.standalone.total_return_pct),
            format!("{:.4}", s.standalone.win_rate),
            format!("{:.2}", s.standalone.max_drawdown_pct),
            format!("{:.1}", s.standalone.avg_holding_days),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
