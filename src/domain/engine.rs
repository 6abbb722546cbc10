//! Run orchestration: the single `run_backtest` entry point.
//!
//! Data ingestion happens first, per-symbol indicators and standalone
//! backtests run in parallel, the portfolio replay runs on one thread, and
//! the records are streamed to reporting sinks only after the replay ends.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::domain::backtest::{run_single, SingleAssetResult};
use crate::domain::config::RunConfig;
use crate::domain::error::TraderError;
use crate::domain::metrics::{drawdown_series, DrawdownPoint, PortfolioSummary, SymbolSummary};
use crate::domain::portfolio::{NavPoint, PortfolioManager, PortfolioState};
use crate::domain::position::{Position, RoundTrip};
use crate::domain::predictor::{fit_and_predict_next, LogisticRegression, Prediction};
use crate::domain::signal::{Signal, TaggedSignal};
use crate::domain::timeline::SymbolData;
use crate::domain::trade::Trade;
use crate::domain::universe::{load_universe, SkippedSymbol};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportRecord, ReportSink};

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub trade_log: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub open_positions: BTreeMap<String, Position>,
    pub nav_series: Vec<NavPoint>,
    pub drawdown_series: Vec<DrawdownPoint>,
    /// Drawdown of each symbol's standalone single-asset NAV.
    pub symbol_drawdowns: BTreeMap<String, Vec<DrawdownPoint>>,
    pub symbol_summaries: Vec<SymbolSummary>,
    pub summary: PortfolioSummary,
    /// Non-Hold signals in timeline order.
    pub signals: Vec<TaggedSignal>,
    pub skipped: Vec<SkippedSymbol>,
    pub sink_failures: usize,
}

pub fn run_backtest(
    config: &RunConfig,
    data_port: &dyn DataPort,
    sinks: &mut [&mut dyn ReportSink],
) -> Result<BacktestReport, TraderError> {
    config.validate()?;

    let load = load_universe(
        data_port,
        &config.symbols,
        config.start_date,
        config.end_date,
        config.indicators.longest_lookback(),
    )?;
    let insufficient: HashMap<String, bool> = load
        .loaded
        .iter()
        .map(|l| (l.symbol.clone(), l.insufficient_history))
        .collect();

    let params = config.indicators;
    let thresholds = config.thresholds;
    let series: BTreeMap<String, SymbolData> = load
        .loaded
        .into_par_iter()
        .map(|l| {
            let data = SymbolData::analyse(l.symbol.clone(), l.points, &params, &thresholds);
            (l.symbol, data)
        })
        .collect();

    let backtest_config = config.backtest();
    let standalone: BTreeMap<String, SingleAssetResult> = series
        .par_iter()
        .map(|(symbol, data)| {
            run_single(symbol, &data.points, &data.signals, &backtest_config)
                .map(|result| (symbol.clone(), result))
        })
        .collect::<Result<_, TraderError>>()?;

    let state = PortfolioManager::new(config.portfolio()).run(&series);

    let symbol_summaries = standalone
        .iter()
        .map(|(symbol, result)| {
            let flagged = insufficient.get(symbol).copied().unwrap_or(false);
            SymbolSummary::compute(symbol, &state, result, flagged)
        })
        .collect();
    let symbol_drawdowns = standalone
        .iter()
        .map(|(symbol, result)| (symbol.clone(), drawdown_series(&result.nav)))
        .collect();

    let records = build_records(&state, &series);
    let sink_failures = publish(&records, sinks);

    let signals = records
        .iter()
        .filter_map(|r| match r {
            ReportRecord::Signal {
                symbol,
                date,
                signal,
            } => Some(TaggedSignal {
                symbol: symbol.clone(),
                date: *date,
                signal: *signal,
            }),
            _ => None,
        })
        .collect();

    let summary = PortfolioSummary::compute(&state);
    info!(
        symbols = series.len(),
        skipped = load.skipped.len(),
        trades = state.trade_log.len(),
        final_value = summary.performance.final_value,
        total_return_pct = summary.performance.total_return_pct,
        max_drawdown_pct = summary.performance.max_drawdown_pct,
        "backtest complete"
    );

    Ok(BacktestReport {
        drawdown_series: drawdown_series(&state.nav_history),
        trade_log: state.trade_log,
        round_trips: state.round_trips,
        open_positions: state.positions,
        nav_series: state.nav_history,
        symbol_drawdowns,
        symbol_summaries,
        summary,
        signals,
        skipped: load.skipped,
        sink_failures,
    })
}

/// Signals, trades and NAV snapshots grouped by date, in timeline order.
pub fn build_records(
    state: &PortfolioState,
    series: &BTreeMap<String, SymbolData>,
) -> Vec<ReportRecord> {
    let mut records = Vec::new();
    let mut trades = state.trade_log.iter().peekable();

    for nav in &state.nav_history {
        for (symbol, data) in series {
            let signal = data.signal_at(nav.date);
            if signal != Signal::Hold {
                records.push(ReportRecord::Signal {
                    symbol: symbol.clone(),
                    date: nav.date,
                    signal,
                });
            }
        }
        while let Some(trade) = trades.next_if(|t| t.date == nav.date) {
            records.push(ReportRecord::Trade(trade.clone()));
        }
        records.push(ReportRecord::Nav(*nav));
    }

    records
}

/// Deliver `records` to every sink. Failures are logged and counted, never returned.
pub fn publish(records: &[ReportRecord], sinks: &mut [&mut dyn ReportSink]) -> usize {
    let mut failures = 0;
    for sink in sinks.iter_mut() {
        for record in records {
            if let Err(e) = sink.write(record) {
                warn!(sink = sink.name(), error = %e, "report sink write failed");
                failures += 1;
            }
        }
        if let Err(e) = sink.flush() {
            warn!(sink = sink.name(), error = %e, "report sink flush failed");
            failures += 1;
        }
    }
    failures
}

#[derive(Debug)]
pub struct SymbolPrediction {
    pub symbol: String,
    pub outcome: Result<Prediction, TraderError>,
}

/// Fit the next-day model per symbol. Per-symbol failures stay in `outcome`.
pub fn run_predictions(
    config: &RunConfig,
    data_port: &dyn DataPort,
) -> Result<Vec<SymbolPrediction>, TraderError> {
    config.validate()?;
    let load = load_universe(
        data_port,
        &config.symbols,
        config.start_date,
        config.end_date,
        0,
    )?;

    Ok(load
        .loaded
        .into_par_iter()
        .map(|l| {
            let mut model = LogisticRegression::new(config.model);
            let outcome = fit_and_predict_next(
                &mut model,
                &l.symbol,
                &l.points,
                config.indicators.rsi_period,
                config.model.validation_fraction,
            );
            if let Err(e) = &outcome {
                warn!(symbol = %l.symbol, error = %e, "prediction failed");
            }
            SymbolPrediction {
                symbol: l.symbol,
                outcome,
            }
        })
        .collect())
}
