//! Single-asset backtester: all-in / all-out replay of one symbol's signals.

use chrono::NaiveDate;

use super::error::TraderError;
use super::execution::{enter_long, exit_position, EntryResult, ExecutionConfig};
use super::ohlcv::{is_tradable_price, PricePoint};
use super::portfolio::NavPoint;
use super::position::{Position, RoundTrip};
use super::signal::Signal;
use super::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub execution: ExecutionConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 1_000_000.0,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleAssetResult {
    pub symbol: String,
    pub initial_cash: f64,
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    /// One point per input step.
    pub nav: Vec<NavPoint>,
}

impl SingleAssetResult {
    pub fn final_equity(&self) -> f64 {
        self.nav
            .last()
            .map(|p| p.total_equity)
            .unwrap_or(self.initial_cash)
    }
}

/// Replay `signals` against `points` (aligned 1:1).
///
/// A step with a degenerate close makes no trade and is valued at the last
/// tradable close.
pub fn run_single(
    symbol: &str,
    points: &[PricePoint],
    signals: &[Signal],
    config: &BacktestConfig,
) -> Result<SingleAssetResult, TraderError> {
    if points.len() != signals.len() {
        return Err(TraderError::invalid(
            "signals",
            format!(
                "{} signals for {} price points of {symbol}",
                signals.len(),
                points.len()
            ),
        ));
    }

    let mut cash = config.initial_cash;
    let mut position: Option<Position> = None;
    let mut trades = Vec::new();
    let mut round_trips = Vec::new();
    let mut nav = Vec::with_capacity(points.len());
    let mut last_close: Option<f64> = None;

    for (point, &signal) in points.iter().zip(signals) {
        if is_tradable_price(point.close) {
            last_close = Some(point.close);
            step(
                &mut cash,
                &mut position,
                &mut trades,
                &mut round_trips,
                symbol,
                point.close,
                point.date,
                signal,
                &config.execution,
            );
        }

        let positions_value = match (&position, last_close) {
            (Some(pos), Some(close)) => pos.market_value(close),
            _ => 0.0,
        };
        nav.push(NavPoint {
            date: point.date,
            cash,
            positions_value,
            total_equity: cash + positions_value,
        });
    }

    Ok(SingleAssetResult {
        symbol: symbol.to_string(),
        initial_cash: config.initial_cash,
        cash,
        position,
        trades,
        round_trips,
        nav,
    })
}

#[allow(clippy::too_many_arguments)]
fn step(
    cash: &mut f64,
    position: &mut Option<Position>,
    trades: &mut Vec<Trade>,
    round_trips: &mut Vec<RoundTrip>,
    symbol: &str,
    price: f64,
    date: NaiveDate,
    signal: Signal,
    execution: &ExecutionConfig,
) {
    match (signal, position.take()) {
        (Signal::Buy, None) => {
            let budget = *cash;
            if let EntryResult::Entered { position: opened, trade } =
                enter_long(cash, symbol, price, date, budget, execution)
            {
                *position = Some(opened);
                trades.push(trade);
            }
        }
        (Signal::Sell, Some(held)) => {
            let exit = exit_position(cash, held, price, date, execution);
            trades.push(exit.trade);
            round_trips.push(exit.round_trip);
        }
        (_, held) => *position = held,
    }
}
