//! Portfolio Manager: shared-cash multi-symbol replay with an exposure cap
//! and a cash reserve.
//!
//! At every date of the unified timeline the manager
//! 1. marks each symbol that has a tradable close at that date,
//! 2. walks the symbols in lexicographic order, executing Sell signals
//!    unconditionally and sizing Buy signals against the current NAV,
//! 3. records one NAV snapshot.
//!
//! `PortfolioState` is owned by the single `run` call; nothing else mutates it.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

use super::execution::{enter_long, exit_position, EntryResult, ExecutionConfig};
use super::ohlcv::is_tradable_price;
use super::position::{Position, RoundTrip};
use super::signal::Signal;
use super::timeline::{build_unified_timeline, SymbolData};
use super::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub positions_value: f64,
    pub total_equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioConfig {
    pub initial_cash: f64,
    /// Maximum fraction of NAV held in a single symbol.
    pub exposure_cap: f64,
    /// Fraction of NAV that buys may not spend.
    pub cash_reserve: f64,
    pub execution: ExecutionConfig,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        PortfolioConfig {
            initial_cash: 1_000_000.0,
            exposure_cap: 0.25,
            cash_reserve: 0.10,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub initial_cash: f64,
    pub positions: BTreeMap<String, Position>,
    pub trade_log: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub nav_history: Vec<NavPoint>,
    last_close: HashMap<String, f64>,
}

impl PortfolioState {
    pub fn new(initial_cash: f64) -> Self {
        PortfolioState {
            cash: initial_cash,
            initial_cash,
            positions: BTreeMap::new(),
            trade_log: Vec::new(),
            round_trips: Vec::new(),
            nav_history: Vec::new(),
            last_close: HashMap::new(),
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Most recent tradable close seen for `symbol`.
    pub fn last_close(&self, symbol: &str) -> Option<f64> {
        self.last_close.get(symbol).copied()
    }

    pub fn mark(&mut self, symbol: &str, close: f64) {
        self.last_close.insert(symbol.to_string(), close);
    }

    /// Held shares valued at their last known close.
    pub fn position_value(&self, symbol: &str) -> f64 {
        match (self.positions.get(symbol), self.last_close(symbol)) {
            (Some(pos), Some(close)) => pos.market_value(close),
            _ => 0.0,
        }
    }

    pub fn positions_value(&self) -> f64 {
        self.positions
            .keys()
            .map(|symbol| self.position_value(symbol))
            .sum()
    }

    pub fn total_equity(&self) -> f64 {
        self.cash + self.positions_value()
    }

    pub fn record_nav(&mut self, date: NaiveDate) -> NavPoint {
        let positions_value = self.positions_value();
        let point = NavPoint {
            date,
            cash: self.cash,
            positions_value,
            total_equity: self.cash + positions_value,
        };
        self.nav_history.push(point);
        point
    }

    fn record_trade(&mut self, trade: Trade) {
        debug!(
            symbol = %trade.symbol,
            date = %trade.date,
            side = %trade.side,
            price = trade.price,
            quantity = trade.quantity,
            cash_after = trade.cash_after,
            "trade executed"
        );
        self.trade_log.push(trade);
    }
}

/// Why a Buy signal produced no trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuySkip {
    AlreadyLong,
    CapReached,
    ReserveBreached,
    InsufficientCapital,
}

#[derive(Debug, Clone)]
pub struct PortfolioManager {
    config: PortfolioConfig,
}

impl PortfolioManager {
    pub fn new(config: PortfolioConfig) -> Self {
        PortfolioManager { config }
    }

    pub fn run(&self, series: &BTreeMap<String, SymbolData>) -> PortfolioState {
        let mut state = PortfolioState::new(self.config.initial_cash);
        for date in build_unified_timeline(series) {
            self.step(&mut state, date, series);
        }
        state
    }

    /// Process every symbol at `date`, then snapshot NAV.
    pub fn step(
        &self,
        state: &mut PortfolioState,
        date: NaiveDate,
        series: &BTreeMap<String, SymbolData>,
    ) -> NavPoint {
        for (symbol, data) in series {
            if let Some(point) = data.point_at(date)
                && is_tradable_price(point.close)
            {
                state.mark(symbol, point.close);
            }
        }

        for (symbol, data) in series {
            let Some(point) = data.point_at(date) else {
                continue;
            };
            if !is_tradable_price(point.close) {
                trace!(%symbol, %date, close = point.close, "degenerate close, step skipped");
                continue;
            }
            match data.signal_at(date) {
                Signal::Buy => {
                    if let Err(reason) = self.try_buy(state, symbol, point.close, date) {
                        trace!(%symbol, %date, ?reason, "buy skipped");
                    }
                }
                Signal::Sell => self.sell(state, symbol, point.close, date),
                Signal::Hold => {}
            }
        }

        state.record_nav(date)
    }

    fn try_buy(
        &self,
        state: &mut PortfolioState,
        symbol: &str,
        price: f64,
        date: NaiveDate,
    ) -> Result<(), BuySkip> {
        if state.has_position(symbol) {
            return Err(BuySkip::AlreadyLong);
        }

        let nav = state.total_equity();
        let max_new_investment = self.config.exposure_cap * nav - state.position_value(symbol);
        if max_new_investment <= 0.0 {
            return Err(BuySkip::CapReached);
        }
        let spendable = state.cash - self.config.cash_reserve * nav;
        let budget = spendable.min(max_new_investment);
        if budget <= 0.0 {
            return Err(BuySkip::ReserveBreached);
        }

        match enter_long(
            &mut state.cash,
            symbol,
            price,
            date,
            budget,
            &self.config.execution,
        ) {
            EntryResult::Entered { position, trade } => {
                state.positions.insert(symbol.to_string(), position);
                state.record_trade(trade);
                Ok(())
            }
            EntryResult::InsufficientCapital => Err(BuySkip::InsufficientCapital),
        }
    }

    fn sell(&self, state: &mut PortfolioState, symbol: &str, price: f64, date: NaiveDate) {
        let Some(position) = state.positions.remove(symbol) else {
            return;
        };
        let exit = exit_position(&mut state.cash, position, price, date, &self.config.execution);
        state.round_trips.push(exit.round_trip);
        state.record_trade(exit.trade);
    }
}
