//! Trade execution: quantity sizing, commission, and cash settlement.
//!
//! Shared by the single-asset backtester and the portfolio manager. Cash is
//! only ever mutated here.

use chrono::NaiveDate;

use super::ohlcv::is_tradable_price;
use super::position::{Position, RoundTrip};
use super::trade::{Side, Trade};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of trade value charged per side.
    pub commission_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.0005,
        }
    }
}

pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_rate
}

/// Whole shares purchasable with `budget` once commission is included.
///
/// quantity = floor(budget / (price * (1 + rate))), stepped down if rounding
/// would push value + commission above the budget.
pub fn affordable_quantity(budget: f64, price: f64, config: &ExecutionConfig) -> u64 {
    if budget.is_nan() || budget <= 0.0 || !is_tradable_price(price) {
        return 0;
    }
    let unit_cost = price * (1.0 + config.commission_rate);
    let raw = (budget / unit_cost).floor();
    if !raw.is_finite() || raw < 1.0 {
        return 0;
    }
    let mut quantity = raw as u64;
    while quantity > 0 && total_cost(price, quantity, config) > budget {
        quantity -= 1;
    }
    quantity
}

fn total_cost(price: f64, quantity: u64, config: &ExecutionConfig) -> f64 {
    let value = price * quantity as f64;
    value + calculate_commission(value, config)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { position: Position, trade: Trade },
    InsufficientCapital,
}

/// Open a long position spending at most `budget` (never more than `cash`).
pub fn enter_long(
    cash: &mut f64,
    symbol: &str,
    price: f64,
    date: NaiveDate,
    budget: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    let budget = budget.min(*cash);
    let quantity = affordable_quantity(budget, price, config);
    if quantity == 0 {
        return EntryResult::InsufficientCapital;
    }

    let value = price * quantity as f64;
    let commission = calculate_commission(value, config);
    *cash -= value + commission;

    let position = Position {
        symbol: symbol.to_string(),
        shares: quantity,
        avg_cost: price,
        entry_date: date,
        entry_commission: commission,
    };
    let trade = Trade {
        symbol: symbol.to_string(),
        date,
        side: Side::Buy,
        price,
        quantity,
        value,
        commission,
        cash_after: *cash,
    };

    EntryResult::Entered { position, trade }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub trade: Trade,
    pub round_trip: RoundTrip,
}

/// Liquidate the whole position at `price`; proceeds minus commission go to cash.
pub fn exit_position(
    cash: &mut f64,
    position: Position,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> ExitResult {
    let value = position.market_value(price);
    let commission = calculate_commission(value, config);
    *cash += value - commission;

    let pnl = value - position.cost_basis() - position.entry_commission - commission;

    let trade = Trade {
        symbol: position.symbol.clone(),
        date,
        side: Side::Sell,
        price,
        quantity: position.shares,
        value,
        commission,
        cash_after: *cash,
    };
    let round_trip = RoundTrip {
        symbol: position.symbol,
        quantity: position.shares,
        entry_price: position.avg_cost,
        exit_price: price,
        entry_date: position.entry_date,
        exit_date: date,
        pnl,
    };

    ExitResult { trade, round_trip }
}
