//! Open positions and completed round trips.

use chrono::NaiveDate;

/// A long holding in one symbol. At most one per symbol; mutated only by execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub avg_cost: f64,
    pub entry_date: NaiveDate,
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.avg_cost)
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.avg_cost
    }
}

/// A Buy paired with the Sell that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub symbol: String,
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Net of the entry and exit commissions.
    pub pnl: f64,
}

impl RoundTrip {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
