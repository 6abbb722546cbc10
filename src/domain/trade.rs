//! Executed trades: the append-only ledger entries.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub date: NaiveDate,
    pub side: Side,
    pub price: f64,
    pub quantity: u64,
    /// price * quantity, before commission.
    pub value: f64,
    pub commission: f64,
    pub cash_after: f64,
}

impl Trade {
    /// Signed cash movement caused by this trade.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            Side::Buy => -(self.value + self.commission),
            Side::Sell => self.value - self.commission,
        }
    }
}
