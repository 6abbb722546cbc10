//! Daily price point representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PricePoint {
    /// A close that can be traded and valued: finite and strictly positive.
    pub fn has_tradable_close(&self) -> bool {
        is_tradable_price(self.close)
    }

    /// Simple return against the previous close, or `None` if `prev_close` is unusable.
    pub fn return_since(&self, prev_close: f64) -> Option<f64> {
        if is_tradable_price(prev_close) {
            Some(self.close / prev_close - 1.0)
        } else {
            None
        }
    }
}

pub fn is_tradable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
