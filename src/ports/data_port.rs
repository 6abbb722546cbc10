//! Price data source port.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Points for `symbol` within `[start_date, end_date]`, ascending by date.
    ///
    /// Fails with `DataUnavailable` when the range yields nothing.
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, TraderError>;
}
