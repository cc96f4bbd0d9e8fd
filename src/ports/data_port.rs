//! Price data access port trait.

use crate::domain::error::AutoquantError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` with `start_date <= date <= end_date`, sorted
    /// by date. An empty result is `DataUnavailable`.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AutoquantError>;

    fn list_symbols(&self) -> Result<Vec<String>, AutoquantError>;
}
