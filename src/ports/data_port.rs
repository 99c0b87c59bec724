//! Price data access port trait.

use crate::domain::error::TradesimError;
use crate::domain::price_bar::PriceBar;
use chrono::{NaiveDate, NaiveDateTime};

pub trait PriceDataPort {
    /// Bars ordered by timestamp, restricted to the inclusive date range when
    /// bounds are given.
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, TradesimError>;

    /// First timestamp, last timestamp and bar count, or `None` when empty.
    fn data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        let bars = self.fetch_prices(None, None)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
