//! Historical bar access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::RulesimError;
use chrono::NaiveDate;

/// Supplies the daily bar history a simulation consumes. Implementations
/// must return bars in ascending date order.
pub trait DataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, RulesimError>;
}
