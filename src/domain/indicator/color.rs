//! Candle color series from open/close columns.

use crate::domain::bar::CandleColor;
use crate::domain::error::RulesimError;

/// Per-day candle color. Fails if the two columns differ in length.
pub fn candle_colors(open: &[f64], close: &[f64]) -> Result<Vec<CandleColor>, RulesimError> {
    if open.len() != close.len() {
        return Err(RulesimError::contract(format!(
            "open column has {} values, close has {}",
            open.len(),
            close.len()
        )));
    }
    Ok(open
        .iter()
        .zip(close.iter())
        .map(|(o, c)| CandleColor::of(*o, *c))
        .collect())
}
