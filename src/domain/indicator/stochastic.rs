//! Stochastic oscillator %K.
//!
//! %K = (close - min(low_window)) / (max(high_window) - min(low_window)) * 100
//! over the trailing `length`-day window, widening before `length` days are
//! available. A flat window (max high == min low) yields the sentinel.

use crate::domain::indicator::round3;
use crate::domain::window::SENTINEL;

pub const DEFAULT_STOCHASTIC_LENGTH: usize = 14;

pub fn stochastic(length: usize, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    if length == 0 {
        return vec![SENTINEL; close.len()];
    }

    let mut values = Vec::with_capacity(close.len());

    for i in 0..close.len() {
        let start = (i + 1).saturating_sub(length);
        let window_high = high[start..=i].iter().cloned().fold(f64::MIN, f64::max);
        let window_low = low[start..=i].iter().cloned().fold(f64::MAX, f64::min);
        let range = window_high - window_low;

        if range == 0.0 {
            values.push(SENTINEL);
        } else {
            values.push(round3((close[i] - window_low) / range * 100.0));
        }
    }

    values
}
