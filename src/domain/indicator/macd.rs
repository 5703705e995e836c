//! MACD line: EMA(12) minus EMA(26), day for day.

use crate::domain::indicator::{ema::ema, round3};
use crate::domain::window::{is_sentinel, SENTINEL};

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;

pub fn macd(prices: &[f64]) -> Vec<f64> {
    let fast = ema(MACD_FAST, prices);
    let slow = ema(MACD_SLOW, prices);

    fast.iter()
        .zip(slow.iter())
        .map(|(f, s)| {
            if is_sentinel(*f) || is_sentinel(*s) {
                SENTINEL
            } else {
                round3(f - s)
            }
        })
        .collect()
}
