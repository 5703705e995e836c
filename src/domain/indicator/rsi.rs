//! RSI (Relative Strength Index), Wilder's smoothing.
//!
//! First average gain/loss is the simple mean over the first n changes;
//! subsequent averages use avg = (prev_avg * (n-1) + current) / n.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); 100 when avg_loss is zero.
//! The first n days are sentinel (n price changes are needed).

use crate::domain::indicator::round3;
use crate::domain::window::SENTINEL;

pub const DEFAULT_RSI_LENGTH: usize = 14;

pub fn rsi(length: usize, prices: &[f64]) -> Vec<f64> {
    if length == 0 || prices.len() < 2 {
        return vec![SENTINEL; prices.len()];
    }

    let mut values = Vec::with_capacity(prices.len());
    values.push(SENTINEL);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < length {
            avg_gain += gain;
            avg_loss += loss;
            values.push(SENTINEL);
            continue;
        }

        if i == length {
            avg_gain = (avg_gain + gain) / length as f64;
            avg_loss = (avg_loss + loss) / length as f64;
        } else {
            avg_gain = (avg_gain * (length - 1) as f64 + gain) / length as f64;
            avg_loss = (avg_loss * (length - 1) as f64 + loss) / length as f64;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        values.push(round3(rsi));
    }

    values
}
