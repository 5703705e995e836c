//! Performance statistics over the closed-position list.
//!
//! [`Summary`] is a write-once aggregate: it is constructed from the final
//! position list after the simulation loop ends, so no metric can be
//! cached against a half-finished run. All values are rounded to 3 decimal
//! places; every metric defaults to 0.0 when there are no closed trades.

use crate::domain::indicator::round3;
use crate::domain::position::ClosedPosition;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_trades: usize,
    /// Percentage of closed trades with non-negative profit.
    pub effectiveness: f64,
    pub total_pl: f64,
    pub average_pl: f64,
    pub median_pl: f64,
    pub stddev_pl: f64,
    pub total_pl_pct: f64,
    pub average_pl_pct: f64,
    pub median_pl_pct: f64,
    pub stddev_pl_pct: f64,
    /// Mean holding time in trading days.
    pub average_duration_days: f64,
}

impl Summary {
    pub fn from_positions(positions: &[ClosedPosition]) -> Self {
        let pl: Vec<f64> = positions.iter().map(|p| p.lifetime_pl()).collect();
        let pl_pct: Vec<f64> = positions.iter().map(|p| p.lifetime_pl_pct()).collect();

        let total_trades = positions.len();
        let effectiveness = if total_trades == 0 {
            0.0
        } else {
            let wins = pl.iter().filter(|v| **v >= 0.0).count();
            round3(wins as f64 / total_trades as f64 * 100.0)
        };

        let average_duration_days = if total_trades == 0 {
            0.0
        } else {
            let total: usize = positions.iter().map(|p| p.duration_days()).sum();
            round3(total as f64 / total_trades as f64)
        };

        Summary {
            total_trades,
            effectiveness,
            total_pl: round3(pl.iter().sum()),
            average_pl: mean(&pl),
            median_pl: median(&pl),
            stddev_pl: population_stddev(&pl),
            total_pl_pct: round3(pl_pct.iter().sum()),
            average_pl_pct: mean(&pl_pct),
            median_pl_pct: median(&pl_pct),
            stddev_pl_pct: population_stddev(&pl_pct),
            average_duration_days,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round3(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    round3(median)
}

fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    round3(variance.sqrt())
}
