//! Day-by-day simulation loop and position management.
//!
//! A two-state machine per run: FLAT (no position) or HOLDING (exactly
//! one). Each trading day performs at most one transition: a held position
//! is offered to the sell tree first; only if the day started flat is the
//! buy tree consulted. Fills are instant at the day's close.

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate};

use crate::domain::account::Account;
use crate::domain::bar::Bar;
use crate::domain::error::RulesimError;
use crate::domain::position::{ClosedPosition, OpenPosition};
use crate::domain::rule_eval::{ensure_columns, evaluate_side, required_lookback};
use crate::domain::stats::Summary;
use crate::domain::strategy::Strategy;
use crate::domain::trigger::{EvalContext, TriggerRegistry};
use crate::domain::window::DataWindow;

/// Everything the reporting collaborators need from a finished run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub symbol: String,
    pub strategy: Strategy,
    pub elapsed: Duration,
    pub tradeable_days: usize,
    pub positions: Vec<ClosedPosition>,
    /// A position still held when the series ran out. Not part of the
    /// closed statistics.
    pub open_position: Option<OpenPosition>,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub summary: Summary,
}

fn epoch_date(secs: i64) -> Result<NaiveDate, RulesimError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| RulesimError::malformed(format!("timestamp {secs} out of range")))
}

/// Runs one full simulation: pre-pass, trim, day loop, statistics.
///
/// `bars` must span at least the strategy's lookback requirement before its
/// start timestamp; the pre-pass verifies this and fails with
/// `InsufficientData` otherwise.
pub fn run(
    symbol: &str,
    strategy: &Strategy,
    bars: &[Bar],
    initial_balance: f64,
    registry: &TriggerRegistry,
) -> Result<SimulationResult, RulesimError> {
    let started = Instant::now();

    let lookback = required_lookback(strategy, registry)?;
    let mut window = DataWindow::from_bars(bars);

    let start_date = epoch_date(strategy.start)?;
    let start_day = window
        .first_day_on_or_after(start_date)
        .ok_or(RulesimError::InsufficientData {
            bars: window.len(),
            minimum: lookback + 1,
        })?;
    if start_day < lookback {
        return Err(RulesimError::InsufficientData {
            bars: window.len(),
            minimum: lookback + (window.len() - start_day),
        });
    }

    // Indicator columns are computed over the full fetched range so their
    // warm-up is consumed by the lookback days, then the window is cut down
    // to the tradeable range.
    ensure_columns(strategy, registry, &mut window)?;
    window.trim_from(start_day)?;

    let mut account = Account::new(initial_balance);
    let mut open: Option<OpenPosition> = None;
    let mut positions: Vec<ClosedPosition> = Vec::new();

    for day in 0..window.len() {
        let close = window.point("close", day)?;
        let mut transitioned = false;

        if let Some(position) = open.take() {
            let ctx = EvalContext {
                registry,
                window: &window,
                position: Some(&position),
                day,
            };
            if evaluate_side(&strategy.sell, ctx)? {
                account.credit(position.value(close));
                positions.push(position.close(close, day));
                transitioned = true;
            } else {
                open = Some(position);
            }
        }

        // Re-entry on the day a position was closed is not permitted.
        if open.is_none() && !transitioned && account.balance() > 0.0 && close > 0.0 {
            let ctx = EvalContext {
                registry,
                window: &window,
                position: None,
                day,
            };
            if evaluate_side(&strategy.buy, ctx)? {
                let balance = account.balance();
                let shares = balance / close;
                account.debit(balance);
                open = Some(OpenPosition::open(close, shares, day));
            }
        }
    }

    let summary = Summary::from_positions(&positions);

    Ok(SimulationResult {
        symbol: symbol.to_string(),
        strategy: strategy.clone(),
        elapsed: started.elapsed(),
        tradeable_days: window.len(),
        positions,
        open_position: open,
        initial_balance,
        final_balance: account.balance(),
        summary,
    })
}
