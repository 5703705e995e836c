//! Plain-text report adapter implementing ReportPort.

use std::fmt::Write as _;
use std::fs;

use crate::domain::error::RulesimError;
use crate::domain::simulation::SimulationResult;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

pub fn render(result: &SimulationResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();

    let _ = writeln!(out, "symbol: {}", result.symbol);
    let _ = writeln!(out, "tradeable days: {}", result.tradeable_days);
    let _ = writeln!(out, "elapsed: {:?}", result.elapsed);
    let _ = writeln!(out, "initial balance: {:.2}", result.initial_balance);
    let _ = writeln!(out, "final balance: {:.2}", result.final_balance);
    let _ = writeln!(out);

    let _ = writeln!(out, "trades: {}", summary.total_trades);
    let _ = writeln!(out, "effectiveness: {}%", summary.effectiveness);
    let _ = writeln!(
        out,
        "P/L        total {} / avg {} / median {} / stddev {}",
        summary.total_pl, summary.average_pl, summary.median_pl, summary.stddev_pl
    );
    let _ = writeln!(
        out,
        "P/L %      total {} / avg {} / median {} / stddev {}",
        summary.total_pl_pct,
        summary.average_pl_pct,
        summary.median_pl_pct,
        summary.stddev_pl_pct
    );
    let _ = writeln!(
        out,
        "avg trade duration: {} days",
        summary.average_duration_days
    );

    if let Some(open) = &result.open_position {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "still holding: {:.4} shares bought at {:.2} (day {})",
            open.shares, open.buy_price, open.buy_day
        );
    }

    if !result.positions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "closed positions:");
        for (i, p) in result.positions.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3}. day {:>4} -> {:>4}  buy {:>10.2}  sell {:>10.2}  P/L {:>12.3}",
                i + 1,
                p.buy_day,
                p.sell_day,
                p.buy_price,
                p.sell_price,
                p.lifetime_pl()
            );
        }
    }

    out
}

impl ReportPort for TextReportAdapter {
    fn write(&self, result: &SimulationResult, output_path: &str) -> Result<(), RulesimError> {
        fs::write(output_path, render(result))?;
        Ok(())
    }
}
