//! CLI definition and dispatch.

use chrono::{DateTime, Days, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::{self, TextReportAdapter};
use crate::domain::error::RulesimError;
use crate::domain::rule_eval::required_lookback;
use crate::domain::simulation;
use crate::domain::strategy::Strategy;
use crate::domain::trigger::TriggerRegistry;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rulesim", about = "Rule-driven trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy against historical bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a strategy document without touching any data
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbol,
            output,
        } => run_backtest(&config, &strategy, &symbol, output.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn load_strategy(path: &Path) -> Result<Strategy, RulesimError> {
    let content = fs::read_to_string(path)?;
    Strategy::from_json_str(&content)
}

fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(f64, PathBuf), RulesimError> {
    let initial_balance = config.get_double("backtest", "initial_balance", 0.0);
    if initial_balance <= 0.0 {
        return Err(RulesimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be positive".to_string(),
        });
    }

    let data_dir = config
        .get_string("backtest", "data_dir")
        .ok_or_else(|| RulesimError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data_dir".to_string(),
        })?;

    Ok((initial_balance, PathBuf::from(data_dir)))
}

fn epoch_date(secs: i64) -> Result<NaiveDate, RulesimError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| RulesimError::malformed(format!("timestamp {secs} out of range")))
}

/// Calendar margin wide enough to cover `lookback` trading days of history
/// (weekends and holidays included).
fn fetch_start(start: NaiveDate, lookback: usize) -> NaiveDate {
    start
        .checked_sub_days(Days::new(lookback as u64 * 2 + 7))
        .unwrap_or(start)
}

fn run_backtest(
    config_path: &Path,
    strategy_path: &Path,
    symbol: &str,
    output: Option<&Path>,
) -> Result<(), RulesimError> {
    let config =
        FileConfigAdapter::from_file(config_path).map_err(|e| RulesimError::ConfigParse {
            file: config_path.display().to_string(),
            reason: e.to_string(),
        })?;
    let (initial_balance, data_dir) = validate_backtest_config(&config)?;

    eprintln!("Loading strategy from {}", strategy_path.display());
    let strategy = load_strategy(strategy_path)?;

    let registry = TriggerRegistry::standard();
    let lookback = required_lookback(&strategy, &registry)?;

    let start_date = epoch_date(strategy.start)?;
    let end_date = epoch_date(strategy.end)?;

    let adapter = CsvAdapter::new(data_dir);
    let bars = adapter.fetch_bars(symbol, fetch_start(start_date, lookback), end_date)?;
    eprintln!("Fetched {} bars for {symbol}", bars.len());

    let result = simulation::run(symbol, &strategy, &bars, initial_balance, &registry)?;
    eprintln!(
        "Simulated {} days, {} trades in {:?}",
        result.tradeable_days, result.summary.total_trades, result.elapsed
    );

    match output {
        Some(path) => {
            TextReportAdapter.write(&result, &path.display().to_string())?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{}", text_report_adapter::render(&result)),
    }

    Ok(())
}

fn run_validate(strategy_path: &Path) -> Result<(), RulesimError> {
    let strategy = load_strategy(strategy_path)?;
    let registry = TriggerRegistry::standard();
    let lookback = required_lookback(&strategy, &registry)?;
    println!(
        "{} is valid ({} buy rules, {} sell rules, {lookback} lookback days)",
        strategy_path.display(),
        strategy.buy.rules.len(),
        strategy.sell.rules.len(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_positive_balance() {
        let config =
            FileConfigAdapter::from_string("[backtest]\ninitial_balance = 0\ndata_dir = /tmp\n")
                .unwrap();
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RulesimError::ConfigInvalid { .. }));
    }

    #[test]
    fn config_requires_data_dir() {
        let config =
            FileConfigAdapter::from_string("[backtest]\ninitial_balance = 1000\n").unwrap();
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RulesimError::ConfigMissing { .. }));
    }

    #[test]
    fn config_happy_path() {
        let config = FileConfigAdapter::from_string(
            "[backtest]\ninitial_balance = 25000\ndata_dir = /data/bars\n",
        )
        .unwrap();
        let (balance, dir) = validate_backtest_config(&config).unwrap();
        assert_eq!(balance, 25000.0);
        assert_eq!(dir, PathBuf::from("/data/bars"));
    }

    #[test]
    fn fetch_start_covers_lookback() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let fetched = fetch_start(start, 50);
        // 50 trading days is at most 107 calendar days back.
        assert_eq!(
            fetched,
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .checked_sub_days(Days::new(107))
                .unwrap()
        );
        assert_eq!(fetch_start(start, 0), start.checked_sub_days(Days::new(7)).unwrap());
    }

    #[test]
    fn epoch_date_conversion() {
        // 2020-01-01T00:00:00Z
        assert_eq!(
            epoch_date(1577836800).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }
}
