#![allow(dead_code)]

use chrono::NaiveDate;
use rulesim::domain::bar::Bar;
use rulesim::domain::error::RulesimError;
use rulesim::domain::strategy::Strategy;
use rulesim::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, RulesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RulesimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

/// Consecutive calendar-day bars with the given closes; each day opens half
/// a point below its close, so every bar is green.
pub fn make_bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Days::new(i as u64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.5,
            close,
            volume: 1_000_000,
        })
        .collect()
}

/// Bars where open/close are controlled per day, for color patterns.
pub fn make_bars_oc(start: NaiveDate, days: &[(f64, f64)]) -> Vec<Bar> {
    days.iter()
        .enumerate()
        .map(|(i, &(open, close))| Bar {
            date: start + chrono::Days::new(i as u64),
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: 1_000_000,
        })
        .collect()
}

pub fn strategy_json(start: NaiveDate, end: NaiveDate, buy: &str, sell: &str) -> Strategy {
    let json = format!(
        r#"{{"start": {}, "end": {}, "buy": {buy}, "sell": {sell}}}"#,
        epoch(start),
        epoch(end)
    );
    Strategy::from_json_str(&json).unwrap()
}
