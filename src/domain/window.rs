//! Columnar data window over a daily bar series.
//!
//! Owns the OHLCV columns plus dynamically added indicator columns. Every
//! column always has one value per trading day; days inside an indicator's
//! warm-up period hold the [`SENTINEL`]. Adding a column that already
//! exists is a no-op, so indicator columns are computed once per run.

use chrono::NaiveDate;

use crate::domain::bar::{Bar, CandleColor};
use crate::domain::error::RulesimError;

/// The "no value" marker. Comparisons against it are always false, so a
/// sentinel can never satisfy a trigger.
pub const SENTINEL: f64 = f64::NAN;

/// True if `v` is the warm-up sentinel.
pub fn is_sentinel(v: f64) -> bool {
    v.is_nan()
}

#[derive(Debug, Clone)]
pub struct DataWindow {
    dates: Vec<NaiveDate>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<i64>,
    colors: Vec<CandleColor>,
    /// Dynamic indicator columns in insertion order.
    extra: Vec<(String, Vec<f64>)>,
    trimmed: bool,
}

impl DataWindow {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut window = DataWindow {
            dates: Vec::with_capacity(bars.len()),
            open: Vec::with_capacity(bars.len()),
            high: Vec::with_capacity(bars.len()),
            low: Vec::with_capacity(bars.len()),
            close: Vec::with_capacity(bars.len()),
            volume: Vec::with_capacity(bars.len()),
            colors: Vec::with_capacity(bars.len()),
            extra: Vec::new(),
            trimmed: false,
        };
        for bar in bars {
            window.dates.push(bar.date);
            window.open.push(bar.open);
            window.high.push(bar.high);
            window.low.push(bar.low);
            window.close.push(bar.close);
            window.volume.push(bar.volume);
            window.colors.push(bar.color());
        }
        window
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date(&self, day: usize) -> Option<NaiveDate> {
        self.dates.get(day).copied()
    }

    /// First day index whose date is on or after `date`, if any.
    pub fn first_day_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d >= date)
    }

    /// Fixed columns first, then dynamic columns in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec!["open", "high", "low", "close", "volume", "color"];
        names.extend(self.extra.iter().map(|(name, _)| name.as_str()));
        names
    }

    pub fn has_column(&self, name: &str) -> bool {
        matches!(name, "open" | "high" | "low" | "close" | "volume" | "color")
            || self.extra.iter().any(|(n, _)| n == name)
    }

    fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        match name {
            "open" => Some(self.open.clone()),
            "high" => Some(self.high.clone()),
            "low" => Some(self.low.clone()),
            "close" => Some(self.close.clone()),
            "volume" => Some(self.volume.iter().map(|v| *v as f64).collect()),
            _ => self.extra.iter().find(|(n, _)| n == name).map(|(_, c)| c.clone()),
        }
    }

    /// One numeric value. The `color` column is typed; use [`Self::color`].
    pub fn point(&self, name: &str, day: usize) -> Result<f64, RulesimError> {
        if day >= self.len() {
            return Err(RulesimError::contract(format!(
                "day index {day} out of range (window has {} days)",
                self.len()
            )));
        }
        match name {
            "open" => Ok(self.open[day]),
            "high" => Ok(self.high[day]),
            "low" => Ok(self.low[day]),
            "close" => Ok(self.close[day]),
            "volume" => Ok(self.volume[day] as f64),
            _ => self
                .extra
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| c[day])
                .ok_or_else(|| {
                    RulesimError::contract(format!("column '{name}' does not exist"))
                }),
        }
    }

    pub fn color(&self, day: usize) -> Result<CandleColor, RulesimError> {
        self.colors.get(day).copied().ok_or_else(|| {
            RulesimError::contract(format!(
                "day index {day} out of range (window has {} days)",
                self.len()
            ))
        })
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>, RulesimError> {
        self.numeric_column(name)
            .ok_or_else(|| RulesimError::contract(format!("column '{name}' does not exist")))
    }

    /// `count` values walking backward from `day` inclusive, oldest first.
    /// Fails if the walk would step past day 0.
    pub fn points_back(
        &self,
        name: &str,
        day: usize,
        count: usize,
    ) -> Result<Vec<f64>, RulesimError> {
        if count == 0 || day + 1 < count {
            return Err(RulesimError::contract(format!(
                "cannot take {count} points ending at day {day}"
            )));
        }
        let start = day + 1 - count;
        let mut out = Vec::with_capacity(count);
        for i in start..=day {
            out.push(self.point(name, i)?);
        }
        Ok(out)
    }

    /// Appends a dynamic column. No-op if `name` already exists; fails if
    /// the value count does not match the series length.
    pub fn add_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), RulesimError> {
        if self.has_column(name) {
            return Ok(());
        }
        if values.len() != self.len() {
            return Err(RulesimError::contract(format!(
                "column '{name}' has {} values, window has {} days",
                values.len(),
                self.len()
            )));
        }
        self.extra.push((name.to_string(), values));
        Ok(())
    }

    /// Drops all rows before `start_day` and re-indexes to 0. Destructive
    /// and one-shot: a second trim is a contract violation.
    pub fn trim_from(&mut self, start_day: usize) -> Result<(), RulesimError> {
        if self.trimmed {
            return Err(RulesimError::contract("window already trimmed"));
        }
        if start_day > self.len() {
            return Err(RulesimError::contract(format!(
                "trim start {start_day} beyond window length {}",
                self.len()
            )));
        }
        self.dates.drain(..start_day);
        self.open.drain(..start_day);
        self.high.drain(..start_day);
        self.low.drain(..start_day);
        self.close.drain(..start_day);
        self.volume.drain(..start_day);
        self.colors.drain(..start_day);
        for (_, column) in &mut self.extra {
            column.drain(..start_day);
        }
        self.trimmed = true;
        Ok(())
    }
}
