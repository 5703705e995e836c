//! CSV file data adapter.
//!
//! One file per symbol under a base directory, `{SYMBOL}.csv`, with
//! columns date (YYYY-MM-DD), open, high, low, close, volume.

use crate::domain::bar::Bar;
use crate::domain::error::RulesimError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn data_err(reason: String) -> RulesimError {
    RulesimError::Data { reason }
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str, RulesimError> {
    record
        .get(index)
        .ok_or_else(|| data_err(format!("missing {name} column")))
}

fn numeric<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, RulesimError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| data_err(format!("invalid {name} value '{raw}': {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, RulesimError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {e}", path.display())))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {e}")))?;

            let date_str = field(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| data_err(format!("invalid date '{date_str}': {e}")))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(Bar {
                date,
                open: numeric(field(&record, 1, "open")?, "open")?,
                high: numeric(field(&record, 2, "high")?, "high")?,
                low: numeric(field(&record, 3, "low")?, "low")?,
                close: numeric(field(&record, 4, "close")?, "close")?,
                volume: numeric(field(&record, 5, "volume")?, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
