//! Daily OHLCV bar representation.

use chrono::NaiveDate;

/// Candle body color for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleColor {
    Green,
    Red,
}

impl CandleColor {
    /// Green iff the close is strictly above the open.
    pub fn of(open: f64, close: f64) -> Self {
        if close > open {
            CandleColor::Green
        } else {
            CandleColor::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleColor::Green => "green",
            CandleColor::Red => "red",
        }
    }
}

impl std::str::FromStr for CandleColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(CandleColor::Green),
            "red" => Ok(CandleColor::Red),
            other => Err(format!("unknown candle color '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn color(&self) -> CandleColor {
        CandleColor::of(self.open, self.close)
    }
}
