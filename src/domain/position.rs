//! Position lifecycle: open on a buy trigger, closed exactly once.
//!
//! The open/closed split is a type-state pair: lifetime profit/loss only
//! exists on [`ClosedPosition`], so querying it on a still-open position is
//! not expressible.

/// A position currently held. Shares are fractional (all-in sizing divides
/// the whole balance by the fill price).
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub buy_price: f64,
    pub shares: f64,
    pub buy_day: usize,
}

impl OpenPosition {
    pub fn open(buy_price: f64, shares: f64, buy_day: usize) -> Self {
        OpenPosition {
            buy_price,
            shares,
            buy_day,
        }
    }

    /// Profit/loss if sold at `price`, against the lifetime buy price.
    pub fn lifetime_pl(&self, price: f64) -> f64 {
        (price - self.buy_price) * self.shares
    }

    /// Lifetime profit/loss as a percentage of the buy price.
    pub fn lifetime_pl_pct(&self, price: f64) -> f64 {
        (price - self.buy_price) / self.buy_price * 100.0
    }

    /// Profit/loss of the day itself: `basis` is today's open.
    pub fn intraday_pl(&self, open: f64, price: f64) -> f64 {
        (price - open) * self.shares
    }

    pub fn intraday_pl_pct(&self, open: f64, price: f64) -> f64 {
        (price - open) / open * 100.0
    }

    /// Market value at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn close(self, sell_price: f64, sell_day: usize) -> ClosedPosition {
        ClosedPosition {
            buy_price: self.buy_price,
            shares: self.shares,
            buy_day: self.buy_day,
            sell_price,
            sell_day,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub buy_price: f64,
    pub shares: f64,
    pub buy_day: usize,
    pub sell_price: f64,
    pub sell_day: usize,
}

impl ClosedPosition {
    pub fn lifetime_pl(&self) -> f64 {
        (self.sell_price - self.buy_price) * self.shares
    }

    pub fn lifetime_pl_pct(&self) -> f64 {
        (self.sell_price - self.buy_price) / self.buy_price * 100.0
    }

    /// Holding time in trading days.
    pub fn duration_days(&self) -> usize {
        self.sell_day - self.buy_day
    }
}
