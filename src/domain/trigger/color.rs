//! Candlestick color trigger.
//!
//! The rule value maps relative day offsets to expected colors; the rule
//! fires only when every offset matches, e.g. `{"0": "red", "1": "red"}`
//! hits on the second consecutive red day.

use crate::domain::error::RulesimError;
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{EvalContext, Trigger};
use crate::domain::window::DataWindow;

#[derive(Debug)]
pub struct ColorTrigger;

impl Trigger for ColorTrigger {
    fn symbol(&self) -> &'static str {
        "color"
    }

    fn matches(&self, key: &str) -> bool {
        key == self.symbol()
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        match node {
            RuleNode::ColorPattern(pattern) if !pattern.is_empty() => Ok(()),
            _ => Err(RulesimError::indicator(
                key,
                "expects an offset-to-color mapping",
            )),
        }
    }

    fn lookback_days(&self, key: &str, node: &RuleNode) -> Result<usize, RulesimError> {
        match node {
            RuleNode::ColorPattern(pattern) => Ok(pattern
                .iter()
                .map(|(offset, _)| *offset)
                .max()
                .unwrap_or(0)),
            _ => Err(RulesimError::indicator(
                key,
                "expects an offset-to-color mapping",
            )),
        }
    }

    fn ensure_data(&self, _key: &str, _window: &mut DataWindow) -> Result<(), RulesimError> {
        // Colors are derived at window construction.
        Ok(())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        let RuleNode::ColorPattern(pattern) = node else {
            return Err(RulesimError::indicator(
                key,
                "expects an offset-to-color mapping",
            ));
        };

        for (offset, expected) in pattern {
            if ctx.day < *offset {
                return Ok(false);
            }
            if ctx.window.color(ctx.day - offset)? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::{Bar, CandleColor};
    use crate::domain::trigger::TriggerRegistry;
    use chrono::NaiveDate;

    fn make_window(colors: &[CandleColor]) -> DataWindow {
        let bars: Vec<Bar> = colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let (open, close) = match color {
                    CandleColor::Green => (100.0, 105.0),
                    CandleColor::Red => (105.0, 100.0),
                };
                Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                    open,
                    high: 106.0,
                    low: 99.0,
                    close,
                    volume: 1000,
                }
            })
            .collect();
        DataWindow::from_bars(&bars)
    }

    fn pattern(entries: &[(usize, CandleColor)]) -> RuleNode {
        RuleNode::ColorPattern(entries.to_vec())
    }

    #[test]
    fn full_sequence_must_match() {
        use CandleColor::{Green, Red};
        let registry = TriggerRegistry::standard();
        let window = make_window(&[Green, Red, Red]);
        let trigger = ColorTrigger;
        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 2,
        };

        // Today red, yesterday red: hit.
        assert!(trigger
            .evaluate("color", &pattern(&[(0, Red), (1, Red)]), ctx)
            .unwrap());
        // Today red, two days ago red: miss (two days ago was green).
        assert!(!trigger
            .evaluate("color", &pattern(&[(0, Red), (2, Red)]), ctx)
            .unwrap());
    }

    #[test]
    fn offset_beyond_history_misses() {
        use CandleColor::Red;
        let registry = TriggerRegistry::standard();
        let window = make_window(&[Red, Red]);
        let trigger = ColorTrigger;
        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 1,
        };
        assert!(!trigger
            .evaluate("color", &pattern(&[(3, Red)]), ctx)
            .unwrap());
    }

    #[test]
    fn lookback_is_max_offset() {
        use CandleColor::{Green, Red};
        let trigger = ColorTrigger;
        let node = pattern(&[(0, Red), (1, Green), (4, Red)]);
        assert_eq!(trigger.lookback_days("color", &node).unwrap(), 4);
    }

    #[test]
    fn rejects_comparison_value() {
        let trigger = ColorTrigger;
        let node = RuleNode::Expr(crate::domain::strategy::Expr::Amount(1.0));
        assert!(trigger.validate("color", &node).is_err());
    }
}
