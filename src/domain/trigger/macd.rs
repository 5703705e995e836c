//! MACD trigger. Fixed 12/26 configuration, one `MACD` column.

use crate::domain::error::RulesimError;
use crate::domain::indicator::macd::{macd, MACD_SLOW};
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{evaluate_column_cmp, validate_cmp_node, EvalContext, Trigger};
use crate::domain::window::DataWindow;

const COLUMN: &str = "MACD";

#[derive(Debug)]
pub struct MacdTrigger;

impl Trigger for MacdTrigger {
    fn symbol(&self) -> &'static str {
        "MACD"
    }

    fn matches(&self, key: &str) -> bool {
        key == self.symbol()
    }

    fn supports_reference(&self) -> bool {
        true
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, _key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        Ok(MACD_SLOW)
    }

    fn ensure_data(&self, _key: &str, window: &mut DataWindow) -> Result<(), RulesimError> {
        if window.has_column(COLUMN) {
            return Ok(());
        }
        let closes = window.column("close")?;
        window.add_column(COLUMN, macd(&closes))
    }

    fn reference_column(&self, _key: &str) -> Result<String, RulesimError> {
        Ok(COLUMN.to_string())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        evaluate_column_cmp(key, node, COLUMN, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::strategy::{CmpOp, Expr, Rhs};
    use crate::domain::trigger::TriggerRegistry;
    use chrono::NaiveDate;

    fn make_window(closes: &[f64]) -> DataWindow {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        DataWindow::from_bars(&bars)
    }

    #[test]
    fn lookback_is_slow_period() {
        let trigger = MacdTrigger;
        let node = RuleNode::Expr(Expr::Cmp {
            op: CmpOp::Gt,
            rhs: Rhs::Number(0.0),
        });
        assert_eq!(trigger.lookback_days("MACD", &node).unwrap(), 26);
    }

    #[test]
    fn positive_macd_fires_in_uptrend() {
        let registry = TriggerRegistry::standard();
        let trigger = MacdTrigger;
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let mut window = make_window(&closes);
        trigger.ensure_data("MACD", &mut window).unwrap();

        let node = RuleNode::Expr(Expr::Cmp {
            op: CmpOp::Gt,
            rhs: Rhs::Number(0.0),
        });
        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 39,
        };
        assert!(trigger.evaluate("MACD", &node, ctx).unwrap());

        // Inside the slow EMA warm-up nothing fires.
        let early = EvalContext { day: 10, ..ctx };
        assert!(!trigger.evaluate("MACD", &node, early).unwrap());
    }
}
