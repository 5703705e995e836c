//! SMA and EMA triggers.
//!
//! Both require an explicit length in the rule key (`SMA20`, `EMA12`); the
//! backing column carries the same name as the key.

use crate::domain::error::RulesimError;
use crate::domain::indicator::{ema::ema, sma::sma};
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{
    evaluate_column_cmp, parse_length, validate_cmp_node, EvalContext, Trigger,
};
use crate::domain::window::DataWindow;

fn required_length(key: &str, symbol: &str) -> Result<usize, RulesimError> {
    parse_length(key, symbol)?.ok_or_else(|| {
        RulesimError::indicator(key, format!("{symbol} rules need a length, e.g. {symbol}20"))
    })
}

#[derive(Debug)]
pub struct SmaTrigger;

impl Trigger for SmaTrigger {
    fn symbol(&self) -> &'static str {
        "SMA"
    }

    fn supports_reference(&self) -> bool {
        true
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        required_length(key, self.symbol())?;
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        required_length(key, self.symbol())
    }

    fn ensure_data(&self, key: &str, window: &mut DataWindow) -> Result<(), RulesimError> {
        let length = required_length(key, self.symbol())?;
        if window.has_column(key) {
            return Ok(());
        }
        let closes = window.column("close")?;
        window.add_column(key, sma(length, &closes))
    }

    fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        required_length(key, self.symbol())?;
        Ok(key.to_string())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        evaluate_column_cmp(key, node, key, ctx)
    }
}

#[derive(Debug)]
pub struct EmaTrigger;

impl Trigger for EmaTrigger {
    fn symbol(&self) -> &'static str {
        "EMA"
    }

    fn supports_reference(&self) -> bool {
        true
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        required_length(key, self.symbol())?;
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        required_length(key, self.symbol())
    }

    fn ensure_data(&self, key: &str, window: &mut DataWindow) -> Result<(), RulesimError> {
        let length = required_length(key, self.symbol())?;
        if window.has_column(key) {
            return Ok(());
        }
        let closes = window.column("close")?;
        window.add_column(key, ema(length, &closes))
    }

    fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        required_length(key, self.symbol())?;
        Ok(key.to_string())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        evaluate_column_cmp(key, node, key, ctx)
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
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        DataWindow::from_bars(&bars)
    }

    fn cmp_node(op: CmpOp, value: f64) -> RuleNode {
        RuleNode::Expr(Expr::Cmp {
            op,
            rhs: Rhs::Number(value),
        })
    }

    #[test]
    fn length_is_required() {
        let trigger = SmaTrigger;
        let node = cmp_node(CmpOp::Gt, 100.0);
        assert!(trigger.validate("SMA", &node).is_err());
        assert!(trigger.validate("SMA20", &node).is_ok());
        assert_eq!(trigger.lookback_days("SMA50", &node).unwrap(), 50);
    }

    #[test]
    fn ensure_data_adds_column_once() {
        let trigger = SmaTrigger;
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        trigger.ensure_data("SMA3", &mut window).unwrap();
        trigger.ensure_data("SMA3", &mut window).unwrap();
        assert_eq!(
            window
                .column_names()
                .iter()
                .filter(|n| **n == "SMA3")
                .count(),
            1
        );
        assert_eq!(window.point("SMA3", 4).unwrap(), 40.0);
    }

    #[test]
    fn evaluate_compares_column() {
        let registry = TriggerRegistry::standard();
        let trigger = SmaTrigger;
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        trigger.ensure_data("SMA3", &mut window).unwrap();

        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 4,
        };
        // SMA3 at day 4 is 40.
        assert!(trigger
            .evaluate("SMA3", &cmp_node(CmpOp::Gt, 35.0), ctx)
            .unwrap());
        assert!(!trigger
            .evaluate("SMA3", &cmp_node(CmpOp::Lt, 35.0), ctx)
            .unwrap());
    }

    #[test]
    fn ema_warmup_never_fires() {
        let registry = TriggerRegistry::standard();
        let trigger = EmaTrigger;
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        trigger.ensure_data("EMA3", &mut window).unwrap();

        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 0,
        };
        // Day 0 is inside the warm-up gap: sentinel, so nothing fires.
        assert!(!trigger
            .evaluate("EMA3", &cmp_node(CmpOp::Gt, -1000.0), ctx)
            .unwrap());
    }

    #[test]
    fn cross_indicator_reference() {
        let registry = TriggerRegistry::standard();
        let sma = SmaTrigger;
        let ema = EmaTrigger;
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        sma.ensure_data("SMA3", &mut window).unwrap();
        ema.ensure_data("EMA3", &mut window).unwrap();

        let node = RuleNode::Expr(Expr::Cmp {
            op: CmpOp::Gt,
            rhs: Rhs::Indicator("SMA3".into()),
        });
        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 4,
        };
        // EMA3 day 4 = 40, SMA3 day 4 = 40: not strictly greater.
        assert!(!ema.evaluate("EMA3", &node, ctx).unwrap());
    }
}
