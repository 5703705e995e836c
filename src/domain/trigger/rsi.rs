//! RSI trigger. A bare `RSI` key falls back to the default length 14.

use crate::domain::error::RulesimError;
use crate::domain::indicator::rsi::{rsi, DEFAULT_RSI_LENGTH};
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{
    evaluate_column_cmp, parse_length, validate_cmp_node, EvalContext, Trigger,
};
use crate::domain::window::DataWindow;

fn length_of(key: &str) -> Result<usize, RulesimError> {
    Ok(parse_length(key, "RSI")?.unwrap_or(DEFAULT_RSI_LENGTH))
}

fn column_of(key: &str) -> Result<String, RulesimError> {
    Ok(format!("RSI{}", length_of(key)?))
}

#[derive(Debug)]
pub struct RsiTrigger;

impl Trigger for RsiTrigger {
    fn symbol(&self) -> &'static str {
        "RSI"
    }

    fn supports_reference(&self) -> bool {
        true
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        length_of(key)?;
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        length_of(key)
    }

    fn ensure_data(&self, key: &str, window: &mut DataWindow) -> Result<(), RulesimError> {
        let length = length_of(key)?;
        let column = column_of(key)?;
        if window.has_column(&column) {
            return Ok(());
        }
        let closes = window.column("close")?;
        window.add_column(&column, rsi(length, &closes))
    }

    fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        column_of(key)
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        evaluate_column_cmp(key, node, &column_of(key)?, ctx)
    }
}
