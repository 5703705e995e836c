//! Stochastic %K trigger. Default length 14 when the key carries none.

use crate::domain::error::RulesimError;
use crate::domain::indicator::stochastic::{stochastic, DEFAULT_STOCHASTIC_LENGTH};
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{
    evaluate_column_cmp, parse_length, validate_cmp_node, EvalContext, Trigger,
};
use crate::domain::window::DataWindow;

fn length_of(key: &str) -> Result<usize, RulesimError> {
    Ok(parse_length(key, "stochastic")?.unwrap_or(DEFAULT_STOCHASTIC_LENGTH))
}

fn column_of(key: &str) -> Result<String, RulesimError> {
    Ok(format!("stochastic{}", length_of(key)?))
}

#[derive(Debug)]
pub struct StochasticTrigger;

impl Trigger for StochasticTrigger {
    fn symbol(&self) -> &'static str {
        "stochastic"
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
        let high = window.column("high")?;
        let low = window.column("low")?;
        let close = window.column("close")?;
        window.add_column(&column, stochastic(length, &high, &low, &close))
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
