//! Volume trigger. Compares the day's traded volume; cannot itself be
//! referenced as a comparison value.

use crate::domain::error::RulesimError;
use crate::domain::strategy::RuleNode;
use crate::domain::trigger::{evaluate_column_cmp, validate_cmp_node, EvalContext, Trigger};
use crate::domain::window::DataWindow;

#[derive(Debug)]
pub struct VolumeTrigger;

impl Trigger for VolumeTrigger {
    fn symbol(&self) -> &'static str {
        "volume"
    }

    fn matches(&self, key: &str) -> bool {
        key == self.symbol()
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, _key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        Ok(0)
    }

    fn ensure_data(&self, _key: &str, _window: &mut DataWindow) -> Result<(), RulesimError> {
        Ok(())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        evaluate_column_cmp(key, node, "volume", ctx)
    }
}
