//! Price trigger.
//!
//! The bare `price` key compares today's close. The `price$slope{n}`
//! modifier compares the mean per-day change of close over the trailing
//! `n` days. `price` never matches as a loose prefix, so it cannot swallow
//! keys of other indicators.

use crate::domain::error::RulesimError;
use crate::domain::strategy::{Expr, RuleNode};
use crate::domain::trigger::{compare, resolve_rhs, validate_cmp_node, EvalContext, Trigger};
use crate::domain::window::{DataWindow, SENTINEL};

const SLOPE_PREFIX: &str = "price$slope";

/// `price` -> None; `price$slope4` -> Some(4); anything else is an error.
fn slope_span(key: &str) -> Result<Option<usize>, RulesimError> {
    if key == "price" {
        return Ok(None);
    }
    let Some(suffix) = key.strip_prefix(SLOPE_PREFIX) else {
        return Err(RulesimError::indicator(key, "unknown price modifier"));
    };
    let span = suffix
        .parse::<usize>()
        .map_err(|_| RulesimError::indicator(key, format!("invalid slope span '{suffix}'")))?;
    if span == 0 {
        return Err(RulesimError::indicator(key, "slope span must be positive"));
    }
    Ok(Some(span))
}

#[derive(Debug)]
pub struct PriceTrigger;

impl Trigger for PriceTrigger {
    fn symbol(&self) -> &'static str {
        "price"
    }

    fn matches(&self, key: &str) -> bool {
        key == "price" || key.starts_with("price$")
    }

    fn supports_reference(&self) -> bool {
        true
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        slope_span(key)?;
        validate_cmp_node(key, node)
    }

    fn lookback_days(&self, key: &str, _node: &RuleNode) -> Result<usize, RulesimError> {
        Ok(slope_span(key)?.unwrap_or(0))
    }

    fn ensure_data(&self, key: &str, _window: &mut DataWindow) -> Result<(), RulesimError> {
        slope_span(key)?;
        Ok(())
    }

    fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        if key != "price" {
            return Err(RulesimError::indicator(
                key,
                "only the bare price key can be referenced",
            ));
        }
        Ok("close".to_string())
    }

    fn evaluate(
        &self,
        key: &str,
        node: &RuleNode,
        ctx: EvalContext<'_>,
    ) -> Result<bool, RulesimError> {
        let RuleNode::Expr(Expr::Cmp { op, rhs }) = node else {
            return Err(RulesimError::indicator(
                key,
                "expects an operator comparison value",
            ));
        };

        let left = match slope_span(key)? {
            None => ctx.window.point("close", ctx.day)?,
            Some(span) => {
                if ctx.day < span {
                    SENTINEL
                } else {
                    let now = ctx.window.point("close", ctx.day)?;
                    let then = ctx.window.point("close", ctx.day - span)?;
                    (now - then) / span as f64
                }
            }
        };
        let right = resolve_rhs(rhs, ctx)?;
        Ok(compare(*op, left, right))
    }
}
