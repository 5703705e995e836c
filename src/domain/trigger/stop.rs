//! Stop-loss and stop-profit triggers.
//!
//! Both require an open position and therefore live on the sell side only;
//! being asked to evaluate without a position is a caller bug, reported as
//! a contract violation. The rule value is a positive magnitude: a bare
//! number thresholds lifetime profit/loss in currency, a percent value
//! thresholds profit/loss-percent. A key containing `intraday` measures
//! against today's open instead of the position's buy price.

use crate::domain::error::RulesimError;
use crate::domain::position::OpenPosition;
use crate::domain::strategy::{Expr, RuleNode};
use crate::domain::trigger::{EvalContext, Trigger};
use crate::domain::window::DataWindow;

fn validate_stop_node(key: &str, node: &RuleNode) -> Result<(), RulesimError> {
    match node {
        RuleNode::Expr(Expr::Amount(v)) | RuleNode::Expr(Expr::Percent(v)) => {
            if *v > 0.0 {
                Ok(())
            } else {
                Err(RulesimError::indicator(
                    key,
                    "stop threshold must be positive",
                ))
            }
        }
        RuleNode::Expr(Expr::Cmp { .. }) => Err(RulesimError::indicator(
            key,
            "stop rules take a bare amount or percent, not an operator",
        )),
        _ => Err(RulesimError::indicator(key, "expects an amount or percent")),
    }
}

/// Profit/loss of the position for the stop basis chosen by `key`:
/// lifetime (buy price) by default, today's open when `key` says intraday.
/// Returns (currency P/L, percent P/L).
fn stop_pl(
    key: &str,
    position: &OpenPosition,
    ctx: EvalContext<'_>,
) -> Result<(f64, f64), RulesimError> {
    let close = ctx.window.point("close", ctx.day)?;
    if key.contains("intraday") {
        let open = ctx.window.point("open", ctx.day)?;
        Ok((
            position.intraday_pl(open, close),
            position.intraday_pl_pct(open, close),
        ))
    } else {
        Ok((
            position.lifetime_pl(close),
            position.lifetime_pl_pct(close),
        ))
    }
}

fn require_position<'a>(
    key: &str,
    ctx: &EvalContext<'a>,
) -> Result<&'a OpenPosition, RulesimError> {
    ctx.position.ok_or_else(|| {
        RulesimError::contract(format!("'{key}' evaluated without an open position"))
    })
}

#[derive(Debug)]
pub struct StopLossTrigger;

impl Trigger for StopLossTrigger {
    fn symbol(&self) -> &'static str {
        "stoploss"
    }

    fn allowed_on_buy_side(&self) -> bool {
        false
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        validate_stop_node(key, node)
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
        let position = require_position(key, &ctx)?;
        let (pl, pl_pct) = stop_pl(key, position, ctx)?;
        match node {
            RuleNode::Expr(Expr::Amount(threshold)) => Ok(pl <= -threshold),
            RuleNode::Expr(Expr::Percent(threshold)) => Ok(pl_pct <= -threshold),
            _ => Err(RulesimError::indicator(key, "expects an amount or percent")),
        }
    }
}

#[derive(Debug)]
pub struct StopProfitTrigger;

impl Trigger for StopProfitTrigger {
    fn symbol(&self) -> &'static str {
        "stopprofit"
    }

    fn allowed_on_buy_side(&self) -> bool {
        false
    }

    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError> {
        validate_stop_node(key, node)
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
        let position = require_position(key, &ctx)?;
        let (pl, pl_pct) = stop_pl(key, position, ctx)?;
        match node {
            RuleNode::Expr(Expr::Amount(threshold)) => Ok(pl >= *threshold),
            RuleNode::Expr(Expr::Percent(threshold)) => Ok(pl_pct >= *threshold),
            _ => Err(RulesimError::indicator(key, "expects an amount or percent")),
        }
    }
}
