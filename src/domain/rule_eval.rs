//! Rule tree evaluation and the pre-simulation pass.
//!
//! Evaluation semantics: top-level rules are OR'd in document order and
//! short-circuit on the first hit; an `"and"` group contributes one OR
//! branch that holds only when every entry holds; groups may nest.
//!
//! The pre-pass visits exactly the rule set the loop will evaluate: it
//! validates every rule against its trigger, folds the whole-strategy
//! lookback requirement, and ensures every backing indicator column exists
//! before the first day is simulated. All strategy errors surface here;
//! the loop itself does not raise.

use crate::domain::error::RulesimError;
use crate::domain::strategy::{Expr, Rhs, RuleNode, RuleSet, Strategy, AND_KEY};
use crate::domain::trigger::{EvalContext, TriggerRegistry};
use crate::domain::window::DataWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Validates both rule trees and returns the extra historical days the
/// strategy needs before its nominal start: the maximum `lookback_days`
/// over every rule, including indicators referenced as comparison values.
pub fn required_lookback(
    strategy: &Strategy,
    registry: &TriggerRegistry,
) -> Result<usize, RulesimError> {
    let buy = validate_rules(&strategy.buy, Side::Buy, registry)?;
    let sell = validate_rules(&strategy.sell, Side::Sell, registry)?;
    Ok(buy.max(sell))
}

fn validate_rules(
    rules: &RuleSet,
    side: Side,
    registry: &TriggerRegistry,
) -> Result<usize, RulesimError> {
    let mut lookback = 0usize;

    for (key, node) in rules.iter() {
        if key == AND_KEY {
            let RuleNode::AllOf(group) = node else {
                return Err(RulesimError::malformed("'and' key without a rule group"));
            };
            lookback = lookback.max(validate_rules(group, side, registry)?);
            continue;
        }

        let trigger = registry.dispatch(key)?;
        if side == Side::Buy && !trigger.allowed_on_buy_side() {
            return Err(RulesimError::malformed(format!(
                "'{key}' requires an open position and cannot appear in the buy tree"
            )));
        }
        trigger.validate(key, node)?;
        lookback = lookback.max(trigger.lookback_days(key, node)?);

        if let RuleNode::Expr(Expr::Cmp {
            rhs: Rhs::Indicator(ref_key),
            ..
        }) = node
        {
            let referenced = registry.dispatch(ref_key)?;
            if !referenced.supports_reference() {
                return Err(RulesimError::indicator(
                    ref_key,
                    "cannot be referenced as a comparison value",
                ));
            }
            referenced.reference_column(ref_key)?;
            lookback = lookback.max(referenced.lookback_days(ref_key, node)?);
        }
    }

    Ok(lookback)
}

/// Ensures every indicator column either rule tree needs, including columns
/// for referenced indicators. Idempotent: re-running leaves the window
/// unchanged.
pub fn ensure_columns(
    strategy: &Strategy,
    registry: &TriggerRegistry,
    window: &mut DataWindow,
) -> Result<(), RulesimError> {
    ensure_rules(&strategy.buy, registry, window)?;
    ensure_rules(&strategy.sell, registry, window)
}

fn ensure_rules(
    rules: &RuleSet,
    registry: &TriggerRegistry,
    window: &mut DataWindow,
) -> Result<(), RulesimError> {
    for (key, node) in rules.iter() {
        if key == AND_KEY {
            if let RuleNode::AllOf(group) = node {
                ensure_rules(group, registry, window)?;
            }
            continue;
        }

        registry.dispatch(key)?.ensure_data(key, window)?;

        if let RuleNode::Expr(Expr::Cmp {
            rhs: Rhs::Indicator(ref_key),
            ..
        }) = node
        {
            registry.dispatch(ref_key)?.ensure_data(ref_key, window)?;
        }
    }
    Ok(())
}

/// Evaluates one side of the strategy against the current day.
pub fn evaluate_side(rules: &RuleSet, ctx: EvalContext<'_>) -> Result<bool, RulesimError> {
    for (key, node) in rules.iter() {
        if evaluate_branch(key, node, ctx)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn evaluate_branch(
    key: &str,
    node: &RuleNode,
    ctx: EvalContext<'_>,
) -> Result<bool, RulesimError> {
    match node {
        RuleNode::AllOf(group) => evaluate_all_of(group, ctx),
        _ => ctx.registry.dispatch(key)?.evaluate(key, node, ctx),
    }
}

fn evaluate_all_of(group: &RuleSet, ctx: EvalContext<'_>) -> Result<bool, RulesimError> {
    for (key, node) in group.iter() {
        if !evaluate_branch(key, node, ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use chrono::NaiveDate;

    fn make_window(closes: &[f64]) -> DataWindow {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 2_000_000,
            })
            .collect();
        DataWindow::from_bars(&bars)
    }

    fn strategy(buy: &str, sell: &str) -> Strategy {
        let json = format!(
            r#"{{"start": 0, "end": 1000000000, "buy": {buy}, "sell": {sell}}}"#
        );
        Strategy::from_json_str(&json).unwrap()
    }

    #[test]
    fn lookback_is_max_over_rules() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(
            r#"{"SMA50": ">100", "RSI14": "<30"}"#,
            r#"{"RSI14": ">70"}"#,
        );
        assert_eq!(required_lookback(&strategy, &registry).unwrap(), 50);
    }

    #[test]
    fn lookback_includes_referenced_indicators() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"price": ">SMA200"}"#, r#"{"RSI": ">70"}"#);
        assert_eq!(required_lookback(&strategy, &registry).unwrap(), 200);
    }

    #[test]
    fn unknown_symbol_fails_fast() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"WOBBLE3": ">1"}"#, r#"{"RSI": ">70"}"#);
        let err = required_lookback(&strategy, &registry).unwrap_err();
        assert!(matches!(err, RulesimError::Indicator { .. }));
    }

    #[test]
    fn missing_length_fails_fast() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"SMA": ">100"}"#, r#"{"RSI": ">70"}"#);
        assert!(required_lookback(&strategy, &registry).is_err());
    }

    #[test]
    fn stop_rule_in_buy_tree_fails() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"stoploss": "5%"}"#, r#"{"RSI": ">70"}"#);
        let err = required_lookback(&strategy, &registry).unwrap_err();
        assert!(matches!(err, RulesimError::MalformedStrategy { .. }));
    }

    #[test]
    fn volume_reference_fails_fast() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"price": ">volume"}"#, r#"{"RSI": ">70"}"#);
        let err = required_lookback(&strategy, &registry).unwrap_err();
        assert!(matches!(err, RulesimError::Indicator { .. }));
    }

    #[test]
    fn ensure_columns_is_idempotent() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(
            r#"{"SMA3": ">10", "price": ">EMA3"}"#,
            r#"{"RSI7": ">70"}"#,
        );
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);

        ensure_columns(&strategy, &registry, &mut window).unwrap();
        let names_once: Vec<String> = window
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        ensure_columns(&strategy, &registry, &mut window).unwrap();
        let names_twice: Vec<String> = window
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(names_once, names_twice);
        assert!(window.has_column("SMA3"));
        assert!(window.has_column("EMA3"));
        assert!(window.has_column("RSI7"));
    }

    #[test]
    fn top_level_rules_are_ored() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(
            r#"{"price": ">1000", "volume": ">1000000"}"#,
            r#"{"RSI": ">70"}"#,
        );
        let window = make_window(&[100.0, 100.0]);

        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 1,
        };
        // Price branch misses, volume branch hits.
        assert!(evaluate_side(&strategy.buy, ctx).unwrap());
    }

    #[test]
    fn and_group_requires_all_entries() {
        let registry = TriggerRegistry::standard();
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);

        let hit = strategy(
            r#"{"and": {"SMA3": ">10", "price": ">45"}}"#,
            r#"{"RSI": ">70"}"#,
        );
        let miss = strategy(
            r#"{"and": {"SMA3": ">10", "price": ">60"}}"#,
            r#"{"RSI": ">70"}"#,
        );
        ensure_columns(&hit, &registry, &mut window).unwrap();

        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 4,
        };
        assert!(evaluate_side(&hit.buy, ctx).unwrap());
        // Flipping one entry false flips the whole group.
        assert!(!evaluate_side(&miss.buy, ctx).unwrap());
    }

    #[test]
    fn nested_groups() {
        let registry = TriggerRegistry::standard();
        let mut window = make_window(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let strategy = strategy(
            r#"{"and": {"price": ">45", "and": {"SMA3": ">10", "volume": ">100"}}}"#,
            r#"{"RSI": ">70"}"#,
        );
        ensure_columns(&strategy, &registry, &mut window).unwrap();

        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 4,
        };
        assert!(evaluate_side(&strategy.buy, ctx).unwrap());
    }

    #[test]
    fn empty_day_misses_everything() {
        let registry = TriggerRegistry::standard();
        let strategy = strategy(r#"{"price": ">1000"}"#, r#"{"price": "<0"}"#);
        let window = make_window(&[100.0]);
        let ctx = EvalContext {
            registry: &registry,
            window: &window,
            position: None,
            day: 0,
        };
        assert!(!evaluate_side(&strategy.buy, ctx).unwrap());
        assert!(!evaluate_side(&strategy.sell, ctx).unwrap());
    }
}
