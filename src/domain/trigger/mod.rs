//! Trigger evaluators: one per indicator kind.
//!
//! A trigger owns the full contract for its rule keys: how many extra
//! lookback days the rule needs, which backing column it computes, and
//! whether the current day satisfies the rule. Dispatch goes through
//! [`TriggerRegistry`], which resolves a rule key to the trigger with the
//! longest matching symbol so that symbols which prefix one another cannot
//! be confused.

pub mod color;
pub mod macd;
pub mod moving_average;
pub mod price;
pub mod rsi;
pub mod stochastic;
pub mod stop;
pub mod volume;

use crate::domain::error::RulesimError;
use crate::domain::position::OpenPosition;
use crate::domain::strategy::{Expr, Rhs, RuleNode};
use crate::domain::window::{is_sentinel, DataWindow};

/// Everything a trigger needs to decide the current day.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub registry: &'a TriggerRegistry,
    pub window: &'a DataWindow,
    pub position: Option<&'a OpenPosition>,
    pub day: usize,
}

pub trait Trigger: std::fmt::Debug {
    /// The indicator symbol this trigger owns, e.g. `SMA` or `stoploss`.
    fn symbol(&self) -> &'static str;

    /// Whether a rule key of this kind may match `key`. The default is a
    /// prefix match (`SMA` matches `SMA20`); variants with stricter key
    /// grammars override this.
    fn matches(&self, key: &str) -> bool {
        key == self.symbol() || key.starts_with(self.symbol())
    }

    /// Whether this indicator may appear as the right-hand side of another
    /// rule's comparison.
    fn supports_reference(&self) -> bool {
        false
    }

    /// Whether this rule kind is legal in the buy tree. Stop rules are
    /// sell-side only.
    fn allowed_on_buy_side(&self) -> bool {
        true
    }

    /// Structural check of the rule, run once during the pre-pass.
    fn validate(&self, key: &str, node: &RuleNode) -> Result<(), RulesimError>;

    /// Extra historical days this rule needs before the nominal start.
    fn lookback_days(&self, key: &str, node: &RuleNode) -> Result<usize, RulesimError>;

    /// Idempotently computes and appends the backing column for `key`.
    fn ensure_data(&self, key: &str, window: &mut DataWindow) -> Result<(), RulesimError>;

    /// The column backing `key` when referenced as a comparison value.
    fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        Err(RulesimError::indicator(
            key,
            "cannot be referenced as a comparison value",
        ))
    }

    /// The trigger decision for the current day.
    fn evaluate(&self, key: &str, node: &RuleNode, ctx: EvalContext<'_>)
        -> Result<bool, RulesimError>;
}

pub struct TriggerRegistry {
    triggers: Vec<Box<dyn Trigger>>,
}

impl TriggerRegistry {
    /// The full standard trigger set. Triggers are held longest-symbol
    /// first so dispatch never picks a shorter symbol that happens to
    /// prefix a longer one.
    pub fn standard() -> Self {
        let mut triggers: Vec<Box<dyn Trigger>> = vec![
            Box::new(moving_average::SmaTrigger),
            Box::new(moving_average::EmaTrigger),
            Box::new(macd::MacdTrigger),
            Box::new(rsi::RsiTrigger),
            Box::new(stochastic::StochasticTrigger),
            Box::new(price::PriceTrigger),
            Box::new(volume::VolumeTrigger),
            Box::new(color::ColorTrigger),
            Box::new(stop::StopLossTrigger),
            Box::new(stop::StopProfitTrigger),
        ];
        triggers.sort_by_key(|t| std::cmp::Reverse(t.symbol().len()));
        TriggerRegistry { triggers }
    }

    pub fn dispatch(&self, key: &str) -> Result<&dyn Trigger, RulesimError> {
        self.triggers
            .iter()
            .find(|t| t.matches(key))
            .map(|t| t.as_ref())
            .ok_or_else(|| RulesimError::indicator(key, "unknown indicator symbol"))
    }

    /// Resolves an indicator reference to its backing column name,
    /// enforcing the reference capability.
    pub fn reference_column(&self, key: &str) -> Result<String, RulesimError> {
        let trigger = self.dispatch(key)?;
        if !trigger.supports_reference() {
            return Err(RulesimError::indicator(
                key,
                "cannot be referenced as a comparison value",
            ));
        }
        trigger.reference_column(key)
    }
}

/// Parses the length suffix of a rule key, e.g. `SMA20` -> 20. Returns
/// `None` when the key is exactly the symbol.
pub(crate) fn parse_length(key: &str, symbol: &str) -> Result<Option<usize>, RulesimError> {
    let suffix = &key[symbol.len()..];
    if suffix.is_empty() {
        return Ok(None);
    }
    suffix
        .parse::<usize>()
        .map(Some)
        .map_err(|_| RulesimError::indicator(key, format!("invalid length suffix '{suffix}'")))
}

/// Sentinel-safe comparison: a sentinel on either side never fires.
pub(crate) fn compare(
    op: crate::domain::strategy::CmpOp,
    left: f64,
    right: f64,
) -> bool {
    if is_sentinel(left) || is_sentinel(right) {
        return false;
    }
    op.apply(left, right)
}

/// Resolves a comparison right-hand side for the current day.
pub(crate) fn resolve_rhs(rhs: &Rhs, ctx: EvalContext<'_>) -> Result<f64, RulesimError> {
    match rhs {
        Rhs::Number(n) => Ok(*n),
        Rhs::Indicator(key) => {
            let column = ctx.registry.reference_column(key)?;
            ctx.window.point(&column, ctx.day)
        }
    }
}

/// Shared evaluate body for triggers that compare one column value against
/// the rule's expression.
pub(crate) fn evaluate_column_cmp(
    key: &str,
    node: &RuleNode,
    column: &str,
    ctx: EvalContext<'_>,
) -> Result<bool, RulesimError> {
    let RuleNode::Expr(Expr::Cmp { op, rhs }) = node else {
        return Err(RulesimError::indicator(
            key,
            "expects an operator comparison value",
        ));
    };
    let left = ctx.window.point(column, ctx.day)?;
    let right = resolve_rhs(rhs, ctx)?;
    Ok(compare(*op, left, right))
}

/// Shared validate body for comparison-style triggers.
pub(crate) fn validate_cmp_node(key: &str, node: &RuleNode) -> Result<(), RulesimError> {
    match node {
        RuleNode::Expr(Expr::Cmp { .. }) => Ok(()),
        RuleNode::Expr(_) => Err(RulesimError::indicator(
            key,
            "expects an operator comparison value, e.g. '>30'",
        )),
        _ => Err(RulesimError::indicator(key, "expects a comparison string")),
    }
}
