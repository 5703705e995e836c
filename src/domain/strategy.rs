//! Strategy document and rule tree AST.
//!
//! A strategy arrives as a JSON document: `start`/`end` epoch seconds plus
//! `buy` and `sell` rule mappings. Rule keys are indicator symbols with
//! optional length or modifier suffixes (`SMA20`, `RSI`, `price$slope4`);
//! the reserved key `"and"` opens a nested all-of group. Top-level rule
//! order is significant (it is the OR short-circuit order), so rule sets
//! preserve document order.

use crate::domain::bar::CandleColor;
use crate::domain::error::RulesimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl CmpOp {
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Gt => left > right,
            CmpOp::Lt => left < right,
            CmpOp::Ge => left >= right,
            CmpOp::Le => left <= right,
            CmpOp::Eq => left == right,
        }
    }
}

/// Right-hand side of a comparison: a literal, or another indicator's
/// column looked up on the same day.
#[derive(Debug, Clone, PartialEq)]
pub enum Rhs {
    Number(f64),
    Indicator(String),
}

/// A parsed rule value. Which forms are legal depends on the rule key:
/// `Cmp` for ordinary indicators, `Percent`/`Amount` only for stop rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Cmp { op: CmpOp, rhs: Rhs },
    Percent(f64),
    Amount(f64),
}

impl Expr {
    /// Lexical parse of a rule value string. Semantic checks (whether a
    /// percent or bare amount is legal for the rule key) happen during the
    /// pre-pass, where the dispatched trigger is known.
    pub fn parse(raw: &str) -> Result<Expr, RulesimError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RulesimError::malformed("empty rule value"));
        }

        for (token, op) in [
            (">=", CmpOp::Ge),
            ("<=", CmpOp::Le),
            ("==", CmpOp::Eq),
            (">", CmpOp::Gt),
            ("<", CmpOp::Lt),
        ] {
            if let Some(rest) = raw.strip_prefix(token) {
                let rest = rest.trim();
                if rest.is_empty() {
                    return Err(RulesimError::malformed(format!(
                        "comparison '{raw}' has no right-hand side"
                    )));
                }
                let rhs = match rest.parse::<f64>() {
                    Ok(n) => Rhs::Number(n),
                    Err(_) => Rhs::Indicator(rest.to_string()),
                };
                return Ok(Expr::Cmp { op, rhs });
            }
        }

        if let Some(pct) = raw.strip_suffix('%') {
            let value = pct.trim().parse::<f64>().map_err(|_| {
                RulesimError::malformed(format!("invalid percent value '{raw}'"))
            })?;
            return Ok(Expr::Percent(value));
        }

        raw.parse::<f64>()
            .map(Expr::Amount)
            .map_err(|_| RulesimError::malformed(format!("unparsable rule value '{raw}'")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// Comparison expression, e.g. `>200`, `<=EMA12`, `5%`.
    Expr(Expr),
    /// Offset -> expected color, only for the `color` key. Sorted by offset.
    ColorPattern(Vec<(usize, CandleColor)>),
    /// Nested all-of group introduced by the reserved key `"and"`.
    AllOf(RuleSet),
}

/// An ordered rule mapping; order is the OR evaluation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    pub rules: Vec<(String, RuleNode)>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, RuleNode)> {
        self.rules.iter()
    }
}

/// The reserved key that opens an all-of group.
pub const AND_KEY: &str = "and";
/// The rule key carrying a candle color pattern.
pub const COLOR_KEY: &str = "color";

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub start: i64,
    pub end: i64,
    pub buy: RuleSet,
    pub sell: RuleSet,
}

impl Strategy {
    pub fn from_json_str(json: &str) -> Result<Strategy, RulesimError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| RulesimError::malformed(format!("invalid JSON: {e}")))?;
        Strategy::from_json(&value)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Strategy, RulesimError> {
        let doc = value
            .as_object()
            .ok_or_else(|| RulesimError::malformed("strategy document must be an object"))?;

        let start = require_i64(doc, "start")?;
        let end = require_i64(doc, "end")?;
        if end <= start {
            return Err(RulesimError::malformed(format!(
                "end ({end}) must be after start ({start})"
            )));
        }

        let buy = parse_rule_set(doc, "buy")?;
        let sell = parse_rule_set(doc, "sell")?;

        Ok(Strategy {
            start,
            end,
            buy,
            sell,
        })
    }
}

fn require_i64(
    doc: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<i64, RulesimError> {
    doc.get(key)
        .ok_or_else(|| RulesimError::malformed(format!("missing '{key}' key")))?
        .as_i64()
        .ok_or_else(|| RulesimError::malformed(format!("'{key}' must be an integer timestamp")))
}

fn parse_rule_set(
    doc: &serde_json::Map<String, serde_json::Value>,
    side: &str,
) -> Result<RuleSet, RulesimError> {
    let object = doc
        .get(side)
        .ok_or_else(|| RulesimError::malformed(format!("missing '{side}' key")))?
        .as_object()
        .ok_or_else(|| RulesimError::malformed(format!("'{side}' must be an object")))?;
    let rules = parse_rules(object, side)?;
    if rules.is_empty() {
        return Err(RulesimError::malformed(format!("'{side}' has no rules")));
    }
    Ok(rules)
}

fn parse_rules(
    object: &serde_json::Map<String, serde_json::Value>,
    context: &str,
) -> Result<RuleSet, RulesimError> {
    let mut rules = Vec::with_capacity(object.len());

    for (key, value) in object {
        let node = if key == AND_KEY {
            let group = value.as_object().ok_or_else(|| {
                RulesimError::malformed(format!("'{context}.{key}' group must be an object"))
            })?;
            let inner = parse_rules(group, &format!("{context}.{key}"))?;
            if inner.is_empty() {
                return Err(RulesimError::malformed(format!(
                    "'{context}.{key}' group is empty"
                )));
            }
            RuleNode::AllOf(inner)
        } else if key == COLOR_KEY {
            RuleNode::ColorPattern(parse_color_pattern(value, context)?)
        } else {
            let raw = value.as_str().ok_or_else(|| {
                RulesimError::malformed(format!(
                    "'{context}.{key}' value must be a comparison string"
                ))
            })?;
            RuleNode::Expr(Expr::parse(raw)?)
        };
        rules.push((key.clone(), node));
    }

    Ok(RuleSet { rules })
}

fn parse_color_pattern(
    value: &serde_json::Value,
    context: &str,
) -> Result<Vec<(usize, CandleColor)>, RulesimError> {
    let object = value.as_object().ok_or_else(|| {
        RulesimError::malformed(format!("'{context}.color' must map offsets to colors"))
    })?;
    if object.is_empty() {
        return Err(RulesimError::malformed(format!(
            "'{context}.color' pattern is empty"
        )));
    }

    let mut pattern = Vec::with_capacity(object.len());
    for (offset_key, color_value) in object {
        let offset = offset_key.parse::<usize>().map_err(|_| {
            RulesimError::malformed(format!(
                "'{context}.color' offset '{offset_key}' is not a non-negative integer"
            ))
        })?;
        let color = color_value
            .as_str()
            .ok_or_else(|| {
                RulesimError::malformed(format!("'{context}.color' values must be strings"))
            })?
            .parse::<CandleColor>()
            .map_err(|e| RulesimError::malformed(format!("'{context}.color': {e}")))?;
        pattern.push((offset, color));
    }
    pattern.sort_by_key(|(offset, _)| *offset);
    Ok(pattern)
}
