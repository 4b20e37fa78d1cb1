//! Expression tree evaluator

use crate::data::{DataRecord, DataValue};
use crate::error::{Result, RuleEngineError};
use crate::expression::ast::{Condition, Node};
use std::cmp::Ordering;

/// Evaluate a tree against a data record.
///
/// Both children of every operator are evaluated before the connective is
/// applied, so a missing attribute anywhere in the tree is always reported.
/// Recursion follows the tree; trees produced by parsing, structural
/// validation or combination never exceed the configured `max_depth`.
pub fn evaluate(node: &Node, record: &DataRecord) -> Result<bool> {
    match node {
        Node::Condition(cond) => check_condition(cond, record),
        Node::Operator {
            connective,
            left,
            right,
        } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            Ok(connective.apply(left, right))
        }
    }
}

fn check_condition(cond: &Condition, record: &DataRecord) -> Result<bool> {
    let value = record
        .get(&cond.attribute)
        .ok_or_else(|| RuleEngineError::AttributeNotFound(cond.attribute.clone()))?;

    let ordering = compare(&cond.attribute, value, cond.unquoted_literal())?;
    Ok(cond.operator.accepts(ordering))
}

/// Order a data value relative to a literal
fn compare(attribute: &str, value: &DataValue, literal: &str) -> Result<Ordering> {
    match (value, Literal::classify(literal)) {
        (DataValue::Number(n), Literal::Number(l)) => Ok(n.total_cmp(&l)),
        (DataValue::Number(_), Literal::Text(_)) => Err(RuleEngineError::TypeMismatch {
            attribute: attribute.to_string(),
            actual: value.type_name(),
            literal: literal.to_string(),
        }),
        (DataValue::Text(s), Literal::Text(t)) => Ok(s.as_str().cmp(t)),
        // a numeric-looking literal is still compared as written against text
        (DataValue::Text(s), Literal::Number(_)) => Ok(s.as_str().cmp(literal)),
    }
}

/// Unquoted literal, classified by whether it reads as a number
#[derive(Debug, Clone, Copy, PartialEq)]
enum Literal<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> Literal<'a> {
    /// Anything `f64` parses is a number, including `inf`/`Infinity` and
    /// overflowing exponents. NaN is the exception: it has no ordering against
    /// data, so `nan`/`NaN` stay text and mismatch against numeric values.
    fn classify(literal: &'a str) -> Self {
        match literal.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => Literal::Number(n),
            _ => Literal::Text(literal),
        }
    }
}
