//! Structural validation for expression trees
//!
//! Every tree that does not come straight out of the parser passes through
//! here before it can be evaluated.

use crate::config;
use crate::error::{Result, RuleEngineError};
use crate::expression::ast::{ComparisonOp, Condition, Connective, Node};
use crate::expression::structure::{RawNode, NODE_TYPE_CONDITION, NODE_TYPE_OPERATOR};
use once_cell::sync::Lazy;
use regex::Regex;

/// `attribute OP literal`, literal being a bare token or a quoted string
static CONDITION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\w+)\s*(>=|<=|!=|>|<|=)\s*('[^']*'|"[^"]*"|[^\s'"()]+)$"#)
        .expect("condition pattern is a valid regex")
});

/// Validate a structural tree and convert it into an expression tree
pub fn validate_tree(raw: &RawNode) -> Result<Node> {
    validate_raw(raw, 1, config::max_depth())
}

/// Re-check every condition leaf of an already built tree.
///
/// Trees deeper than the configured `max_depth` are rejected before any leaf
/// is visited.
pub fn validate_node(node: &Node) -> Result<()> {
    let max = config::max_depth();
    if node.depth() > max {
        return Err(RuleEngineError::TreeTooDeep { max });
    }
    check_node(node)
}

/// Parse encoded leaf text like "age >= 30" into a condition
pub fn parse_condition_text(text: &str) -> Result<Condition> {
    condition_from_text(text).map_err(|reason| RuleEngineError::invalid_node("condition", reason))
}

fn validate_raw(raw: &RawNode, depth: usize, max_depth: usize) -> Result<Node> {
    if depth > max_depth {
        return Err(RuleEngineError::TreeTooDeep { max: max_depth });
    }

    let node_type = non_empty(raw.node_type.as_deref())
        .ok_or_else(|| RuleEngineError::invalid_node("root", "node type cannot be empty"))?;
    let value = non_empty(raw.value.as_deref())
        .ok_or_else(|| RuleEngineError::invalid_node("root", "node value cannot be empty"))?;

    match node_type {
        NODE_TYPE_CONDITION => {
            if raw.left.is_some() || raw.right.is_some() {
                return Err(RuleEngineError::invalid_node(
                    "root",
                    "condition node cannot have child nodes",
                ));
            }
            let condition = condition_from_text(value)
                .map_err(|reason| RuleEngineError::invalid_node("root", reason))?;
            Ok(Node::Condition(condition))
        }
        NODE_TYPE_OPERATOR => {
            let connective = Connective::from_token(value).ok_or_else(|| {
                RuleEngineError::invalid_node("root", format!("invalid connective: {}", value))
            })?;
            let (left, right) = match (&raw.left, &raw.right) {
                (Some(left), Some(right)) => (left, right),
                _ => {
                    return Err(RuleEngineError::invalid_node(
                        "root",
                        "operator node must have both left and right child nodes",
                    ))
                }
            };
            let left = validate_raw(left, depth + 1, max_depth).map_err(|e| e.within("left"))?;
            let right = validate_raw(right, depth + 1, max_depth).map_err(|e| e.within("right"))?;
            Ok(Node::operator(connective, left, right))
        }
        other => Err(RuleEngineError::invalid_node(
            "root",
            format!("invalid node type: {}", other),
        )),
    }
}

fn check_node(node: &Node) -> Result<()> {
    match node {
        Node::Condition(cond) => {
            let reparsed = condition_from_text(&cond.text())
                .map_err(|reason| RuleEngineError::invalid_node("root", reason))?;
            if reparsed != *cond {
                return Err(RuleEngineError::invalid_node(
                    "root",
                    format!("invalid condition format: {}", cond),
                ));
            }
            Ok(())
        }
        Node::Operator { left, right, .. } => {
            check_node(left).map_err(|e| e.within("left"))?;
            check_node(right).map_err(|e| e.within("right"))
        }
    }
}

/// Match leaf text against the condition grammar; the error is the reason only
fn condition_from_text(text: &str) -> std::result::Result<Condition, String> {
    let invalid = || format!("invalid condition format: {}", text);

    let caps = CONDITION_PATTERN.captures(text.trim()).ok_or_else(invalid)?;
    let operator = ComparisonOp::from_token(&caps[2]).ok_or_else(invalid)?;

    Ok(Condition::new(&caps[1], operator, &caps[3]))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
