//! Structural tree representation used at the boundary
//!
//! Shape: `{"type": "condition" | "operator", "value": "...", "left"?: {...}, "right"?: {...}}`.
//! Output always uses `value`; input also accepts the older `nodeValue` name.

use crate::config::{self, get_attr_opt, optional_string};
use crate::error::{Result, RuleEngineError};
use crate::expression::ast::Node;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyString};
use serde::{Deserialize, Serialize};

pub const NODE_TYPE_CONDITION: &str = "condition";
pub const NODE_TYPE_OPERATOR: &str = "operator";

/// Unvalidated tree node as received from a client
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(alias = "nodeValue", default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<RawNode>>,
}

impl RawNode {
    pub fn condition(text: impl Into<String>) -> Self {
        Self {
            node_type: Some(NODE_TYPE_CONDITION.to_string()),
            value: Some(text.into()),
            left: None,
            right: None,
        }
    }

    pub fn operator(connective: impl Into<String>, left: RawNode, right: RawNode) -> Self {
        Self {
            node_type: Some(NODE_TYPE_OPERATOR.to_string()),
            value: Some(connective.into()),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&Node> for RawNode {
    fn from(node: &Node) -> Self {
        match node {
            Node::Condition(cond) => RawNode::condition(cond.text()),
            Node::Operator {
                connective,
                left,
                right,
            } => RawNode::operator(
                connective.as_str(),
                RawNode::from(left.as_ref()),
                RawNode::from(right.as_ref()),
            ),
        }
    }
}

// ============================================================================
// Python Conversion
// ============================================================================

/// Extract a structural tree from a JSON string, a dict, or an object with
/// matching attributes
///
/// Nesting beyond the configured `max_depth` is rejected while extracting.
pub fn extract_raw_node(obj: &Bound<'_, PyAny>) -> PyResult<RawNode> {
    extract_at(obj, 1, config::max_depth())
}

fn extract_at(obj: &Bound<'_, PyAny>, depth: usize, max_depth: usize) -> PyResult<RawNode> {
    if depth > max_depth {
        return Err(RuleEngineError::TreeTooDeep { max: max_depth }.into());
    }

    if let Ok(text) = obj.downcast::<PyString>() {
        let json: String = text.extract()?;
        return Ok(RawNode::from_json(&json)?);
    }

    let node_type = optional_string(obj, "type")?;
    // Support both "value" and "nodeValue" field names
    let value = match optional_string(obj, "value")? {
        Some(value) => Some(value),
        None => optional_string(obj, "nodeValue")?,
    };

    Ok(RawNode {
        node_type,
        value,
        left: extract_child(obj, "left", depth, max_depth)?,
        right: extract_child(obj, "right", depth, max_depth)?,
    })
}

fn extract_child(
    obj: &Bound<'_, PyAny>,
    name: &str,
    depth: usize,
    max_depth: usize,
) -> PyResult<Option<Box<RawNode>>> {
    match get_attr_opt(obj, name) {
        Some(child) if !child.is_none() => {
            Ok(Some(Box::new(extract_at(&child, depth + 1, max_depth)?)))
        }
        _ => Ok(None),
    }
}

/// Convert an expression tree into nested Python dicts
pub fn node_to_py_dict<'py>(py: Python<'py>, node: &Node) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    match node {
        Node::Condition(cond) => {
            dict.set_item("type", NODE_TYPE_CONDITION)?;
            dict.set_item("value", cond.text())?;
        }
        Node::Operator {
            connective,
            left,
            right,
        } => {
            dict.set_item("type", NODE_TYPE_OPERATOR)?;
            dict.set_item("value", connective.as_str())?;
            dict.set_item("left", node_to_py_dict(py, left)?)?;
            dict.set_item("right", node_to_py_dict(py, right)?)?;
        }
    }
    Ok(dict)
}
