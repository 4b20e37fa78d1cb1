//! RuleSession - Python handle to a validated rule
//!
//! The tree stays in Rust memory; Python only sees the name, the rendered
//! expression, and dict snapshots on request.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::sync::Arc;

use crate::data::extract_record;
use crate::expression::node_to_py_dict;

use super::Rule;

/// Python-visible rule
///
/// # Thread Safety
/// The rule is immutable once built and shared through an `Arc`, so sessions
/// can be passed freely between threads.
#[pyclass(name = "Rule", frozen)]
#[derive(Clone)]
pub struct RuleSession {
    rule: Arc<Rule>,
}

impl RuleSession {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

#[pymethods]
impl RuleSession {
    /// Rule name
    #[getter]
    fn name(&self) -> &str {
        self.rule.name()
    }

    /// Rule text equivalent of the tree
    #[getter]
    fn expression(&self) -> String {
        self.rule.expression()
    }

    /// Number of nodes in the tree
    #[getter]
    fn size(&self) -> usize {
        self.rule.root().size()
    }

    /// Tree as nested dicts: {"type", "value", "left"?, "right"?}
    fn tree<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        node_to_py_dict(py, self.rule.root())
    }

    /// Evaluate against a dict of attribute -> str | int | float
    fn evaluate(&self, data: &Bound<'_, PyDict>) -> PyResult<bool> {
        let record = extract_record(data)?;
        Ok(self.rule.evaluate(&record)?)
    }

    /// JSON form: {"name": ..., "rootNode": {...}}
    fn to_json(&self) -> PyResult<String> {
        Ok(self.rule.to_json()?)
    }

    fn __repr__(&self) -> String {
        format!("Rule(name={:?}, expression={:?})", self.rule.name(), self.rule.expression())
    }
}
