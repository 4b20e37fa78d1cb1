//! Rule Engine Core - boolean business rules over named attributes
//!
//! This crate parses rule text like `age > 30 AND department = 'Sales'` into
//! expression trees, validates client-supplied trees, combines rules into
//! conjunctions, and evaluates trees against data records. Python bindings are
//! provided via PyO3.

use pyo3::prelude::*;

pub mod config;
pub mod data;
pub mod error;
pub mod expression;
pub mod logging;
pub mod rule;

pub use data::{DataRecord, DataValue};
pub use error::{ErrorKind, Result, RuleEngineError};
pub use expression::{
    combine, evaluate, parse, parse_rule, tokenize, validate_node, validate_tree, Node, RawNode,
};
pub use rule::{combine_rules, Rule, RuleExpression, RuleSession};

use crate::error::{ArgumentError, EvaluationError, ParseError, ValidationError};
use crate::expression::{extract_raw_node, get_or_parse, node_to_py_dict};
use pyo3::types::{PyDict, PyList, PyString};
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolve a tree argument: rule text, a JSON/dict structural tree, or a Rule
fn resolve_tree(obj: &Bound<'_, PyAny>) -> PyResult<Arc<Node>> {
    if let Ok(session) = obj.downcast::<RuleSession>() {
        return Ok(Arc::new(session.get().rule().root().clone()));
    }

    if let Ok(text) = obj.downcast::<PyString>() {
        let text: String = text.extract()?;
        if !text.trim_start().starts_with('{') {
            return Ok(get_or_parse(&text)?);
        }
    }

    let raw = extract_raw_node(obj)?;
    Ok(Arc::new(validate_tree(&raw)?))
}

fn resolve_record(data: &Bound<'_, PyDict>) -> PyResult<DataRecord> {
    let record = data::extract_record(data)?;
    record.validate(config::current().require_non_empty_record)?;
    Ok(record)
}

// ============================================================================
// Python Functions
// ============================================================================

/// Initialize the engine configuration (call once at startup)
///
/// # Arguments
/// * `config` - Optional dict with `cache_enabled`, `cache_capacity`,
///   `combined_rule_name`, `require_non_empty_record`, `max_depth` and `log_filter`
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_config(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let engine_config = match config {
        Some(dict) => config::deserialize_engine_config(dict)?,
        None => config::EngineConfig::default(),
    };

    if let Some(filter) = engine_config.log_filter.as_deref() {
        logging::init(Some(filter));
    }

    if !engine_config.cache_enabled {
        expression::clear_cache();
    }
    config::install(engine_config);
    Ok(())
}

/// Check if config is initialized
#[pyfunction]
fn is_config_initialized() -> bool {
    config::is_initialized()
}

/// Install a tracing subscriber; returns False if one was already installed
#[pyfunction]
#[pyo3(signature = (filter=None))]
fn init_logging(filter: Option<&str>) -> bool {
    logging::init(filter)
}

/// Parse rule text into a tree dict
///
/// # Raises
/// ParseError on malformed text, malformed conditions, or nesting deeper
/// than `max_depth`
#[pyfunction]
#[pyo3(name = "parse_rule")]
fn py_parse_rule<'py>(py: Python<'py>, text: &str) -> PyResult<Bound<'py, PyDict>> {
    let node = get_or_parse(text)?;
    node_to_py_dict(py, &node)
}

/// Validate a structural tree (dict or JSON string)
///
/// # Raises
/// ValidationError naming the offending node, or for trees deeper than `max_depth`
#[pyfunction]
#[pyo3(name = "validate_tree")]
fn py_validate_tree(tree: &Bound<'_, PyAny>) -> PyResult<()> {
    let raw = extract_raw_node(tree)?;
    validate_tree(&raw)?;
    Ok(())
}

/// Evaluate a tree against a data dict
///
/// # Arguments
/// * `tree` - Rule text, tree dict, JSON tree string, or Rule
/// * `data` - Dict of attribute -> str | int | float
///
/// # Raises
/// EvaluationError for missing attributes or incomparable values
#[pyfunction]
#[pyo3(name = "evaluate")]
fn py_evaluate(tree: &Bound<'_, PyAny>, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let node = resolve_tree(tree)?;
    let record = resolve_record(data)?;
    Ok(evaluate(&node, &record)?)
}

/// Evaluate a tree asynchronously
///
/// Arguments are converted while the GIL is held; the evaluation itself runs
/// on Tokio's blocking pool.
///
/// # Example (Python)
/// ```python
/// matched = await evaluate_async("age > 30", {"age": 35})
/// ```
#[pyfunction]
fn evaluate_async<'py>(
    py: Python<'py>,
    tree: &Bound<'py, PyAny>,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    let node = resolve_tree(tree)?;
    let record = resolve_record(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let matched = tokio::task::spawn_blocking(move || evaluate(&node, &record))
            .await
            .map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Evaluation task panicked: {}",
                    e
                ))
            })??;

        Ok(matched)
    })
}

/// Combine two or more trees into one AND-chained tree dict
///
/// # Raises
/// ArgumentError if fewer than two trees are given
#[pyfunction]
#[pyo3(name = "combine")]
fn py_combine<'py>(py: Python<'py>, trees: &Bound<'py, PyList>) -> PyResult<Bound<'py, PyDict>> {
    let mut nodes = Vec::with_capacity(trees.len());
    for item in trees.iter() {
        nodes.push(resolve_tree(&item)?.as_ref().clone());
    }
    let combined = combine(nodes)?;
    node_to_py_dict(py, &combined)
}

/// Create a named rule from rule text or a tree dict
///
/// # Raises
/// ArgumentError for an empty name, ParseError / ValidationError for a bad expression
#[pyfunction]
fn create_rule(name: &str, expression: &Bound<'_, PyAny>) -> PyResult<RuleSession> {
    let expression = if let Ok(text) = expression.downcast::<PyString>() {
        RuleExpression::Text(text.extract()?)
    } else {
        RuleExpression::Tree(extract_raw_node(expression)?)
    };
    let rule = Rule::from_expression(name, expression)?;
    Ok(RuleSession::new(rule))
}

/// Combine two or more rules into a new rule
///
/// # Arguments
/// * `rules` - List of Rule objects
/// * `name` - Optional name; defaults to the configured combined rule name
#[pyfunction]
#[pyo3(name = "combine_rules", signature = (rules, name=None))]
fn py_combine_rules(
    rules: Vec<Bound<'_, RuleSession>>,
    name: Option<&str>,
) -> PyResult<RuleSession> {
    let rules: Vec<Rule> = rules.iter().map(|s| s.get().rule().clone()).collect();
    let combined = combine_rules(&rules, name)?;
    Ok(RuleSession::new(combined))
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(is_config_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add_function(wrap_pyfunction!(py_parse_rule, m)?)?;
    m.add_function(wrap_pyfunction!(py_validate_tree, m)?)?;
    m.add_function(wrap_pyfunction!(py_evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_async, m)?)?;
    m.add_function(wrap_pyfunction!(py_combine, m)?)?;
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(py_combine_rules, m)?)?;
    m.add_class::<RuleSession>()?;

    let py = m.py();
    m.add("ParseError", py.get_type::<ParseError>())?;
    m.add("ValidationError", py.get_type::<ValidationError>())?;
    m.add("ArgumentError", py.get_type::<ArgumentError>())?;
    m.add("EvaluationError", py.get_type::<EvaluationError>())?;
    Ok(())
}
