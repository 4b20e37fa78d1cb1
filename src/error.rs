//! Error types for the rule engine core

use pyo3::exceptions::PyValueError;
use pyo3::PyErr;
use thiserror::Error;

pyo3::create_exception!(rule_engine_core, ParseError, PyValueError);
pyo3::create_exception!(rule_engine_core, ValidationError, PyValueError);
pyo3::create_exception!(rule_engine_core, ArgumentError, PyValueError);
pyo3::create_exception!(rule_engine_core, EvaluationError, PyValueError);

/// Main error type for the rule engine core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleEngineError {
    #[error("Rule expression cannot be empty")]
    EmptyExpression,

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    #[error("Incomplete condition: {0}")]
    IncompleteCondition(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Expression nesting exceeds maximum depth of {max}")]
    NestingTooDeep { max: usize },

    #[error("Tree exceeds maximum depth of {max}")]
    TreeTooDeep { max: usize },

    #[error("Invalid node at {path}: {reason}")]
    InvalidNode { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Type mismatch for attribute {attribute}: cannot compare {actual} with '{literal}'")]
    TypeMismatch {
        attribute: String,
        actual: &'static str,
        literal: String,
    },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// Caller-facing category of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Validation,
    Argument,
    Evaluation,
}

impl RuleEngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyExpression
            | Self::UnexpectedEnd
            | Self::MismatchedParentheses
            | Self::IncompleteCondition(_)
            | Self::InvalidOperator(_)
            | Self::UnexpectedToken(_)
            | Self::InvalidCondition(_)
            | Self::NestingTooDeep { .. } => ErrorKind::Parse,
            Self::InvalidNode { .. } | Self::TreeTooDeep { .. } | Self::DeserializationError(_) => {
                ErrorKind::Validation
            }
            Self::InvalidArgument(_) => ErrorKind::Argument,
            Self::AttributeNotFound(_) | Self::TypeMismatch { .. } => ErrorKind::Evaluation,
        }
    }

    pub(crate) fn invalid_node(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Re-root a node error found in the `side` child of the current node.
    ///
    /// Paths are only assembled while an error unwinds, never on the happy path.
    pub(crate) fn within(self, side: &str) -> Self {
        match self {
            Self::InvalidNode { path, reason } => {
                let rest = path.strip_prefix("root").unwrap_or(&path);
                Self::InvalidNode {
                    path: format!("root.{}{}", side, rest),
                    reason,
                }
            }
            other => other,
        }
    }
}

impl From<serde_json::Error> for RuleEngineError {
    fn from(err: serde_json::Error) -> Self {
        RuleEngineError::DeserializationError(err.to_string())
    }
}

impl From<RuleEngineError> for PyErr {
    fn from(err: RuleEngineError) -> PyErr {
        let msg = err.to_string();
        match err.kind() {
            ErrorKind::Parse => ParseError::new_err(msg),
            ErrorKind::Validation => ValidationError::new_err(msg),
            ErrorKind::Argument => ArgumentError::new_err(msg),
            ErrorKind::Evaluation => EvaluationError::new_err(msg),
        }
    }
}

/// Result type alias for the rule engine core
pub type Result<T> = std::result::Result<T, RuleEngineError>;
