//! Named rules

use crate::config;
use crate::data::DataRecord;
use crate::error::{Result, RuleEngineError};
use crate::expression::{self, Node, RawNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A rule as submitted: either rule text or a structural tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleExpression {
    Text(String),
    Tree(RawNode),
}

/// A named rule owning exactly one expression tree
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    root: Node,
}

impl Rule {
    /// Create a rule from an already built tree
    pub fn new(name: impl Into<String>, root: Node) -> Result<Self> {
        let name = validate_name(name.into())?;
        expression::validate_node(&root)?;
        Ok(Self { name, root })
    }

    /// Create a rule from rule text or a structural tree
    pub fn from_expression(name: impl Into<String>, expression: RuleExpression) -> Result<Self> {
        let name = validate_name(name.into())?;
        let root = match expression {
            RuleExpression::Text(text) => expression::parse_rule(&text)?,
            RuleExpression::Tree(raw) => expression::validate_tree(&raw)?,
        };
        debug!(rule = %name, nodes = root.size(), "created rule");
        Ok(Self { name, root })
    }

    pub fn from_text(name: impl Into<String>, text: &str) -> Result<Self> {
        Self::from_expression(name, RuleExpression::Text(text.to_string()))
    }

    /// Replace both name and tree with the same validation as creation.
    ///
    /// On error the rule is left unchanged.
    pub fn update(&mut self, name: impl Into<String>, root: Node) -> Result<()> {
        let name = validate_name(name.into())?;
        expression::validate_node(&root)?;
        debug!(rule = %self.name, renamed = %name, "updated rule");
        self.name = name;
        self.root = root;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Rule text equivalent of the tree
    pub fn expression(&self) -> String {
        self.root.to_string()
    }

    /// Validate the record, then evaluate the tree against it
    pub fn evaluate(&self, record: &DataRecord) -> Result<bool> {
        record.validate(config::current().require_non_empty_record)?;
        expression::evaluate(&self.root, record)
    }

    /// JSON form: `{"name": ..., "rootNode": {...}}`
    pub fn to_json(&self) -> Result<String> {
        let document = RuleDocument {
            name: self.name.clone(),
            root_node: RawNode::from(&self.root),
        };
        Ok(serde_json::to_string(&document)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: RuleDocument = serde_json::from_str(json)?;
        Self::from_expression(document.name, RuleExpression::Tree(document.root_node))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleDocument {
    name: String,
    #[serde(rename = "rootNode")]
    root_node: RawNode,
}

/// Combine the trees of two or more rules into a new rule.
///
/// `name` defaults to the configured combined rule name.
pub fn combine_rules(rules: &[Rule], name: Option<&str>) -> Result<Rule> {
    let trees = rules.iter().map(|rule| rule.root.clone()).collect();
    let root = expression::combine(trees)?;

    let name = match name {
        Some(name) => name.to_string(),
        None => config::current().combined_rule_name,
    };
    Rule::new(name, root)
}

fn validate_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(RuleEngineError::InvalidArgument(
            "Rule name cannot be null or empty".to_string(),
        ));
    }
    Ok(name)
}
