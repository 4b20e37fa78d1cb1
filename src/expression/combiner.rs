//! Conjunctive combination of expression trees

use crate::config;
use crate::error::{Result, RuleEngineError};
use crate::expression::ast::Node;
use tracing::debug;

/// Fold two or more trees into `((t1 AND t2) AND t3) ...`.
///
/// No flattening or deduplication is applied. The combined tree must stay
/// within the configured `max_depth`.
pub fn combine(trees: Vec<Node>) -> Result<Node> {
    if trees.len() < 2 {
        return Err(RuleEngineError::InvalidArgument(format!(
            "At least two rules are required for combination, got {}",
            trees.len()
        )));
    }

    let max = config::max_depth();
    let mut depths = trees.iter().map(Node::depth);
    let first_depth = depths.next().unwrap_or(0);
    let depth = depths.fold(first_depth, |acc, d| acc.max(d) + 1);
    if depth > max {
        return Err(RuleEngineError::TreeTooDeep { max });
    }

    let count = trees.len();
    let mut iter = trees.into_iter();
    let first = iter.next().ok_or(RuleEngineError::UnexpectedEnd)?;
    let combined = iter.fold(first, Node::and);

    debug!(trees = count, nodes = combined.size(), "combined rule trees");
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataRecord;
    use crate::expression::ast::Connective;
    use crate::expression::evaluator::evaluate;
    use crate::expression::parser::parse_rule;

    #[test]
    fn test_combine_two() {
        let a = parse_rule("age > 30").unwrap();
        let b = parse_rule("department = 'Sales'").unwrap();
        let combined = combine(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(combined, Node::and(a, b));
    }

    #[test]
    fn test_combine_folds_left() {
        let a = parse_rule("a > 1").unwrap();
        let b = parse_rule("b > 1").unwrap();
        let c = parse_rule("c > 1 OR d > 1").unwrap();
        let combined = combine(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(combined, Node::and(Node::and(a, b), c));

        match combined {
            Node::Operator {
                connective, right, ..
            } => {
                assert_eq!(connective, Connective::And);
                // nested OR stays as-is
                assert!(matches!(
                    *right,
                    Node::Operator {
                        connective: Connective::Or,
                        ..
                    }
                ));
            }
            _ => panic!("Expected operator root"),
        }
    }

    #[test]
    fn test_combine_requires_two() {
        assert!(combine(vec![]).is_err());
        let err = combine(vec![parse_rule("a > 1").unwrap()]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Argument);
    }

    #[test]
    fn test_combine_depth_limit() {
        let leaf = parse_rule("a > 1").unwrap();

        let err = combine(vec![leaf.clone(); 300]).unwrap_err();
        assert_eq!(err, RuleEngineError::TreeTooDeep { max: 256 });

        let combined = combine(vec![leaf; 256]).unwrap();
        assert_eq!(combined.depth(), 256);
    }

    #[test]
    fn test_combined_evaluation_is_conjunction() {
        let data = DataRecord::new().with("a", 2).with("b", 0);
        let combined = combine(vec![
            parse_rule("a > 1").unwrap(),
            parse_rule("b > 1").unwrap(),
        ])
        .unwrap();
        assert!(!evaluate(&combined, &data).unwrap());
    }
}
