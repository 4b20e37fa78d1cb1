//! Recursive descent parser for rule text
//!
//! ```text
//! Expression := Term ( ("AND" | "OR") Term )*
//! Term       := "(" Expression ")" | Condition
//! Condition  := attribute operator literal
//! ```
//!
//! AND and OR share one precedence level and fold strictly left to right.
//! Both parenthesis nesting and the depth of the folded tree are capped at the
//! configured `max_depth`, so every later walk over a parsed tree is bounded.

use crate::config;
use crate::error::{Result, RuleEngineError};
use crate::expression::ast::{ComparisonOp, Connective, Node};
use crate::expression::tokenizer::tokenize;
use crate::expression::validator::validate_node;
use tracing::debug;

/// Parse rule text and check every resulting leaf against the condition grammar.
///
/// A leaf that breaks the grammar (e.g. `user.age > 30`) is a parse failure
/// here, reported as [`RuleEngineError::InvalidCondition`].
pub fn parse_rule(text: &str) -> Result<Node> {
    let node = parse(text)?;
    validate_node(&node).map_err(|err| match err {
        RuleEngineError::InvalidNode { reason, .. } => RuleEngineError::InvalidCondition(reason),
        other => other,
    })?;
    Ok(node)
}

/// Parse rule text into an expression tree
pub fn parse(text: &str) -> Result<Node> {
    parse_with_limit(text, config::max_depth())
}

fn parse_with_limit(text: &str, max_depth: usize) -> Result<Node> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(RuleEngineError::EmptyExpression);
    }

    let mut cursor = Cursor::new(&tokens, max_depth);
    let (node, _) = cursor.expression()?;

    if let Some(extra) = cursor.advance() {
        return Err(if extra == ")" {
            RuleEngineError::MismatchedParentheses
        } else {
            RuleEngineError::UnexpectedToken(extra.to_string())
        });
    }

    debug!(tokens = tokens.len(), nodes = node.size(), "parsed rule expression");
    Ok(node)
}

struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
    /// Open parentheses around the current position
    nesting: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [String], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Parses an expression, returning it with its tree depth
    fn expression(&mut self) -> Result<(Node, usize)> {
        let (mut left, mut depth) = self.term()?;

        while let Some(connective) = self.peek().and_then(Connective::from_token) {
            self.pos += 1;
            let (right, right_depth) = self.term()?;
            depth = depth.max(right_depth) + 1;
            if depth > self.max_depth {
                return Err(RuleEngineError::NestingTooDeep {
                    max: self.max_depth,
                });
            }
            left = Node::operator(connective, left, right);
        }

        Ok((left, depth))
    }

    fn term(&mut self) -> Result<(Node, usize)> {
        match self.peek() {
            None => Err(RuleEngineError::UnexpectedEnd),
            Some("(") => {
                self.pos += 1;
                self.nesting += 1;
                if self.nesting > self.max_depth {
                    return Err(RuleEngineError::NestingTooDeep {
                        max: self.max_depth,
                    });
                }
                let parsed = self.expression()?;
                self.nesting -= 1;
                match self.advance() {
                    Some(")") => Ok(parsed),
                    _ => Err(RuleEngineError::MismatchedParentheses),
                }
            }
            Some(_) => Ok((self.condition()?, 1)),
        }
    }

    fn condition(&mut self) -> Result<Node> {
        let attribute = self.operand()?.ok_or(RuleEngineError::UnexpectedEnd)?;

        let operator = self.operand()?.ok_or_else(|| {
            RuleEngineError::IncompleteCondition(format!(
                "missing operator and value after '{}'",
                attribute
            ))
        })?;

        let literal = self.operand()?.ok_or_else(|| {
            RuleEngineError::IncompleteCondition(format!(
                "missing value after '{} {}'",
                attribute, operator
            ))
        })?;

        let operator = ComparisonOp::from_token(operator)
            .ok_or_else(|| RuleEngineError::InvalidOperator(operator.to_string()))?;

        Ok(Node::condition(attribute, operator, literal))
    }

    /// Next token inside a condition; parentheses cannot appear there
    fn operand(&mut self) -> Result<Option<&'a str>> {
        match self.peek() {
            None => Ok(None),
            Some(paren @ ("(" | ")")) => Err(RuleEngineError::UnexpectedToken(paren.to_string())),
            Some(token) => {
                self.pos += 1;
                Ok(Some(token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::Condition;

    #[test]
    fn test_parse_simple_condition() {
        let ast = parse("age > 30").unwrap();
        match ast {
            Node::Condition(cond) => {
                assert_eq!(cond.attribute, "age");
                assert_eq!(cond.operator, ComparisonOp::Greater);
                assert_eq!(cond.literal, "30");
            }
            _ => panic!("Expected condition"),
        }
    }

    #[test]
    fn test_parse_and_condition() {
        let ast = parse("age > 30 AND department = 'Sales'").unwrap();
        assert_eq!(
            ast,
            Node::and(
                Node::condition("age", ComparisonOp::Greater, "30"),
                Node::condition("department", ComparisonOp::Equal, "'Sales'"),
            )
        );
    }

    #[test]
    fn test_parse_folds_left_without_precedence() {
        // a OR b AND c is (a OR b) AND c
        let ast = parse("a > 1 OR b > 2 AND c > 3").unwrap();
        match ast {
            Node::Operator {
                connective: Connective::And,
                left,
                right,
            } => {
                assert!(matches!(
                    *left,
                    Node::Operator {
                        connective: Connective::Or,
                        ..
                    }
                ));
                assert!(right.is_condition());
            }
            _ => panic!("Expected AND at the root"),
        }
    }

    #[test]
    fn test_parse_parentheses_group_right_side() {
        let ast = parse("attr > 30 AND (dept = 'Sales' OR dept = 'Ops')").unwrap();
        match ast {
            Node::Operator {
                connective: Connective::And,
                right,
                ..
            } => assert!(matches!(
                *right,
                Node::Operator {
                    connective: Connective::Or,
                    ..
                }
            )),
            _ => panic!("Expected AND at the root"),
        }
    }

    #[test]
    fn test_parse_all_operators() {
        for op in ComparisonOp::ALL {
            let text = format!("score {} 10", op);
            match parse(&text).unwrap() {
                Node::Condition(cond) => assert_eq!(cond.operator, op, "Failed for: {}", text),
                _ => panic!("Expected condition for: {}", text),
            }
        }
    }

    #[test]
    fn test_parse_quoted_literal_with_spaces() {
        let ast = parse("team = \"Platform Ops\"").unwrap();
        assert_eq!(
            ast,
            Node::Condition(Condition::new("team", ComparisonOp::Equal, "\"Platform Ops\""))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(RuleEngineError::EmptyExpression));
        assert_eq!(parse("   "), Err(RuleEngineError::EmptyExpression));
        assert!(matches!(
            parse("age >"),
            Err(RuleEngineError::IncompleteCondition(_))
        ));
        assert!(matches!(
            parse("age"),
            Err(RuleEngineError::IncompleteCondition(_))
        ));
        assert_eq!(
            parse("(age > 30"),
            Err(RuleEngineError::MismatchedParentheses)
        );
        assert_eq!(
            parse("age > 30)"),
            Err(RuleEngineError::MismatchedParentheses)
        );
        assert_eq!(
            parse("age == 30"),
            Err(RuleEngineError::InvalidOperator("==".to_string()))
        );
        assert_eq!(parse("age > 30 AND"), Err(RuleEngineError::UnexpectedEnd));
        assert_eq!(
            parse("age > 30 salary > 10"),
            Err(RuleEngineError::UnexpectedToken("salary".to_string()))
        );
        assert_eq!(
            parse("age > (30)"),
            Err(RuleEngineError::UnexpectedToken("(".to_string()))
        );
    }

    #[test]
    fn test_parse_rule_rejects_non_identifier_attribute() {
        assert!(parse("user.age > 30").is_ok());
        let err = parse_rule("user.age > 30").unwrap_err();
        assert!(matches!(err, RuleEngineError::InvalidCondition(_)), "{}", err);
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }

    #[test]
    fn test_deep_parentheses_rejected() {
        let text = format!("{}a > 1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(
            parse(&text),
            Err(RuleEngineError::NestingTooDeep { max: 256 })
        );

        let text = format!("{}a > 1{}", "(".repeat(256), ")".repeat(256));
        assert!(parse_rule(&text).is_ok());
    }

    #[test]
    fn test_long_chain_rejected() {
        let text = vec!["a > 1"; 50_000].join(" AND ");
        let err = parse_rule(&text).unwrap_err();
        assert_eq!(err, RuleEngineError::NestingTooDeep { max: 256 });
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);

        // 256 conditions fold into a tree 256 nodes deep
        let text = vec!["a > 1"; 256].join(" OR ");
        assert_eq!(parse_rule(&text).unwrap().depth(), 256);
    }

    #[test]
    fn test_explicit_depth_limit() {
        assert!(parse_with_limit("a > 1 AND b > 2", 2).is_ok());
        assert_eq!(
            parse_with_limit("a > 1 AND b > 2 AND c > 3", 2),
            Err(RuleEngineError::NestingTooDeep { max: 2 })
        );
        assert_eq!(
            parse_with_limit("((a > 1))", 1),
            Err(RuleEngineError::NestingTooDeep { max: 1 })
        );
    }

    #[test]
    fn test_parse_nested_parentheses() {
        let ast = parse("((a > 1))").unwrap();
        assert_eq!(ast, Node::condition("a", ComparisonOp::Greater, "1"));
    }
}
