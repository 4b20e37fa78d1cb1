//! Expression tree for rule expressions

use std::cmp::Ordering;
use std::fmt;

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf comparison like "age > 30"
    Condition(Condition),
    /// AND / OR over two owned subtrees
    Operator {
        connective: Connective,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn condition(
        attribute: impl Into<String>,
        operator: ComparisonOp,
        literal: impl Into<String>,
    ) -> Self {
        Node::Condition(Condition::new(attribute, operator, literal))
    }

    pub fn operator(connective: Connective, left: Node, right: Node) -> Self {
        Node::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::operator(Connective::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::operator(Connective::Or, left, right)
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, Node::Condition(_))
    }

    /// Iterate over the condition leaves, left to right
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut leaves = Vec::new();
        self.collect_conditions(&mut leaves);
        leaves
    }

    fn collect_conditions<'a>(&'a self, leaves: &mut Vec<&'a Condition>) {
        match self {
            Node::Condition(cond) => leaves.push(cond),
            Node::Operator { left, right, .. } => {
                left.collect_conditions(leaves);
                right.collect_conditions(leaves);
            }
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Node::Condition(_) => 1,
            Node::Operator { left, right, .. } => 1 + left.size() + right.size(),
        }
    }

    /// Longest root-to-leaf path, counted in nodes.
    ///
    /// Walks with an explicit stack so any tree can be measured.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if let Node::Operator { left, right, .. } = node {
                pending.push((left.as_ref(), depth + 1));
                pending.push((right.as_ref(), depth + 1));
            }
        }
        deepest
    }
}

/// Renders the tree back to rule text.
///
/// Chains fold to the left when parsed, so only a right operand that is itself
/// an operator needs parentheses.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Condition(cond) => write!(f, "{}", cond),
            Node::Operator {
                connective,
                left,
                right,
            } => {
                write!(f, "{} {} ", left, connective)?;
                if right.is_condition() {
                    write!(f, "{}", right)
                } else {
                    write!(f, "({})", right)
                }
            }
        }
    }
}

/// Single comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub operator: ComparisonOp,
    /// Literal token as written, quotes included
    pub literal: String,
}

impl Condition {
    pub fn new(
        attribute: impl Into<String>,
        operator: ComparisonOp,
        literal: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            literal: literal.into(),
        }
    }

    /// Encoded leaf text: attribute, operator and literal joined by single spaces
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Literal with one layer of matching surrounding quotes removed
    pub fn unquoted_literal(&self) -> &str {
        strip_quotes(&self.literal)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.literal)
    }
}

pub(crate) fn strip_quotes(literal: &str) -> &str {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Equal (=)
    Equal,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Not equal (!=)
    NotEqual,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 6] = [
        ComparisonOp::Greater,
        ComparisonOp::Less,
        ComparisonOp::Equal,
        ComparisonOp::GreaterEqual,
        ComparisonOp::LessEqual,
        ComparisonOp::NotEqual,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            "=" => Some(Self::Equal),
            ">=" => Some(Self::GreaterEqual),
            "<=" => Some(Self::LessEqual),
            "!=" => Some(Self::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::Less => "<",
            Self::Equal => "=",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::NotEqual => "!=",
        }
    }

    /// Whether the ordering of `data` relative to the literal satisfies this operator
    #[inline]
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Greater => ordering == Ordering::Greater,
            Self::Less => ordering == Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
            Self::GreaterEqual => ordering != Ordering::Less,
            Self::LessEqual => ordering != Ordering::Greater,
            Self::NotEqual => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connectives (case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    #[inline]
    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_text() {
        let cond = Condition::new("department", ComparisonOp::Equal, "'Sales'");
        assert_eq!(cond.text(), "department = 'Sales'");
        assert_eq!(cond.unquoted_literal(), "Sales");
    }

    #[test]
    fn test_strip_quotes_requires_matching_pair() {
        assert_eq!(strip_quotes("'a b'"), "a b");
        assert_eq!(strip_quotes("\"x\""), "x");
        assert_eq!(strip_quotes("'x\""), "'x\"");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("30"), "30");
    }

    #[test]
    fn test_operator_accepts() {
        use Ordering::*;
        assert!(ComparisonOp::Greater.accepts(Greater));
        assert!(!ComparisonOp::Greater.accepts(Equal));
        assert!(ComparisonOp::GreaterEqual.accepts(Equal));
        assert!(ComparisonOp::LessEqual.accepts(Less));
        assert!(!ComparisonOp::LessEqual.accepts(Greater));
        assert!(ComparisonOp::NotEqual.accepts(Less));
        assert!(!ComparisonOp::NotEqual.accepts(Equal));
    }

    #[test]
    fn test_operator_tokens() {
        for op in ComparisonOp::ALL {
            assert_eq!(ComparisonOp::from_token(op.as_str()), Some(op));
        }
        assert_eq!(ComparisonOp::from_token("=="), None);
        assert_eq!(Connective::from_token("and"), None);
        assert_eq!(Connective::from_token("OR"), Some(Connective::Or));
    }

    #[test]
    fn test_display_parenthesizes_right_operators() {
        let a = Node::condition("a", ComparisonOp::Greater, "1");
        let b = Node::condition("b", ComparisonOp::Less, "2");
        let c = Node::condition("c", ComparisonOp::Equal, "'x'");

        let left_chain = Node::or(Node::and(a.clone(), b.clone()), c.clone());
        assert_eq!(left_chain.to_string(), "a > 1 AND b < 2 OR c = 'x'");

        let right_group = Node::and(a, Node::or(b, c));
        assert_eq!(right_group.to_string(), "a > 1 AND (b < 2 OR c = 'x')");
    }

    #[test]
    fn test_tree_metrics() {
        let a = Node::condition("a", ComparisonOp::Greater, "1");
        let tree = Node::and(a.clone(), Node::or(a.clone(), a));
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.conditions().len(), 3);
    }

    #[test]
    fn test_depth_of_long_chain() {
        let leaf = Node::condition("a", ComparisonOp::Greater, "1");
        let chain = (0..200).fold(leaf.clone(), |acc, _| Node::and(acc, leaf.clone()));
        assert_eq!(chain.depth(), 201);
        assert_eq!(chain.size(), 401);
    }
}
