//! The recursive filter tree.
//!
//! A filter is a boolean tree: groups under the reserved keys `and` / `or`
//! / `not`, and leaves mapping a dotted key to an operator map. The tree is
//! modeled as a tagged union and compiled by a single recursive visitor in
//! [`crate::plan::predicate`].

use crate::error::{QueryError, QueryResult};
use crate::schema::value::Value;
use crate::spec::document::DocValue;

/// Boolean connective of a filter group.
///
/// `Not` combines its children with AND and negates the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Not,
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group {
        connective: Connective,
        children: Vec<FilterNode>,
    },
    Leaf {
        key: String,
        /// Operator name → operand, in document order. All entries under
        /// one key are ANDed together. Names are checked against the
        /// catalog at compile time.
        operators: Vec<(String, Operand)>,
    },
}

/// An operator operand: a scalar or a sequence.
///
/// Sequences may nest one level (quantified membership operators take a
/// sequence of sequences).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    One(Value),
    Many(Vec<Operand>),
}

impl Operand {
    fn parse(doc: &DocValue) -> QueryResult<Operand> {
        match doc {
            DocValue::Sequence(items) => items
                .iter()
                .map(Operand::parse)
                .collect::<QueryResult<Vec<_>>>()
                .map(Operand::Many),
            other => Value::from_doc_scalar(other)
                .map(Operand::One)
                .ok_or_else(|| {
                    QueryError::MalformedSpec("filter operand must be a scalar or sequence".into())
                }),
        }
    }
}

impl FilterNode {
    /// An empty `and` group; compiles to no predicate.
    pub fn empty() -> FilterNode {
        FilterNode::Group {
            connective: Connective::And,
            children: Vec::new(),
        }
    }

    /// Parse a filter mapping. The top level is an implicit `and` group.
    pub fn parse(doc: &DocValue) -> QueryResult<FilterNode> {
        let entries = match doc {
            DocValue::Mapping(entries) => entries,
            DocValue::Null => return Ok(FilterNode::empty()),
            _ => return Err(QueryError::MalformedSpec("filter must be a map".into())),
        };
        Ok(FilterNode::Group {
            connective: Connective::And,
            children: Self::parse_children(entries)?,
        })
    }

    fn parse_children(entries: &[(String, DocValue)]) -> QueryResult<Vec<FilterNode>> {
        entries.iter().map(|(key, value)| Self::parse_entry(key, value)).collect()
    }

    fn parse_entry(key: &str, value: &DocValue) -> QueryResult<FilterNode> {
        let connective = match key {
            "and" => Some(Connective::And),
            "or" => Some(Connective::Or),
            "not" => Some(Connective::Not),
            _ => None,
        };
        if let Some(connective) = connective {
            let entries = match value {
                DocValue::Mapping(entries) => entries.as_slice(),
                DocValue::Null => &[],
                _ => {
                    return Err(QueryError::MalformedSpec(format!(
                        "filter group '{}' must be a map",
                        key
                    )))
                }
            };
            return Ok(FilterNode::Group {
                connective,
                children: Self::parse_children(entries)?,
            });
        }

        let operators = match value {
            DocValue::Mapping(entries) => entries
                .iter()
                .map(|(name, operand)| Ok((name.clone(), Operand::parse(operand)?)))
                .collect::<QueryResult<Vec<_>>>()?,
            DocValue::Null => Vec::new(),
            _ => {
                return Err(QueryError::MalformedSpec(format!(
                    "filter for '{}' must be a map of operators",
                    key
                )))
            }
        };
        Ok(FilterNode::Leaf {
            key: key.to_string(),
            operators,
        })
    }

    /// All leaf keys, recursively across groups, in document order.
    pub fn leaf_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_leaf_keys(&mut keys);
        keys
    }

    fn collect_leaf_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            FilterNode::Leaf { key, .. } => keys.push(key),
            FilterNode::Group { children, .. } => {
                for child in children {
                    child.collect_leaf_keys(keys);
                }
            }
        }
    }
}
