//! Parsed specification documents and placeholder resolution.
//!
//! The structured-text parser itself lives outside this crate; its boundary
//! is [`DocValue`], an ordered tree of scalars, sequences, and mappings.
//! Placeholders reference values supplied separately at call time and are
//! substituted by a [`Resolver`] before the spec model is built.

use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};

/// A node of a parsed specification document.
///
/// Mappings preserve insertion order; field and filter semantics depend on
/// it.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<DocValue>),
    Mapping(Vec<(String, DocValue)>),
    /// A named placeholder to be filled from the merge dictionary.
    Placeholder(String),
}

impl DocValue {
    /// Look up a key in a mapping node. Returns `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        match self {
            DocValue::Mapping(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, DocValue::Mapping(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Substitute every placeholder in the tree through `resolver`,
    /// returning a placeholder-free copy. Pure; the compiler downstream
    /// never sees placeholders.
    pub fn resolve(&self, resolver: &dyn Resolver) -> QueryResult<DocValue> {
        match self {
            DocValue::Placeholder(name) => resolver.resolve(name),
            DocValue::Sequence(items) => items
                .iter()
                .map(|v| v.resolve(resolver))
                .collect::<QueryResult<Vec<_>>>()
                .map(DocValue::Sequence),
            DocValue::Mapping(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), v.resolve(resolver)?)))
                .collect::<QueryResult<Vec<_>>>()
                .map(DocValue::Mapping),
            other => Ok(other.clone()),
        }
    }

    /// Bridge from `serde_json::Value` for callers that parse their
    /// specification text with serde. JSON has no placeholder syntax, so
    /// the result is always placeholder-free; external parsers that support
    /// placeholders construct [`DocValue`] directly.
    pub fn from_json(value: serde_json::Value) -> DocValue {
        match value {
            serde_json::Value::Null => DocValue::Null,
            serde_json::Value::Bool(b) => DocValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DocValue::Int(i)
                } else {
                    DocValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => DocValue::String(s),
            serde_json::Value::Array(items) => {
                DocValue::Sequence(items.into_iter().map(DocValue::from_json).collect())
            }
            serde_json::Value::Object(map) => DocValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, DocValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Strategy for resolving placeholders.
///
/// Two implementations exist: [`MergeResolver`] for execution parses (values
/// are required) and [`NilFillResolver`] for fill-mode parses (structure is
/// inspected before runtime values exist).
pub trait Resolver {
    fn resolve(&self, name: &str) -> QueryResult<DocValue>;
}

/// Resolves placeholders from a runtime-supplied merge dictionary; unknown
/// names are an error.
pub struct MergeResolver<'a> {
    merge: &'a HashMap<String, DocValue>,
}

impl<'a> MergeResolver<'a> {
    pub fn new(merge: &'a HashMap<String, DocValue>) -> Self {
        Self { merge }
    }
}

impl Resolver for MergeResolver<'_> {
    fn resolve(&self, name: &str) -> QueryResult<DocValue> {
        self.merge
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownMergeKey(name.to_string()))
    }
}

/// Fill mode: every placeholder resolves to an absent value.
pub struct NilFillResolver;

impl Resolver for NilFillResolver {
    fn resolve(&self, _name: &str) -> QueryResult<DocValue> {
        Ok(DocValue::Null)
    }
}
