//! The specification model.
//!
//! A [`ReportSpec`] is the typed form of a parsed, placeholder-resolved
//! specification document: the base table, ordered field selections, a
//! recursive filter tree, and an ordered sort list. It also owns the
//! dotted-key helpers that split `assoc1.assoc2.column` paths into
//! association hops and a column.

pub mod document;
pub mod filter;

use crate::error::{QueryError, QueryResult};
use crate::spec::document::DocValue;
use crate::spec::filter::FilterNode;

/// A single association hop in a dotted key, e.g. `album` or
/// `owner|Record` (polymorphic, with an expected discriminator type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hop {
    pub name: String,
    pub type_hint: Option<String>,
}

impl Hop {
    fn parse(segment: &str, key: &str) -> QueryResult<Hop> {
        let (name, type_hint) = match segment.split_once('|') {
            Some((name, hint)) => {
                if hint.is_empty() {
                    return Err(QueryError::InvalidPath(key.to_string()));
                }
                (name, Some(hint.to_string()))
            }
            None => (segment, None),
        };
        if name.is_empty() {
            return Err(QueryError::InvalidPath(key.to_string()));
        }
        Ok(Hop {
            name: name.to_string(),
            type_hint,
        })
    }
}

/// Options declared on a selected field.
///
/// The declared type is documentation-grade: the validator checks it, but
/// casting always follows the schema's authoritative column type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub type_name: Option<String>,
    pub label: Option<String>,
    pub link: bool,
}

/// The fixed set of declarable field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    String,
    DateTime,
    Boolean,
    Text,
    Decimal,
    Float,
    Date,
}

impl DataType {
    pub fn parse(name: &str) -> Option<DataType> {
        match name {
            "integer" => Some(DataType::Integer),
            "string" => Some(DataType::String),
            "datetime" => Some(DataType::DateTime),
            "boolean" => Some(DataType::Boolean),
            "text" => Some(DataType::Text),
            "decimal" => Some(DataType::Decimal),
            "float" => Some(DataType::Float),
            "date" => Some(DataType::Date),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// One sort entry; list order is tie-break precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct SortItem {
    pub key: String,
    pub dir: SortDir,
}

/// The typed specification, immutable per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub table: String,
    pub fields: Vec<(String, FieldOptions)>,
    pub filter: FilterNode,
    pub sort: Vec<SortItem>,
}

impl ReportSpec {
    /// Build the typed spec from a placeholder-resolved document.
    ///
    /// Shape problems surface as [`QueryError::MalformedSpec`]; `run`
    /// catches them earlier through validation, `count` does not.
    pub fn parse(doc: &DocValue) -> QueryResult<ReportSpec> {
        let table = doc
            .get("table")
            .and_then(DocValue::as_str)
            .ok_or_else(|| QueryError::MalformedSpec("table must be defined".into()))?
            .to_string();

        let fields = match doc.get("fields") {
            Some(DocValue::Mapping(entries)) => entries
                .iter()
                .map(|(key, options)| Ok((key.clone(), FieldOptions::parse(options)?)))
                .collect::<QueryResult<Vec<_>>>()?,
            _ => return Err(QueryError::MalformedSpec("fields must be a map".into())),
        };

        let filter = match doc.get("filter") {
            Some(value) => FilterNode::parse(value)?,
            None => return Err(QueryError::MalformedSpec("filter must be defined".into())),
        };

        let sort = match doc.get("sort") {
            Some(DocValue::Sequence(items)) => items
                .iter()
                .map(SortItem::parse)
                .collect::<QueryResult<Vec<_>>>()?,
            Some(DocValue::Null) => Vec::new(),
            _ => return Err(QueryError::MalformedSpec("sort must be defined".into())),
        };

        Ok(ReportSpec {
            table,
            fields,
            filter,
            sort,
        })
    }

    /// Split a dotted key into its raw segments.
    pub fn split_key(key: &str) -> Vec<&str> {
        key.split('.').collect()
    }

    /// Split a dotted key into `(column, association hops)`: the last
    /// segment is the column, everything before it is the chain.
    pub fn parse_key(key: &str) -> QueryResult<(String, Vec<Hop>)> {
        let segments = Self::split_key(key);
        let (column, chain_segments) = segments
            .split_last()
            .ok_or_else(|| QueryError::InvalidPath(key.to_string()))?;
        if column.is_empty() {
            return Err(QueryError::InvalidPath(key.to_string()));
        }
        let chain = chain_segments
            .iter()
            .map(|segment| Hop::parse(segment, key))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok((column.to_string(), chain))
    }

    /// The association chain of a key (empty for top-level columns).
    pub fn association_chain(key: &str) -> QueryResult<Vec<Hop>> {
        Ok(Self::parse_key(key)?.1)
    }

    /// Every key the spec touches: field keys, all filter leaf keys
    /// (recursively), and sort keys, in that order. Duplicates are kept;
    /// downstream consumers dedup where it matters.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.fields.iter().map(|(key, _)| key.clone()).collect();
        keys.extend(self.filter.leaf_keys().into_iter().map(String::from));
        keys.extend(self.sort.iter().map(|item| item.key.clone()));
        keys
    }
}

impl FieldOptions {
    fn parse(doc: &DocValue) -> QueryResult<FieldOptions> {
        match doc {
            DocValue::Null => Ok(FieldOptions::default()),
            DocValue::Mapping(_) => {
                let type_name = doc.get("type").and_then(DocValue::as_str).map(String::from);
                let label = doc.get("label").and_then(DocValue::as_str).map(String::from);
                let link = matches!(doc.get("link"), Some(DocValue::Bool(true)));
                Ok(FieldOptions {
                    type_name,
                    label,
                    link,
                })
            }
            _ => Err(QueryError::MalformedSpec(
                "field options must be a map".into(),
            )),
        }
    }
}

impl SortItem {
    fn parse(doc: &DocValue) -> QueryResult<SortItem> {
        match doc {
            DocValue::Mapping(entries) if entries.len() == 1 => {
                let (key, dir) = &entries[0];
                let dir = match dir.as_str() {
                    Some("asc") => SortDir::Asc,
                    Some("desc") => SortDir::Desc,
                    _ => {
                        return Err(QueryError::MalformedSpec(format!(
                            "sort direction for '{}' must be asc or desc",
                            key
                        )))
                    }
                };
                Ok(SortItem {
                    key: key.clone(),
                    dir,
                })
            }
            _ => Err(QueryError::MalformedSpec(
                "each sort entry must be a single key: direction map".into(),
            )),
        }
    }
}
