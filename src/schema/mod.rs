//! The schema boundary.
//!
//! [`SchemaProvider`] is the single trait the compiler talks to: it
//! answers metadata questions (column types, associations, scopes) and
//! executes plans. [`memory::MemoryProvider`] is the in-crate backend used
//! by the test suites; production backends implement the same trait over
//! their own catalog and engine.

pub mod memory;
pub mod value;

pub use self::memory::{MemoryProvider, TableDef};
pub use self::value::{ColumnType, Value};

use crate::error::QueryResult;
use crate::plan::predicate::Predicate;
use crate::plan::QueryPlan;

/// A schema association, as declared on its source entity.
///
/// `foreign_type` set means the association is polymorphic: the target is
/// carried per row in that column and `target` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub target: Option<String>,
    pub foreign_key: String,
    pub foreign_type: Option<String>,
}

impl Association {
    pub fn to_table(target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            foreign_key: foreign_key.into(),
            foreign_type: None,
        }
    }

    pub fn polymorphic(foreign_key: impl Into<String>, foreign_type: impl Into<String>) -> Self {
        Self {
            target: None,
            foreign_key: foreign_key.into(),
            foreign_type: Some(foreign_type.into()),
        }
    }
}

/// A scope invocation: a named query fragment with positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl ScopeCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Metadata and execution backend for the compiler.
pub trait SchemaProvider {
    /// The authoritative type of a column; `None` when the table or column
    /// does not exist.
    fn column_type(&self, entity: &str, column: &str) -> Option<ColumnType>;

    /// Look up an association declared on `entity`.
    fn association(&self, entity: &str, name: &str) -> Option<Association>;

    /// The predicate a named scope contributes for `entity`; `None` when
    /// the entity does not define the scope.
    fn scope_constraint(&self, entity: &str, call: &ScopeCall) -> Option<Predicate>;

    /// Execute a plan, returning one row per result in select-list order.
    fn execute(&self, plan: &QueryPlan) -> QueryResult<Vec<Vec<Value>>>;

    /// Count the rows a plan matches, before select-list deduplication,
    /// clipped to the plan's pagination window.
    fn count(&self, plan: &QueryPlan) -> QueryResult<u64>;
}
