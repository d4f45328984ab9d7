//! # Tabula
//!
//! Compiles declarative ad-hoc report specifications into safe relational
//! queries and executes them through a pluggable schema provider.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Specification Document (parsed tree)              │
//! │   (table, fields, filter, sort, placeholders)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [placeholder resolution + spec model]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ReportSpec (Rust types)                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolver + planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │     QueryPlan (joins, predicate, sort, pagination)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema provider]
//! ┌─────────────────────────────────────────────────────────┐
//! │          ResultSet (rows, labels, linked keys)           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs over a fill-mode parse before any query is built; the
//! filter language is a closed operator catalog, so nothing from a
//! specification document is ever interpolated into a backend verbatim.

pub mod error;
pub mod export;
pub mod plan;
pub mod processor;
pub mod resolve;
pub mod schema;
pub mod spec;
pub mod validate;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::export::CsvExporter;
    pub use crate::plan::predicate::{CompareOp, Predicate};
    pub use crate::plan::{ColumnRef, QueryPlan};
    pub use crate::processor::{Processor, ResultSet, RunOptions};
    pub use crate::schema::value::{ColumnType, Value};
    pub use crate::schema::{
        Association, MemoryProvider, SchemaProvider, ScopeCall, TableDef,
    };
    pub use crate::spec::document::{DocValue, MergeResolver, NilFillResolver, Resolver};
    pub use crate::spec::ReportSpec;
    pub use crate::validate::ValidationError;
}
