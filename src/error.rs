//! Crate-wide error types.

use thiserror::Error;

/// Result type for compilation and execution operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while compiling or executing a report specification.
///
/// Every variant is fatal to the current call: nothing is retried and no
/// partial results are produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The specification failed validation; carries the first violation
    /// message. `run` refuses to execute an invalid spec.
    #[error("can't run, spec is invalid: {0}")]
    InvalidSpecification(String),

    /// A dotted key referenced an association the current entity does not
    /// define.
    #[error("invalid association '{name}' on '{entity}'")]
    UnknownAssociation { entity: String, name: String },

    /// A polymorphic association was referenced without a `|Type` qualifier.
    #[error("must provide type for association '{0}'")]
    PolymorphicTypeRequired(String),

    /// A placeholder named a merge key that was not supplied.
    #[error("unknown merge key '{0}'")]
    UnknownMergeKey(String),

    /// A configured scope is not defined on an entity the query touches.
    #[error("scope '{name}' does not exist on '{entity}'")]
    UndefinedScope { entity: String, name: String },

    /// A filter used an operator name outside the catalog.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// An operator was given an operand of the wrong shape or arity.
    #[error("invalid operand for '{operator}': {reason}")]
    InvalidOperand { operator: String, reason: String },

    /// A dotted key could not be split into association hops and a column.
    #[error("invalid field path '{0}'")]
    InvalidPath(String),

    /// The document is structurally unusable (missing or mis-typed
    /// sections). `run` surfaces these through validation instead; `count`
    /// skips validation and reports them directly.
    #[error("malformed specification: {0}")]
    MalformedSpec(String),

    /// The schema/execution collaborator failed to run the compiled plan.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl QueryError {
    /// Convenience constructor for operand shape errors.
    pub fn invalid_operand(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            operator: operator.into(),
            reason: reason.into(),
        }
    }
}
