//! Query planning.
//!
//! Turns a typed [`ReportSpec`] into a [`QueryPlan`]: a base table, a
//! deduplicated inner-join list, a compiled predicate, resolved sort keys,
//! and a pagination window. The plan is backend-neutral; execution belongs
//! to the schema collaborator.

pub mod predicate;

use crate::error::QueryResult;
use crate::plan::predicate::Predicate;
use crate::resolve::AssociationResolver;
use crate::schema::SchemaProvider;
use crate::spec::{ReportSpec, SortDir};

/// A fully qualified column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// One inner join: the target table, the equality condition, and the
/// discriminator predicate for polymorphic associations.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub target: String,
    /// `(source column, target column)` equality.
    pub on: (ColumnRef, ColumnRef),
    pub discriminator: Option<Predicate>,
}

/// The join list plus every entity the plan touches, base first, in
/// first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinPlan {
    pub joins: Vec<Join>,
    pub entities: Vec<String>,
}

/// The backend-neutral query plan.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub base: String,
    pub select: Vec<ColumnRef>,
    pub joins: JoinPlan,
    pub predicate: Option<Predicate>,
    pub sort: Vec<(ColumnRef, SortDir)>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub distinct: bool,
}

/// Builds a deduplicated join list from association chains.
///
/// Two chains that resolve to the same target under the same condition
/// share one join, so shared prefixes join once.
pub struct JoinPlanner {
    plan: JoinPlan,
}

impl JoinPlanner {
    pub fn new(base: &str) -> Self {
        Self {
            plan: JoinPlan {
                joins: Vec::new(),
                entities: vec![base.to_string()],
            },
        }
    }

    /// Add the joins for every key the spec touches.
    pub fn add_spec<P: SchemaProvider>(
        &mut self,
        spec: &ReportSpec,
        resolver: &mut AssociationResolver<'_, P>,
    ) -> QueryResult<()> {
        for key in spec.all_keys() {
            self.add_key(&key, resolver)?;
        }
        Ok(())
    }

    pub fn add_key<P: SchemaProvider>(
        &mut self,
        key: &str,
        resolver: &mut AssociationResolver<'_, P>,
    ) -> QueryResult<()> {
        let chain = ReportSpec::association_chain(key)?;
        let resolved = resolver.resolve(&chain)?;
        for hop in resolved.iter() {
            let join = Join {
                target: hop.target.clone(),
                on: (
                    ColumnRef::new(&hop.source, &hop.foreign_key),
                    ColumnRef::new(&hop.target, "id"),
                ),
                discriminator: hop.discriminator.as_ref().map(|(column, expected)| {
                    Predicate::Compare {
                        column: ColumnRef::new(&hop.source, column),
                        op: predicate::CompareOp::Eq,
                        value: expected.clone().into(),
                    }
                }),
            };
            if !self.plan.joins.contains(&join) {
                self.plan.joins.push(join);
            }
            if !self.plan.entities.iter().any(|e| e == &hop.target) {
                self.plan.entities.push(hop.target.clone());
            }
        }
        Ok(())
    }

    pub fn finish(self) -> JoinPlan {
        self.plan
    }
}

/// Resolve the sort list to qualified columns, preserving precedence order.
pub fn compile_sort<P: SchemaProvider>(
    spec: &ReportSpec,
    resolver: &mut AssociationResolver<'_, P>,
) -> QueryResult<Vec<(ColumnRef, SortDir)>> {
    let mut sort = Vec::with_capacity(spec.sort.len());
    for item in &spec.sort {
        let (column, chain) = ReportSpec::parse_key(&item.key)?;
        let entity = resolver.target_entity(&chain)?;
        sort.push((ColumnRef::new(entity, column), item.dir));
    }
    Ok(sort)
}

/// Resolve a dotted key to its qualified column.
pub fn key_to_column<P: SchemaProvider>(
    key: &str,
    resolver: &mut AssociationResolver<'_, P>,
) -> QueryResult<ColumnRef> {
    let (column, chain) = ReportSpec::parse_key(key)?;
    let entity = resolver.target_entity(&chain)?;
    Ok(ColumnRef::new(entity, column))
}
