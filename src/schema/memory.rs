//! In-memory schema backend.
//!
//! Holds table definitions, association declarations, scope closures, and
//! rows, and executes query plans with a straightforward nested-loop
//! evaluator. This is the backend the test suites run against; it models
//! the relational semantics a SQL backend would provide.

use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};
use crate::plan::predicate::Predicate;
use crate::plan::{ColumnRef, QueryPlan};
use crate::schema::value::{ColumnType, Value};
use crate::schema::{Association, SchemaProvider, ScopeCall};

type ScopeFn = Box<dyn Fn(&[Value]) -> Predicate>;

/// A table definition under construction. Columns are positional; rows are
/// given in declared column order.
pub struct TableDef {
    name: String,
    columns: Vec<(String, ColumnType)>,
    associations: HashMap<String, Association>,
    scopes: HashMap<String, ScopeFn>,
    rows: Vec<Vec<Value>>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            associations: HashMap::new(),
            scopes: HashMap::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push((name.into(), column_type));
        self
    }

    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations
            .insert(name.into(), Association::to_table(target, foreign_key));
        self
    }

    pub fn belongs_to_polymorphic(
        mut self,
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        foreign_type: impl Into<String>,
    ) -> Self {
        self.associations
            .insert(name.into(), Association::polymorphic(foreign_key, foreign_type));
        self
    }

    pub fn scope(
        mut self,
        name: impl Into<String>,
        constraint: impl Fn(&[Value]) -> Predicate + 'static,
    ) -> Self {
        self.scopes.insert(name.into(), Box::new(constraint));
        self
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|(name, _)| name == column)
    }
}

/// The in-memory backend.
#[derive(Default)]
pub struct MemoryProvider {
    tables: HashMap<String, TableDef>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableDef) {
        self.tables.insert(table.name.clone(), table);
    }

    fn table(&self, name: &str) -> QueryResult<&TableDef> {
        self.tables
            .get(name)
            .ok_or_else(|| QueryError::Execution(format!("unknown table '{}'", name)))
    }

    /// An unknown filter or sort column is an execution error, not an
    /// empty match; `Null` stands only for absent values.
    fn check_column(&self, column: &ColumnRef) -> QueryResult<()> {
        if self.table(&column.table)?.column_index(&column.column).is_none() {
            return Err(QueryError::Execution(format!(
                "unknown column '{}.{}'",
                column.table, column.column
            )));
        }
        Ok(())
    }

    /// Join and filter; returns one binding (table name to row index) per
    /// surviving row combination, in base-table row order.
    fn matching_bindings<'a>(&'a self, plan: &'a QueryPlan) -> QueryResult<Vec<Binding<'a>>> {
        if let Some(predicate) = &plan.predicate {
            let mut columns = Vec::new();
            predicate.collect_columns(&mut columns);
            for column in columns {
                self.check_column(column)?;
            }
        }
        for (column, _) in &plan.sort {
            self.check_column(column)?;
        }

        let base = self.table(&plan.base)?;
        let mut bindings: Vec<Binding<'_>> = (0..base.rows.len())
            .map(|index| {
                let mut binding = HashMap::new();
                binding.insert(plan.base.as_str(), (base, index));
                binding
            })
            .collect();

        for join in &plan.joins.joins {
            let target = self.table(&join.target)?;
            let mut expanded = Vec::new();
            for binding in bindings {
                let source_value = cell(&binding, &join.on.0)?;
                if source_value.is_null() {
                    continue;
                }
                for index in 0..target.rows.len() {
                    let mut candidate = binding.clone();
                    candidate.insert(join.target.as_str(), (target, index));
                    let target_value = cell(&candidate, &join.on.1)?;
                    let matched = source_value
                        .compare(&target_value)
                        .is_some_and(|o| o.is_eq());
                    if !matched {
                        continue;
                    }
                    if let Some(discriminator) = &join.discriminator {
                        if !evaluate(discriminator, &candidate) {
                            continue;
                        }
                    }
                    expanded.push(candidate);
                }
            }
            bindings = expanded;
        }

        if let Some(predicate) = &plan.predicate {
            bindings.retain(|binding| evaluate(predicate, binding));
        }

        if !plan.sort.is_empty() {
            bindings.sort_by(|a, b| {
                for (column, dir) in &plan.sort {
                    let left = cell(a, column).unwrap_or(Value::Null);
                    let right = cell(b, column).unwrap_or(Value::Null);
                    let ordering = left
                        .compare(&right)
                        .unwrap_or(std::cmp::Ordering::Equal);
                    let ordering = match dir {
                        crate::spec::SortDir::Asc => ordering,
                        crate::spec::SortDir::Desc => ordering.reverse(),
                    };
                    if !ordering.is_eq() {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        Ok(bindings)
    }
}

type Binding<'a> = HashMap<&'a str, (&'a TableDef, usize)>;

fn cell(binding: &Binding<'_>, column: &ColumnRef) -> QueryResult<Value> {
    let (table, row) = binding.get(column.table.as_str()).ok_or_else(|| {
        QueryError::Execution(format!("table '{}' is not part of the plan", column.table))
    })?;
    let index = table.column_index(&column.column).ok_or_else(|| {
        QueryError::Execution(format!(
            "unknown column '{}.{}'",
            column.table, column.column
        ))
    })?;
    table.rows[*row].get(index).cloned().ok_or_else(|| {
        QueryError::Execution(format!(
            "row in '{}' is missing column '{}'",
            column.table, column.column
        ))
    })
}

fn evaluate(predicate: &Predicate, binding: &Binding<'_>) -> bool {
    let lookup = |column: &ColumnRef| cell(binding, column).unwrap_or(Value::Null);
    predicate.evaluate(&lookup)
}

impl SchemaProvider for MemoryProvider {
    fn column_type(&self, entity: &str, column: &str) -> Option<ColumnType> {
        let table = self.tables.get(entity)?;
        let index = table.column_index(column)?;
        Some(table.columns[index].1)
    }

    fn association(&self, entity: &str, name: &str) -> Option<Association> {
        self.tables.get(entity)?.associations.get(name).cloned()
    }

    fn scope_constraint(&self, entity: &str, call: &ScopeCall) -> Option<Predicate> {
        let scope = self.tables.get(entity)?.scopes.get(&call.name)?;
        Some(scope(&call.args))
    }

    fn execute(&self, plan: &QueryPlan) -> QueryResult<Vec<Vec<Value>>> {
        let bindings = self.matching_bindings(plan)?;

        let mut rows = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            let row = plan
                .select
                .iter()
                .map(|column| cell(binding, column))
                .collect::<QueryResult<Vec<_>>>()?;
            rows.push(row);
        }

        if plan.distinct {
            let mut deduped: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
            for row in rows {
                if !deduped.contains(&row) {
                    deduped.push(row);
                }
            }
            rows = deduped;
        }

        let offset = plan.offset.unwrap_or(0) as usize;
        let rows: Vec<Vec<Value>> = rows.into_iter().skip(offset).collect();
        Ok(match plan.limit {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        })
    }

    fn count(&self, plan: &QueryPlan) -> QueryResult<u64> {
        let total = self.matching_bindings(plan)?.len() as u64;
        let after_offset = total.saturating_sub(plan.offset.unwrap_or(0));
        Ok(match plan.limit {
            Some(limit) => after_offset.min(limit),
            None => after_offset,
        })
    }
}
