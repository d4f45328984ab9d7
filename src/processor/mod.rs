//! The processor: validate, plan, execute, post-process.
//!
//! [`Processor`] owns one specification document plus its invocation
//! context (scopes, merge values, rejected tables) and exposes the
//! public operations: `run`, `count`, `validate`, and the fill-mode
//! introspection helpers.

use std::collections::HashMap;

use inflector::Inflector;
use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::plan::predicate::{compile_filter, Predicate};
use crate::plan::{compile_sort, key_to_column, ColumnRef, JoinPlanner, QueryPlan};
use crate::resolve::AssociationResolver;
use crate::schema::value::Value;
use crate::schema::{SchemaProvider, ScopeCall};
use crate::spec::document::{DocValue, MergeResolver, NilFillResolver};
use crate::spec::ReportSpec;
use crate::validate::{validate, ValidationError};

/// Pagination for a single invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// Compiles and executes one specification document against a provider.
pub struct Processor<'a, P: SchemaProvider> {
    provider: &'a P,
    document: DocValue,
    rejected_tables: Vec<String>,
    /// Scope invocation groups. Every entity the query touches is run
    /// through every group; an entity that lacks an invoked scope fails
    /// the run with [`QueryError::UndefinedScope`].
    pub scopes: Vec<Vec<ScopeCall>>,
    /// Values substituted for placeholders in merge mode.
    pub merge: HashMap<String, DocValue>,
}

impl<'a, P: SchemaProvider> Processor<'a, P> {
    pub fn new(provider: &'a P, document: DocValue, rejected_tables: Vec<String>) -> Self {
        Self {
            provider,
            document,
            rejected_tables,
            scopes: Vec::new(),
            merge: HashMap::new(),
        }
    }

    /// Run the report: validate, compile, execute, post-process.
    ///
    /// The first validation violation aborts the run as
    /// [`QueryError::InvalidSpecification`].
    pub fn run(&self, options: RunOptions) -> QueryResult<ResultSet> {
        let violations = self.validate()?;
        if let Some(first) = violations.first() {
            return Err(QueryError::InvalidSpecification(first.message.clone()));
        }

        let spec = self.merged_spec()?;
        let mut resolver = AssociationResolver::new(self.provider, spec.table.clone());

        let data_keys = data_keys(&spec);
        let mut select = Vec::with_capacity(data_keys.len());
        for key in &data_keys {
            select.push(key_to_column(key, &mut resolver)?);
        }

        let plan = self.build_plan(&spec, &mut resolver, select, true, options)?;
        let raw = self.provider.execute(&plan)?;
        let rows = self.cast_rows(&plan.select, raw);

        let labels = self.labels(&spec);
        let linked = self.linked(&spec, &mut resolver)?;

        Ok(ResultSet {
            keys: data_keys,
            rows,
            labels,
            linked,
        })
    }

    /// Count matching rows, before select-list deduplication.
    ///
    /// Deliberately skips validation; a malformed document surfaces as the
    /// lower-level [`QueryError::MalformedSpec`] instead.
    pub fn count(&self, options: RunOptions) -> QueryResult<u64> {
        let spec = self.merged_spec()?;
        let mut resolver = AssociationResolver::new(self.provider, spec.table.clone());
        let plan = self.build_plan(&spec, &mut resolver, Vec::new(), false, options)?;
        self.provider.count(&plan)
    }

    /// Validate the document in fill mode; returns all violations.
    pub fn validate(&self) -> QueryResult<Vec<ValidationError>> {
        let doc = self.document.resolve(&NilFillResolver)?;
        validate(&doc, self.provider, &self.rejected_tables)
    }

    /// Every entity the query touches, base first, via a fill-mode parse.
    pub fn all_models(&self) -> QueryResult<Vec<String>> {
        let spec = self.fill_spec()?;
        let mut resolver = AssociationResolver::new(self.provider, spec.table.clone());
        let mut planner = JoinPlanner::new(&spec.table);
        planner.add_spec(&spec, &mut resolver)?;
        Ok(planner.finish().entities)
    }

    /// Every key the query touches, resolved to a qualified column.
    pub fn all_columns(&self) -> QueryResult<Vec<ColumnRef>> {
        let spec = self.fill_spec()?;
        let mut resolver = AssociationResolver::new(self.provider, spec.table.clone());
        spec.all_keys()
            .iter()
            .map(|key| key_to_column(key, &mut resolver))
            .collect()
    }

    /// The base table name, via a fill-mode parse.
    pub fn table_name(&self) -> QueryResult<String> {
        Ok(self.fill_spec()?.table)
    }

    fn merged_spec(&self) -> QueryResult<ReportSpec> {
        let doc = self.document.resolve(&MergeResolver::new(&self.merge))?;
        ReportSpec::parse(&doc)
    }

    fn fill_spec(&self) -> QueryResult<ReportSpec> {
        let doc = self.document.resolve(&NilFillResolver)?;
        ReportSpec::parse(&doc)
    }

    fn build_plan(
        &self,
        spec: &ReportSpec,
        resolver: &mut AssociationResolver<'a, P>,
        select: Vec<ColumnRef>,
        distinct: bool,
        options: RunOptions,
    ) -> QueryResult<QueryPlan> {
        let mut planner = JoinPlanner::new(&spec.table);
        planner.add_spec(spec, resolver)?;
        let joins = planner.finish();

        let mut constraints = Vec::new();
        if let Some(filter) = compile_filter(&spec.filter, resolver)? {
            constraints.push(filter);
        }
        for entity in &joins.entities {
            for group in &self.scopes {
                for call in group {
                    let constraint = self
                        .provider
                        .scope_constraint(entity, call)
                        .ok_or_else(|| QueryError::UndefinedScope {
                            entity: entity.clone(),
                            name: call.name.clone(),
                        })?;
                    constraints.push(constraint);
                }
            }
        }
        let predicate = Predicate::and_all(constraints);

        let sort = compile_sort(spec, resolver)?;

        Ok(QueryPlan {
            base: spec.table.clone(),
            select,
            joins,
            predicate,
            sort,
            offset: options.offset,
            limit: options.limit,
            distinct,
        })
    }

    /// Cast raw backend values with each column's authoritative type.
    /// Columns the schema does not know pass through untouched.
    fn cast_rows(&self, select: &[ColumnRef], raw: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
        let types: Vec<_> = select
            .iter()
            .map(|column| self.provider.column_type(&column.table, &column.column))
            .collect();
        raw.into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&types)
                    .map(|(value, column_type)| match column_type {
                        Some(column_type) => column_type.cast(value),
                        None => value,
                    })
                    .collect()
            })
            .collect()
    }

    fn labels(&self, spec: &ReportSpec) -> Vec<(String, String)> {
        spec.fields
            .iter()
            .map(|(key, options)| {
                let label = options
                    .label
                    .clone()
                    .unwrap_or_else(|| default_label(key));
                (key.clone(), label)
            })
            .collect()
    }

    fn linked(
        &self,
        spec: &ReportSpec,
        resolver: &mut AssociationResolver<'a, P>,
    ) -> QueryResult<Vec<(String, String)>> {
        let mut linked = Vec::new();
        for (key, options) in &spec.fields {
            if !options.link {
                continue;
            }
            let chain = ReportSpec::association_chain(key)?;
            linked.push((key.clone(), resolver.target_entity(&chain)?));
        }
        Ok(linked)
    }
}

/// The selected field keys plus one synthetic id key per distinct
/// association chain, id keys after the fields, duplicates skipped.
fn data_keys(spec: &ReportSpec) -> Vec<String> {
    let mut keys: Vec<String> = spec.fields.iter().map(|(key, _)| key.clone()).collect();
    let mut prefixes: Vec<String> = Vec::new();
    for (key, _) in &spec.fields {
        let segments = ReportSpec::split_key(key);
        let prefix = segments[..segments.len().saturating_sub(1)].join(".");
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    for prefix in prefixes {
        let id_key = if prefix.is_empty() {
            "id".to_string()
        } else {
            format!("{}.id", prefix)
        };
        if !keys.contains(&id_key) {
            keys.push(id_key);
        }
    }
    keys
}

/// Default label: the last two key segments, polymorphic qualifiers
/// stripped, title-cased.
fn default_label(key: &str) -> String {
    let segments = ReportSpec::split_key(key);
    let start = segments.len().saturating_sub(2);
    segments[start..]
        .iter()
        .map(|segment| segment.split('|').next().unwrap_or(segment))
        .collect::<Vec<_>>()
        .join(" ")
        .to_title_case()
}

/// One executed report: rows keyed by `keys`, display labels for the
/// explicitly selected fields, and the linked key/entity pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub keys: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub labels: Vec<(String, String)>,
    pub linked: Vec<(String, String)>,
}

impl ResultSet {
    /// The value of `key` in row `row`, if both exist.
    pub fn value(&self, row: usize, key: &str) -> Option<&Value> {
        let index = self.keys.iter().position(|k| k == key)?;
        self.rows.get(row)?.get(index)
    }

    /// The display label of an explicitly selected key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, label)| label.as_str())
    }
}
