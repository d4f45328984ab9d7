//! Two-phase document validation.
//!
//! Phase 1 checks presence and shape of the top-level sections; phase 2
//! runs only when phase 1 finds nothing and checks schema-level facts
//! (rejected tables, declared data types). Association resolution failures
//! during phase 2 are errors, not findings.

use crate::error::QueryResult;
use crate::plan::JoinPlanner;
use crate::resolve::AssociationResolver;
use crate::schema::SchemaProvider;
use crate::spec::document::DocValue;
use crate::spec::{DataType, ReportSpec};

/// One named validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub name: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

/// Validate a fill-mode resolved document. Returns every finding; an empty
/// vector means the document is runnable.
pub fn validate<P: SchemaProvider>(
    doc: &DocValue,
    provider: &P,
    rejected_tables: &[String],
) -> QueryResult<Vec<ValidationError>> {
    let mut findings = Vec::new();

    let table = doc.get("table").and_then(DocValue::as_str);
    let fields = doc.get("fields").filter(|v| !matches!(v, DocValue::Null));
    let filter = doc.get("filter").filter(|v| !matches!(v, DocValue::Null));
    let sort = doc.get("sort").filter(|v| !matches!(v, DocValue::Null));

    if table.is_none() {
        findings.push(ValidationError::new("contains_table", "table must be defined"));
    }
    if fields.is_none() {
        findings.push(ValidationError::new(
            "contains_fields",
            "fields must be defined",
        ));
    }
    if filter.is_none() {
        findings.push(ValidationError::new(
            "contains_filter",
            "filter must be defined",
        ));
    }
    if sort.is_none() {
        findings.push(ValidationError::new("contains_sort", "sort must be defined"));
    }
    if !fields.is_some_and(DocValue::is_mapping) {
        findings.push(ValidationError::new("fields_is_hash", "fields must be a map"));
    }
    if !filter.is_some_and(DocValue::is_mapping) {
        findings.push(ValidationError::new(
            "filter_is_hash",
            "filters must be a map",
        ));
    }

    if !findings.is_empty() {
        return Ok(findings);
    }

    let spec = ReportSpec::parse(doc)?;
    let mut resolver = AssociationResolver::new(provider, spec.table.clone());
    let mut planner = JoinPlanner::new(&spec.table);
    planner.add_spec(&spec, &mut resolver)?;

    for entity in &planner.finish().entities {
        if rejected_tables.iter().any(|rejected| rejected == entity) {
            findings.push(ValidationError::new(
                "valid_table",
                format!("model {} is not allowed", entity),
            ));
        }
    }

    for (_, options) in &spec.fields {
        match &options.type_name {
            Some(type_name) => {
                if DataType::parse(type_name).is_none() {
                    findings.push(ValidationError::new(
                        "valid_data_type",
                        format!("data type {} is not implemented", type_name),
                    ));
                }
            }
            None => findings.push(ValidationError::new(
                "has_data_type",
                "fields must have data types",
            )),
        }
    }

    Ok(findings)
}
