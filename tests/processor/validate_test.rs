//! Document validation through the processor.

use serde_json::json;
use tabula::prelude::*;

#[path = "../common/mod.rs"]
mod common;

fn validate(json: serde_json::Value, rejected: Vec<String>) -> Vec<ValidationError> {
    let provider = common::catalog();
    Processor::new(&provider, common::doc(json), rejected)
        .validate()
        .unwrap()
}

#[test]
fn requires_a_table() {
    let findings = validate(
        json!({
            "fields": {"title": {"type": "string"}},
            "filter": {},
            "sort": []
        }),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "contains_table");
    assert_eq!(findings[0].message, "table must be defined");
}

#[test]
fn requires_fields() {
    let findings = validate(
        json!({"table": "albums", "filter": {}, "sort": []}),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "contains_fields");
}

#[test]
fn requires_a_filter() {
    let findings = validate(
        json!({
            "table": "albums",
            "fields": {"title": {"type": "string"}},
            "sort": []
        }),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "contains_filter");
}

#[test]
fn requires_a_sort() {
    let findings = validate(
        json!({
            "table": "albums",
            "fields": {"title": {"type": "string"}},
            "filter": {}
        }),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "contains_sort");
}

#[test]
fn requires_data_types_on_every_field() {
    let findings = validate(
        json!({
            "table": "albums",
            "fields": {
                "id": {"type": "integer"},
                "title": null
            },
            "filter": {},
            "sort": []
        }),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "has_data_type");
    assert_eq!(findings[0].message, "fields must have data types");
}

#[test]
fn rejects_unknown_data_types() {
    let findings = validate(
        json!({
            "table": "albums",
            "fields": {"title": {"type": "blob"}},
            "filter": {},
            "sort": []
        }),
        Vec::new(),
    );
    assert_eq!(findings[0].name, "valid_data_type");
    assert_eq!(findings[0].message, "data type blob is not implemented");
}

#[test]
fn rejects_forbidden_base_tables() {
    let findings = validate(
        json!({
            "table": "companies",
            "fields": {"id": {"type": "integer"}},
            "filter": {},
            "sort": []
        }),
        vec!["companies".to_string()],
    );
    assert_eq!(findings[0].name, "valid_table");
}

#[test]
fn rejects_forbidden_associated_tables() {
    let findings = validate(
        json!({
            "table": "members",
            "fields": {
                "id": {"type": "integer"},
                "security_group.name": {"type": "string"}
            },
            "filter": {},
            "sort": []
        }),
        vec!["security_groups".to_string()],
    );
    assert_eq!(findings[0].message, "model security_groups is not allowed");
}

#[test]
fn a_complete_document_is_clean() {
    let findings = validate(
        json!({
            "table": "tracks",
            "fields": {"title": {"type": "string"}},
            "filter": {"title": {"exactly": "X"}},
            "sort": [{"title": "asc"}]
        }),
        Vec::new(),
    );
    assert!(findings.is_empty());
}
