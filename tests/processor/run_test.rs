//! End-to-end runs: association selection, labels, casting, linking,
//! merge, pagination, and error surfaces.

use serde_json::json;
use tabula::prelude::*;

#[path = "../common/mod.rs"]
mod common;

#[test]
fn selects_across_nested_associations_with_identical_column_names() {
    let provider = common::catalog();
    let result = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {
                "album.performer.title": {"type": "string"},
                "album.title": {"type": "string"},
                "title": {"type": "string"}
            },
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(
        result.value(0, "title"),
        Some(&Value::Str("Opening".into()))
    );
    assert_eq!(
        result.value(0, "album.title"),
        Some(&Value::Str("First Light".into()))
    );
    assert_eq!(
        result.value(0, "album.performer.title"),
        Some(&Value::Str("The Best Band".into()))
    );
}

#[test]
fn labels_fields_automatically() {
    let provider = common::catalog();
    let result = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {
                "title": {"type": "string"},
                "album.performer.title": {"type": "string"},
                "album.title": {"type": "string"}
            },
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(result.label("title"), Some("Title"));
    assert_eq!(result.label("album.title"), Some("Album Title"));
    assert_eq!(result.label("album.performer.title"), Some("Performer Title"));
}

#[test]
fn declared_labels_win_over_derived_ones() {
    let provider = common::catalog();
    let result = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"title": {"type": "string", "label": "Name"}},
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(result.label("title"), Some("Name"));
}

#[test]
fn casts_raw_backend_values_with_the_schema_type() {
    // A backend that hands dates and datetimes back as strings.
    let mut provider = MemoryProvider::new();
    provider.add_table(
        TableDef::new("performances")
            .column("id", ColumnType::Integer)
            .column("held_on", ColumnType::Date)
            .column("start_time", ColumnType::DateTime)
            .row(vec![
                Value::Int(1),
                Value::Str("2016-03-01".into()),
                Value::Str("2016-03-01T10:30:00+00:00".into()),
            ]),
    );

    let result = common::processor(
        &provider,
        json!({
            "table": "performances",
            "fields": {
                "held_on": {"type": "date"},
                "start_time": {"type": "datetime"}
            },
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(
        result.value(0, "held_on"),
        Some(&Value::Date(common::date(2016, 3, 1)))
    );
    assert_eq!(
        result.value(0, "start_time"),
        Some(&Value::DateTime(common::datetime(2016, 3, 1, 10, 30)))
    );
}

#[test]
fn always_selects_ids_without_labeling_them() {
    let provider = common::catalog();
    let result = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {
                "album.title": {"type": "string"},
                "title": {"type": "string"}
            },
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(result.value(0, "id"), Some(&Value::Int(1)));
    assert_eq!(result.value(0, "album.id"), Some(&Value::Int(1)));
    assert_eq!(result.keys.len(), 4);
    assert_eq!(result.labels.len(), 2);
}

#[test]
fn linked_fields_name_their_entity() {
    let provider = common::catalog();
    let result = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"album.title": {"type": "string", "link": true}},
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap();

    assert_eq!(
        result.linked,
        vec![("album.title".to_string(), "albums".to_string())]
    );
    assert_eq!(result.value(0, "album.id"), Some(&Value::Int(1)));
}

#[test]
fn merge_fills_placeholders_at_run_time() {
    let provider = common::catalog();
    let document = DocValue::Mapping(vec![
        ("table".into(), DocValue::String("tracks".into())),
        (
            "fields".into(),
            DocValue::Mapping(vec![(
                "album.title".into(),
                DocValue::Mapping(vec![("type".into(), DocValue::String("string".into()))]),
            )]),
        ),
        (
            "filter".into(),
            DocValue::Mapping(vec![(
                "album.title".into(),
                DocValue::Mapping(vec![("exactly".into(), DocValue::Placeholder("title".into()))]),
            )]),
        ),
        ("sort".into(), DocValue::Sequence(vec![])),
    ]);

    let mut processor = Processor::new(&provider, document, Vec::new());

    // Structure can be validated before the merge values exist.
    assert!(processor.validate().unwrap().is_empty());

    processor
        .merge
        .insert("title".into(), DocValue::String("Second Wind".into()));
    let result = processor.run(RunOptions::default()).unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(
        result.value(0, "album.title"),
        Some(&Value::Str("Second Wind".into()))
    );
}

#[test]
fn unset_merge_keys_fail_the_run() {
    let provider = common::catalog();
    let document = DocValue::Mapping(vec![
        ("table".into(), DocValue::String("tracks".into())),
        (
            "fields".into(),
            DocValue::Mapping(vec![(
                "title".into(),
                DocValue::Mapping(vec![("type".into(), DocValue::String("string".into()))]),
            )]),
        ),
        (
            "filter".into(),
            DocValue::Mapping(vec![(
                "title".into(),
                DocValue::Mapping(vec![("exactly".into(), DocValue::Placeholder("title".into()))]),
            )]),
        ),
        ("sort".into(), DocValue::Sequence(vec![])),
    ]);

    let processor = Processor::new(&provider, document, Vec::new());
    let err = processor.run(RunOptions::default()).unwrap_err();
    assert_eq!(err, QueryError::UnknownMergeKey("title".to_string()));
}

#[test]
fn limits_and_offsets_window_the_results() {
    let provider = common::catalog();
    let query = json!({
        "table": "tracks",
        "fields": {
            "title": {"type": "string"},
            "id": {"type": "integer"}
        },
        "filter": {},
        "sort": []
    });

    let limited = common::processor(&provider, query.clone())
        .run(RunOptions {
            limit: Some(1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(limited.rows.len(), 1);

    let offset = common::processor(&provider, query.clone())
        .run(RunOptions {
            offset: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(offset.rows.len(), 1);
    assert_eq!(
        offset.value(0, "title"),
        Some(&Value::Str("Quiet Song".into()))
    );

    let windowed = common::processor(&provider, query)
        .run(RunOptions {
            offset: Some(1),
            limit: Some(2),
        })
        .unwrap();
    assert_eq!(windowed.rows.len(), 2);
    assert_eq!(
        windowed.value(0, "title"),
        Some(&Value::Str("Za Finale".into()))
    );
    assert_eq!(windowed.value(1, "id"), Some(&Value::Int(3)));
}

#[test]
fn bad_associations_fail_with_the_entity_and_name() {
    let provider = common::catalog();
    let err = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"albuma.title": {"type": "string"}},
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap_err();

    assert_eq!(
        err,
        QueryError::UnknownAssociation {
            entity: "tracks".to_string(),
            name: "albuma".to_string(),
        }
    );
}

#[test]
fn invalid_documents_do_not_run() {
    let provider = common::catalog();
    let err = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"title": null},
            "filter": {},
            "sort": []
        }),
    )
    .run(RunOptions::default())
    .unwrap_err();

    assert_eq!(
        err,
        QueryError::InvalidSpecification("fields must have data types".to_string())
    );
}

#[test]
fn count_returns_the_matching_row_count() {
    let provider = common::catalog();
    let processor = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"id": {"type": "integer"}},
            "filter": {},
            "sort": []
        }),
    );

    assert_eq!(processor.count(RunOptions::default()).unwrap(), 3);
}

#[test]
fn count_skips_validation() {
    let provider = common::catalog();
    // No data types declared; run would refuse this document.
    let processor = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"id": null},
            "filter": {},
            "sort": []
        }),
    );

    assert_eq!(processor.count(RunOptions::default()).unwrap(), 3);
}
