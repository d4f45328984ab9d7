//! Fill-mode introspection: what a document touches, before any merge
//! values exist.

use serde_json::json;
use tabula::prelude::*;

#[path = "../common/mod.rs"]
mod common;

#[test]
fn all_models_lists_every_touched_entity() {
    let provider = common::catalog();
    let processor = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {"id": {"type": "integer"}},
            "sort": [{"album.owner|records.name": "asc"}],
            "filter": {"album.performer.name": {"exactly": "Some guy"}}
        }),
    );

    let models = processor.all_models().unwrap();
    assert_eq!(models[0], "tracks");
    assert!(models.contains(&"albums".to_string()));
    assert!(models.contains(&"performers".to_string()));
    assert!(models.contains(&"records".to_string()));
}

#[test]
fn all_columns_resolves_every_key() {
    let provider = common::catalog();
    let processor = common::processor(
        &provider,
        json!({
            "table": "tracks",
            "fields": {
                "album.title": null,
                "album.released_on": null
            },
            "sort": [{"album.owner|records.name": "asc"}],
            "filter": {}
        }),
    );

    let columns = processor.all_columns().unwrap();
    assert!(columns.contains(&ColumnRef::new("albums", "title")));
    assert!(columns.contains(&ColumnRef::new("albums", "released_on")));
    assert!(columns.contains(&ColumnRef::new("records", "name")));
}

#[test]
fn table_name_reads_the_base_table() {
    let provider = common::catalog();
    let processor = common::processor(
        &provider,
        json!({
            "table": "albums",
            "fields": {"id": {"type": "integer"}},
            "filter": {},
            "sort": []
        }),
    );

    assert_eq!(processor.table_name().unwrap(), "albums");
}

#[test]
fn introspection_works_with_unresolved_placeholders() {
    let provider = common::catalog();
    let document = DocValue::Mapping(vec![
        ("table".into(), DocValue::String("tracks".into())),
        (
            "fields".into(),
            DocValue::Mapping(vec![("album.title".into(), DocValue::Null)]),
        ),
        (
            "filter".into(),
            DocValue::Mapping(vec![(
                "title".into(),
                DocValue::Mapping(vec![("exactly".into(), DocValue::Placeholder("t".into()))]),
            )]),
        ),
        ("sort".into(), DocValue::Sequence(vec![])),
    ]);
    let processor = Processor::new(&provider, document, Vec::new());

    let models = processor.all_models().unwrap();
    assert_eq!(models, vec!["tracks".to_string(), "albums".to_string()]);
}
