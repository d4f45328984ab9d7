//! Shared music-catalog fixture for the integration suites.
//!
//! The schema mirrors a small label catalog: tracks belong to albums,
//! albums belong to performers and polymorphically to an owner (a record
//! label or a company), performances belong to performers. Members and
//! security groups exist to exercise table rejection.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use tabula::prelude::*;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

fn published_scope(table: &'static str) -> impl Fn(&[Value]) -> Predicate {
    move |_args| Predicate::Compare {
        column: ColumnRef::new(table, "published"),
        op: CompareOp::Eq,
        value: Value::Bool(true),
    }
}

fn is_published_scope(table: &'static str) -> impl Fn(&[Value]) -> Predicate {
    move |args| Predicate::Compare {
        column: ColumnRef::new(table, "published"),
        op: CompareOp::Eq,
        value: args.first().cloned().unwrap_or(Value::Bool(true)),
    }
}

/// The standard seeded catalog.
///
/// Tracks: 1 "Opening" (album 1, #1, published), 2 "Za Finale" (album 1,
/// #2, published), 3 "Quiet Song" (album 2, #1, unpublished).
/// Albums: 1 "First Light" (performer 1, owned by record label 1,
/// published), 2 "Second Wind" (performer 1, owned by company 1,
/// unpublished).
pub fn catalog() -> MemoryProvider {
    let mut provider = MemoryProvider::new();

    provider.add_table(
        TableDef::new("performers")
            .column("id", ColumnType::Integer)
            .column("title", ColumnType::String)
            .column("name", ColumnType::String)
            .row(vec![
                Value::Int(1),
                Value::Str("The Best Band".into()),
                Value::Str("Alice".into()),
            ]),
    );

    provider.add_table(
        TableDef::new("records")
            .column("id", ColumnType::Integer)
            .column("name", ColumnType::String)
            .row(vec![Value::Int(1), Value::Str("Sea Records".into())])
            .row(vec![Value::Int(2), Value::Str("Moon Records".into())]),
    );

    provider.add_table(
        TableDef::new("companies")
            .column("id", ColumnType::Integer)
            .column("name", ColumnType::String)
            .row(vec![Value::Int(1), Value::Str("Globex".into())]),
    );

    provider.add_table(
        TableDef::new("albums")
            .column("id", ColumnType::Integer)
            .column("title", ColumnType::String)
            .column("performer_id", ColumnType::Integer)
            .column("owner_id", ColumnType::Integer)
            .column("owner_type", ColumnType::String)
            .column("released_on", ColumnType::Date)
            .column("published", ColumnType::Boolean)
            .belongs_to("performer", "performers", "performer_id")
            .belongs_to_polymorphic("owner", "owner_id", "owner_type")
            .scope("published", published_scope("albums"))
            .scope("is_published", is_published_scope("albums"))
            .row(vec![
                Value::Int(1),
                Value::Str("First Light".into()),
                Value::Int(1),
                Value::Int(1),
                Value::Str("records".into()),
                Value::Date(date(2015, 6, 1)),
                Value::Bool(true),
            ])
            .row(vec![
                Value::Int(2),
                Value::Str("Second Wind".into()),
                Value::Int(1),
                Value::Int(1),
                Value::Str("companies".into()),
                Value::Date(date(2016, 3, 1)),
                Value::Bool(false),
            ]),
    );

    provider.add_table(
        TableDef::new("tracks")
            .column("id", ColumnType::Integer)
            .column("album_id", ColumnType::Integer)
            .column("track_number", ColumnType::Integer)
            .column("title", ColumnType::String)
            .column("published", ColumnType::Boolean)
            .belongs_to("album", "albums", "album_id")
            .scope("published", published_scope("tracks"))
            .scope("is_published", is_published_scope("tracks"))
            .scope("best_title", |_args| Predicate::Compare {
                column: ColumnRef::new("tracks", "title"),
                op: CompareOp::Eq,
                value: Value::Str("Best Title".into()),
            })
            .row(vec![
                Value::Int(1),
                Value::Int(1),
                Value::Int(1),
                Value::Str("Opening".into()),
                Value::Bool(true),
            ])
            .row(vec![
                Value::Int(2),
                Value::Int(1),
                Value::Int(2),
                Value::Str("Za Finale".into()),
                Value::Bool(true),
            ])
            .row(vec![
                Value::Int(3),
                Value::Int(2),
                Value::Int(1),
                Value::Str("Quiet Song".into()),
                Value::Bool(false),
            ]),
    );

    provider.add_table(
        TableDef::new("performances")
            .column("id", ColumnType::Integer)
            .column("performer_id", ColumnType::Integer)
            .column("start_time", ColumnType::DateTime)
            .belongs_to("performer", "performers", "performer_id")
            .row(vec![
                Value::Int(1),
                Value::Int(1),
                Value::DateTime(datetime(2016, 3, 1, 10, 0)),
            ])
            .row(vec![
                Value::Int(2),
                Value::Int(1),
                Value::DateTime(datetime(2016, 3, 5, 22, 30)),
            ]),
    );

    provider.add_table(
        TableDef::new("security_groups")
            .column("id", ColumnType::Integer)
            .column("name", ColumnType::String),
    );

    provider.add_table(
        TableDef::new("members")
            .column("id", ColumnType::Integer)
            .column("security_group_id", ColumnType::Integer)
            .belongs_to("security_group", "security_groups", "security_group_id"),
    );

    provider
}

pub fn doc(json: serde_json::Value) -> DocValue {
    DocValue::from_json(json)
}

pub fn processor<'a>(
    provider: &'a MemoryProvider,
    json: serde_json::Value,
) -> Processor<'a, MemoryProvider> {
    Processor::new(provider, doc(json), Vec::new())
}
