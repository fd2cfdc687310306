//! Schemas and records shared by unit tests.

use serde::Serialize;
use serde_json::json;

use crate::ast::{TypeSchema, TypeTag};
use crate::schema_cache::{ColumnMap, SchemaCache};
use crate::{Config, Engine};

pub const DELIMITERS: [&str; 3] = ["->>", "->", "."];

pub fn person_schema() -> TypeSchema {
    TypeSchema::new("Person")
        .field("id", TypeTag::Number)
        .field("firstName", TypeTag::Text)
        .field("lastName", TypeTag::Text)
        .field("age", TypeTag::optional(TypeTag::Number))
        .field("active", TypeTag::Boolean)
        .field("birthday", TypeTag::optional(TypeTag::DateTime))
        .field("mood", TypeTag::enumeration(["Happy", "Grumpy"]))
        .field("externalId", TypeTag::Uuid)
        .field("tags", TypeTag::list(TypeTag::Text))
        .field("owner", TypeTag::optional(TypeTag::object("Person")))
        .field("groups", TypeTag::map(TypeTag::Number, TypeTag::object("Group")))
        .field("settings", TypeTag::Document)
        .field("fields", TypeTag::object("Fields"))
}

pub fn group_schema() -> TypeSchema {
    TypeSchema::new("Group")
        .field("name", TypeTag::Text)
        .field("role", TypeTag::Text)
}

pub fn fields_schema() -> TypeSchema {
    TypeSchema::new("Fields").extension("data")
}

/// Record shape used by the relational compiler tests.
pub fn parent_schema() -> TypeSchema {
    TypeSchema::new("Parent")
        .field("id", TypeTag::Number)
        .field("alphaId", TypeTag::Number)
        .field("name", TypeTag::Text)
        .field("description", TypeTag::Text)
        .field("active", TypeTag::Boolean)
        .field("created", TypeTag::DateTime)
        .field("modified", TypeTag::DateTime)
        .field("guid1", TypeTag::Uuid)
        .field("guid2", TypeTag::optional(TypeTag::Uuid))
        .field("fields", TypeTag::object("Fields"))
}

pub fn parent_columns() -> ColumnMap {
    [
        ("id", "id"),
        ("alphaId", "alpha_id"),
        ("name", "name"),
        ("description", "description"),
        ("active", "active"),
        ("created", "created_dt"),
        ("modified", "modified_dt"),
        ("guid1", "guid1"),
        ("guid2", "guid2"),
        ("fields", "fields"),
    ]
    .into_iter()
    .collect()
}

pub fn fixture_cache() -> SchemaCache {
    let mut cache = SchemaCache::new();
    for schema in [person_schema(), group_schema(), fields_schema(), parent_schema()] {
        cache.register(schema).unwrap();
    }
    cache.register_columns("Parent", parent_columns()).unwrap();
    cache
}

pub fn fixture_engine(config: Config) -> Engine {
    Engine::builder()
        .config(config)
        .register(person_schema())
        .register(group_schema())
        .register(fields_schema())
        .register(parent_schema())
        .columns("Parent", parent_columns())
        .build()
        .unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub active: bool,
    pub birthday: Option<String>,
    pub mood: String,
    pub external_id: String,
    pub tags: Vec<String>,
    pub groups: serde_json::Value,
    pub settings: serde_json::Value,
    pub fields: serde_json::Value,
}

/// Five people: ids 1..=5. Odd ids belong to group 42, even ids to group 7.
pub fn people() -> Vec<Person> {
    let rows = [
        (1, "Ann", "Smith", Some(30), true, Some("1990-03-04T10:30:00Z"), "Happy", "red"),
        (2, "Bob", "Jones", Some(41), false, Some("1983-12-01T08:00:00Z"), "Grumpy", "blue"),
        (3, "Cid", "Smithers", None, true, None, "Happy", "Red"),
        (4, "Dee", "Jonas", Some(30), true, Some("1990-07-15T23:59:59Z"), "Grumpy", ""),
        (5, "Eve", "Black", Some(25), false, Some("2018-01-01T00:00:00Z"), "Happy", "green"),
    ];

    rows.iter()
        .map(|(id, first, last, age, active, birthday, mood, color)| {
            let group = if id % 2 == 1 {
                json!({"42": {"name": "Admins", "role": "owner"}})
            } else {
                json!({"7": {"name": "Users", "role": "member"}})
            };
            let fields = if color.is_empty() {
                json!({})
            } else {
                json!({"color": color, "rank": 10 - id})
            };
            Person {
                id: *id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                age: *age,
                active: *active,
                birthday: birthday.map(str::to_string),
                mood: mood.to_string(),
                external_id: format!("00000000-0000-0000-0000-00000000000{}", id),
                tags: if id % 2 == 0 { vec!["even".to_string()] } else { vec!["odd".to_string(), "prime".to_string()] },
                groups: group,
                settings: json!({"theme": if *active { "dark" } else { "light" }}),
                fields,
            }
        })
        .collect()
}
