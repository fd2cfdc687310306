//! End-to-end scenarios: parse -> compile -> evaluate, against both an
//! in-memory collection and a mock store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use dynamic_filter_sort::{
    ColumnMap, ComparisonKind, Config, DataSource, Engine, Error, ParseError, PlaceholderStyle,
    SourceError, SqlError, SqlFragment, TypeSchema, TypeTag,
};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Child {
    id: i64,
    par_id: i64,
    name: String,
    description: String,
    active: bool,
    created: String,
    attributes: BTreeMap<String, String>,
    fields: serde_json::Value,
}

fn engine(config: Config) -> Engine {
    let columns: ColumnMap = [
        ("id", "id"),
        ("parId", "par_id"),
        ("name", "name"),
        ("description", "description"),
        ("active", "active"),
        ("created", "created_dt"),
        ("attributes", "attributes"),
        ("fields", "fields"),
    ]
    .into_iter()
    .collect();

    Engine::builder()
        .config(config)
        .register(
            TypeSchema::new("Child")
                .field("id", TypeTag::Number)
                .field("parId", TypeTag::Number)
                .field("name", TypeTag::Text)
                .field("description", TypeTag::Text)
                .field("active", TypeTag::Boolean)
                .field("created", TypeTag::DateTime)
                .field("attributes", TypeTag::map(TypeTag::Text, TypeTag::Text))
                .field("fields", TypeTag::object("Fields")),
        )
        .register(TypeSchema::new("Fields").extension("data"))
        .columns("Child", columns)
        .build()
        .unwrap()
}

/// 20 children, two per parent, parents 1..=10.
fn children() -> Vec<Child> {
    (1..=20)
        .map(|id| {
            let mut attributes = BTreeMap::new();
            if id % 5 == 0 {
                attributes.insert("size".to_string(), "large".to_string());
            } else if id % 5 == 1 {
                attributes.insert("size".to_string(), "small".to_string());
            }
            let fields = match id % 4 {
                0 => json!({}),
                1 => json!({"color": "Red", "weight": id}),
                2 => json!({"color": "green", "weight": id}),
                _ => json!({"color": "red"}),
            };
            Child {
                id,
                par_id: (id + 1) / 2,
                name: format!("child {}", id),
                description: if id % 3 == 0 {
                    "a red thing".to_string()
                } else {
                    "a blue thing".to_string()
                },
                active: id % 2 == 0,
                created: format!("2019-{:02}-15T12:00:00Z", (id - 1) % 12 + 1),
                attributes,
                fields,
            }
        })
        .collect()
}

fn ids(items: &[Child]) -> Vec<i64> {
    items.iter().map(|c| c.id).collect()
}

fn select(filter: &str, sort: &str) -> Vec<i64> {
    let page = engine(Config::default())
        .paginate_slice(&children(), "Child", filter, sort, 0, 100)
        .unwrap();
    ids(&page.items)
}

#[test]
fn test_same_key_equality_is_ored() {
    let page = engine(Config::default())
        .paginate_slice(&children(), "Child", "parId=10,parId=1", "id=asc", 0, 100)
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(ids(&page.items), vec![1, 2, 19, 20]);
}

#[test]
fn test_equality_group_anded_with_ranges() {
    assert_eq!(select("id=2,id=5,id>1,id<=5", "id=asc"), vec![2, 5]);
    assert_eq!(select("id=2,id=5,id>2", "id=asc"), vec![5]);
}

#[test]
fn test_explicit_or() {
    assert_eq!(select("parId=1,||parId=2", "id=desc"), vec![4, 3, 2, 1]);
    assert_eq!(select("parId=1,||name=child 20", "id=asc"), vec![1, 2, 20]);
}

#[test]
fn test_comma_inside_value() {
    let engine = engine(Config::default());
    let filter = engine
        .parse_filter("description=a red thing, or not,parId=1", "Child")
        .unwrap();
    assert_eq!(filter.parameters.len(), 2);
    assert_eq!(filter.parameters[0].raw_value, "a red thing, or not");
}

#[test]
fn test_punctuation_inside_value() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("name=Hi!,id=5", "Child").unwrap();
    assert_eq!(filter.parameters.len(), 2);
    assert_eq!(filter.parameters[0].raw_value, "Hi!");
    assert_eq!(filter.parameters[1].raw_value, "5");

    assert!(matches!(
        engine.parse_filter("id=>5", "Child"),
        Err(Error::Parse(ParseError::InvalidOperator(_)))
    ));
}

#[test]
fn test_partial_matches() {
    assert_eq!(select("name=%hild 1%,parId<=5", "id=asc"), vec![1, 10]);
    assert_eq!(select("name=%9", "id=asc"), vec![9, 19]);
    assert_eq!(select("description!=%red%,parId=1", "id=asc"), vec![1, 2]);
}

#[test]
fn test_partial_datetime() {
    assert_eq!(select("created=2019-03%", "id=asc"), vec![3, 15]);
}

#[test]
fn test_dictionary_traversal() {
    assert_eq!(select("attributes.size=large", "id=asc"), vec![5, 10, 15, 20]);
    assert_eq!(select("attributes.size!=large", "id=asc"), vec![1, 6, 11, 16]);
    assert_eq!(
        select("attributes.size=small,parId<=3", "attributes.size=asc,id=desc"),
        vec![6, 1]
    );
}

#[test]
fn test_extension_traversal() {
    assert_eq!(select("fields.color=red", "id=asc"), vec![1, 3, 5, 7, 9, 11, 13, 15, 17, 19]);
    assert_eq!(select("fields.data.color=red,fields.weight>10", "id=asc"), vec![13, 17]);
}

#[test]
fn test_traversal_sort_puts_absent_first() {
    // Children 3 and 4 carry no weight.
    assert_eq!(select("parId<=2", "fields.weight=asc"), vec![3, 4, 1, 2]);
    assert_eq!(select("parId<=2", "fields.weight=desc"), vec![2, 1, 3, 4]);
}

#[test]
fn test_primary_sort_key_outranks_traversal_key() {
    assert_eq!(select("parId<=2", "fields.weight=asc,id=desc"), vec![4, 3, 2, 1]);
}

#[test]
fn test_sort_rejects_bad_direction() {
    let engine = engine(Config::default());
    assert!(matches!(
        engine.parse_sort("name=UP", "Child"),
        Err(Error::Parse(ParseError::InvalidSortOrder(_)))
    ));
    assert!(matches!(
        engine.parse_sort("name>asc", "Child"),
        Err(Error::Parse(ParseError::InvalidOperator(_)))
    ));
}

#[test]
fn test_partial_kinds() {
    let engine = engine(Config::default());
    let kinds: Vec<ComparisonKind> = ["name=child%", "name=%child", "name=%child%", "name=child"]
        .iter()
        .map(|input| engine.parse_filter(input, "Child").unwrap().parameters[0].comparison)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ComparisonKind::StartsWith,
            ComparisonKind::EndsWith,
            ComparisonKind::Contains,
            ComparisonKind::Full,
        ]
    );

    for input in ["name>child%", "name<=%child", "name<%child%"] {
        assert!(matches!(
            engine.parse_filter(input, "Child"),
            Err(Error::Parse(ParseError::InvalidFilterType { .. }))
        ));
    }
}

#[test]
fn test_relational_partial_match() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("description=%red%", "Child").unwrap();
    let sort = engine.parse_sort("", "Child").unwrap();

    let literal = engine.compile_relational(&filter, &sort, None, false).unwrap();
    assert_eq!(literal.where_clause, "LOWER(description::text) ILIKE '%red%'");
    assert!(literal.params.is_empty());

    let bound = engine.compile_relational(&filter, &sort, None, true).unwrap();
    assert_eq!(
        bound.where_clause,
        "LOWER(description::text) ILIKE CONCAT('%',@p0,'%')"
    );
    assert_eq!(bound.param_values(), vec![&json!("red")]);
}

#[test]
fn test_relational_json_traversal() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("fields.color=red", "Child").unwrap();
    let sort = engine.parse_sort("", "Child").unwrap();

    let fragment = engine.compile_relational(&filter, &sort, None, false).unwrap();
    assert_eq!(fragment.where_clause, "(lower(fields::text)::jsonb->>'color')='red'");
}

#[test]
fn test_relational_traversal_bindings() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("fields.size>5,fields.size=7", "Child").unwrap();
    let sort = engine.parse_sort("", "Child").unwrap();

    let fragment = engine.compile_relational(&filter, &sort, None, true).unwrap();
    assert_eq!(
        fragment.where_clause,
        "(((lower(fields::text)::jsonb->>'size')=@p1) AND ((lower(fields::text)::jsonb->>'size')::numeric>@p0))"
    );
    assert_eq!(fragment.param_values(), vec![&json!(5.0), &json!("7")]);

    let filter = engine.parse_filter("attributes.size=Large", "Child").unwrap();
    let fragment = engine.compile_relational(&filter, &sort, None, true).unwrap();
    assert_eq!(fragment.where_clause, "(lower(attributes::text)::jsonb->>'size')=@p0");
    assert_eq!(fragment.param_values(), vec![&json!("large")]);
}

#[test]
fn test_relational_grouping() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("id=2,id=5,id>1,id<=5", "Child").unwrap();
    let sort = engine.parse_sort("parId=desc,id=asc", "Child").unwrap();

    let fragment = engine.compile_relational(&filter, &sort, Some("c"), false).unwrap();
    assert_eq!(
        fragment.where_clause,
        "((c.id<=5) AND (c.id=2 OR c.id=5) AND (c.id>1))"
    );
    assert_eq!(fragment.order_by, "c.par_id DESC, c.id ASC");
    assert_eq!(
        fragment.with_limit_offset(10, 20),
        " WHERE ((c.id<=5) AND (c.id=2 OR c.id=5) AND (c.id>1)) ORDER BY c.par_id DESC, c.id ASC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_relational_positional() {
    let engine = engine(Config::default().with_placeholder(PlaceholderStyle::Positional));
    let filter = engine.parse_filter("name=x,parId=3", "Child").unwrap();
    let sort = engine.parse_sort("", "Child").unwrap();

    let fragment = engine.compile_relational(&filter, &sort, None, true).unwrap();
    assert_eq!(fragment.where_clause, "LOWER(name)=$1 AND par_id=$2");
    assert_eq!(fragment.param_values(), vec![&json!("x"), &json!(3.0)]);
}

#[test]
fn test_relational_rejects_sort_synonyms() {
    let engine = engine(Config::default());
    let filter = engine.parse_filter("", "Child").unwrap();
    let sort = engine.parse_sort("name=descending", "Child").unwrap();

    assert!(matches!(
        engine.compile_relational(&filter, &sort, None, false),
        Err(Error::Sql(SqlError::InvalidSortOrder(_)))
    ));

    // The in-memory comparator accepts them.
    let page = engine
        .paginate_slice(&children(), "Child", "parId=1", "name=descending", 0, 10)
        .unwrap();
    assert_eq!(ids(&page.items), vec![2, 1]);
}

/// Answers fetches with canned rows, or rejects them.
struct MockStore {
    answer: Result<Vec<Child>, SourceError>,
    fragments: Mutex<Vec<SqlFragment>>,
}

impl MockStore {
    fn answering(rows: Vec<Child>) -> Self {
        Self {
            answer: Ok(rows),
            fragments: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: SourceError) -> Self {
        Self {
            answer: Err(err),
            fragments: Mutex::new(Vec::new()),
        }
    }
}

impl DataSource for MockStore {
    type Item = Child;

    fn fetch(&self, fragment: &SqlFragment) -> Result<Vec<Child>, SourceError> {
        self.fragments.lock().unwrap().push(fragment.clone());
        let rows = self.answer.clone()?;
        Ok(rows
            .into_iter()
            .skip(fragment.offset.unwrap_or(0))
            .take(fragment.limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn count(&self, _fragment: &SqlFragment) -> Result<usize, SourceError> {
        self.answer.as_ref().map(Vec::len).map_err(|err| err.clone())
    }

    fn load_all(&self) -> Result<Vec<Child>, SourceError> {
        Ok(children())
    }
}

#[test]
fn test_paginate_store_path() {
    let engine = engine(Config::default());
    // What a store would answer for `parId<=3 ORDER BY id DESC`.
    let answer: Vec<Child> = children().into_iter().filter(|c| c.par_id <= 3).rev().collect();
    let store = MockStore::answering(answer);

    let page = engine
        .paginate(&store, "Child", "parId<=3,fields.color=red", "id=desc", 0, 2)
        .unwrap();

    assert_eq!(ids(&page.items), vec![5, 3]);
    assert_eq!(page.total, 3);
    assert_eq!(page.next_offset, Some(2));

    let fragments = store.fragments.lock().unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].where_clause, "par_id<=@p0");
    assert_eq!(fragments[0].order_by, "id DESC");
    assert_eq!(engine.fallback_count(), 0);
}

#[test]
fn test_paginate_pushes_page_to_store() {
    let engine = engine(Config::default());
    let answer: Vec<Child> = children().into_iter().filter(|c| c.par_id <= 3).rev().collect();
    let store = MockStore::answering(answer);

    let page = engine
        .paginate(&store, "Child", "parId<=3", "id=desc", 1, 2)
        .unwrap();

    assert_eq!(ids(&page.items), vec![5, 4]);
    assert_eq!(page.total, 6);
    assert_eq!(page.next_offset, Some(3));

    let fragments = store.fragments.lock().unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].limit, Some(2));
    assert_eq!(fragments[0].offset, Some(1));
    assert_eq!(
        fragments[0].to_sql(),
        " WHERE par_id<=@p0 ORDER BY id DESC LIMIT 2 OFFSET 1"
    );
}

#[test]
fn test_paginate_fallback() {
    let engine = engine(Config::default().with_local_fallback(true));
    let store = MockStore::failing(SourceError::Rejected("cannot translate".to_string()));

    let page = engine
        .paginate(&store, "Child", "parId=10,parId=1", "id=asc", 1, 2)
        .unwrap();

    assert_eq!(ids(&page.items), vec![2, 19]);
    assert_eq!(page.total, 4);
    assert_eq!(engine.fallback_count(), 1);
}

#[test]
fn test_paginate_without_fallback() {
    let engine = engine(Config::default());
    let store = MockStore::failing(SourceError::Rejected("cannot translate".to_string()));

    let result = engine.paginate(&store, "Child", "parId=1", "", 0, 10);
    assert!(matches!(result, Err(Error::Source(SourceError::Rejected(_)))));
    assert_eq!(engine.fallback_count(), 0);
}

#[test]
fn test_parallel_engine_agrees() {
    let sequential = engine(Config::default().with_scan_parallelism(1));
    let parallel = engine(
        Config::default()
            .with_scan_parallelism(4)
            .with_parallel_threshold(1),
    );

    let items: Vec<Child> = (0..50).flat_map(|_| children()).collect();
    let a = sequential
        .paginate_slice(&items, "Child", "attributes.size=large", "id=asc", 0, 1000)
        .unwrap();
    let b = parallel
        .paginate_slice(&items, "Child", "attributes.size=large", "id=asc", 0, 1000)
        .unwrap();

    assert_eq!(a.total, 200);
    assert_eq!(a, b);
}
