//! # Dynamic Filter & Sort
//!
//! Compiles compact, delimited filter and sort strings into either an
//! in-memory predicate and comparator or a PostgreSQL fragment with bound
//! parameters, checked against registered type schemas.
//!
//! ## Features
//!
//! - **Filter terms**: `key=value` with `=`, `!=`, `>`, `>=`, `<`, `<=`
//! - **Combinators**: `&&` (AND) and `||` (OR) markers; unmarked terms on the
//!   same key are OR-grouped
//! - **Partial matches**: `smith%`, `%smith`, `%smith%`, including partial
//!   date-time values such as `1990-03%`
//! - **Nested keys**: `owner.lastName`, `groups->42->>role`
//! - **Traversal keys**: map entries and blob keys run in process, everything
//!   else is pushed to the store
//! - **Pagination**: push-down with optional local fallback
//!
//! ## Quick Start
//!
//! ```rust
//! use dynamic_filter_sort::{ColumnMap, Engine, TypeSchema, TypeTag};
//!
//! let engine = Engine::builder()
//!     .register(
//!         TypeSchema::new("Person")
//!             .field("id", TypeTag::Number)
//!             .field("lastName", TypeTag::Text),
//!     )
//!     .columns(
//!         "Person",
//!         [("id", "id"), ("lastName", "last_name")].into_iter().collect::<ColumnMap>(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let filter = engine.parse_filter("lastName=smith%,id>3", "Person").unwrap();
//! let sort = engine.parse_sort("id=desc", "Person").unwrap();
//!
//! let fragment = engine.compile_relational(&filter, &sort, None, false).unwrap();
//! assert_eq!(fragment.where_clause, "id>3 AND LOWER(last_name::text) ILIKE 'smith%'");
//! assert_eq!(fragment.order_by, "id DESC");
//! ```
//!
//! ## In-memory evaluation
//!
//! ```rust
//! use dynamic_filter_sort::{Engine, TypeSchema, TypeTag};
//! use serde::Serialize;
//!
//! #[derive(Serialize, Clone)]
//! struct Person {
//!     id: i64,
//!     name: String,
//! }
//!
//! let engine = Engine::builder()
//!     .register(
//!         TypeSchema::new("Person")
//!             .field("id", TypeTag::Number)
//!             .field("name", TypeTag::Text),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let people = vec![
//!     Person { id: 1, name: "Ann".into() },
//!     Person { id: 2, name: "Bob".into() },
//!     Person { id: 3, name: "Anna".into() },
//! ];
//!
//! let page = engine
//!     .paginate_slice(&people, "Person", "name=an%", "id=desc", 0, 10)
//!     .unwrap();
//! assert_eq!(page.total, 2);
//! assert_eq!(page.items[0].id, 3);
//! ```

pub mod ast;
pub mod coerce;
pub mod config;
pub mod datetime;
pub mod engine;
pub mod error;
pub mod memory;
pub mod paginate;
pub mod parser;
pub mod schema_cache;
pub mod sql;

#[cfg(test)]
mod test_support;

pub use ast::{
    ComparisonKind, FieldSchema, FilterExpression, LogicCondition, LogicOperator, LogicTree,
    Operator, SortDirection, SortExpression, TypeSchema, TypeTag, Value,
};
pub use config::{Config, PlaceholderStyle};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, ParseError, SourceError, SqlError};
pub use memory::{Comparator, InMemoryQuery, Predicate, Scanner};
pub use paginate::{DataSource, Page};
pub use schema_cache::{ColumnMap, SchemaCache};
pub use sql::{BoundParam, QueryBuilder, RenderMode, SqlFragment};
