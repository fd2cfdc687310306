pub mod builder;

pub use builder::{BoundParam, QueryBuilder, RenderMode, SqlFragment};
