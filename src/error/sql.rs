use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum SqlError {
    #[error("no column map registered for type: {0}")]
    SchemaMapNotFound(String),

    #[error("no column mapping for field: {0}")]
    ColumnMappingNotFound(String),

    #[error("invalid sort order for SQL: {0}")]
    InvalidSortOrder(String),
}
