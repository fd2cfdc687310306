pub mod parse;
pub mod source;
pub mod sql;

pub use parse::ParseError;
pub use source::SourceError;
pub use sql::SqlError;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    Parse(ParseError),
    Sql(SqlError),
    Source(SourceError),
    Configuration(String),
    Serialization(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "parse error: {}", e),
            Error::Sql(e) => write!(f, "SQL error: {}", e),
            Error::Source(e) => write!(f, "source error: {}", e),
            Error::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Error::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Sql(e) => Some(e),
            Error::Source(e) => Some(e),
            Error::Configuration(_) | Error::Serialization(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<SqlError> for Error {
    fn from(err: SqlError) -> Self {
        Error::Sql(err)
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
