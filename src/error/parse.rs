use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ParseError {
    #[error("malformed parameter list: {0}")]
    MalformedParameterList(String),

    #[error("missing key, operator or value in '{0}'")]
    MissingValue(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),

    #[error("invalid property name '{path}': {reason}")]
    InvalidPropertyName { path: String, reason: String },

    #[error("invalid filter type for '{field}': {reason}")]
    InvalidFilterType { field: String, reason: String },

    #[error("invalid date time format: {0}")]
    InvalidDateTimeFormat(String),

    #[error("cannot convert '{value}' to {target} for '{field}'")]
    CannotConvert {
        field: String,
        value: String,
        target: String,
    },
}

impl ParseError {
    pub(crate) fn property(path: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidPropertyName {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn filter_type(field: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidFilterType {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
