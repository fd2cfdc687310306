use super::{PropertyInfo, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    EqualTo,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Operator {
    /// Parses an operator token. Longer tokens are never split here; the
    /// lexer hands over the full run of operator characters.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Operator::EqualTo),
            "!=" => Some(Operator::NotEqual),
            ">" => Some(Operator::GreaterThan),
            ">=" => Some(Operator::GreaterOrEqual),
            "<" => Some(Operator::LessThan),
            "<=" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::EqualTo => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::EqualTo | Operator::NotEqual)
    }

    /// Applies the operator to an ordering of `actual` relative to `expected`.
    pub fn accepts(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Operator::EqualTo => ordering == Equal,
            Operator::NotEqual => ordering != Equal,
            Operator::GreaterThan => ordering == Greater,
            Operator::GreaterOrEqual => ordering != Less,
            Operator::LessThan => ordering == Less,
            Operator::LessOrEqual => ordering != Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// No marker: AND, with same-key equality terms OR-grouped.
    Default,
    And,
    Or,
}

impl Combinator {
    pub fn from_prefix(key: &str) -> (Self, &str) {
        if let Some(rest) = key.strip_prefix("&&") {
            (Combinator::And, rest)
        } else if let Some(rest) = key.strip_prefix("||") {
            (Combinator::Or, rest)
        } else {
            (Combinator::Default, key)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    Full,
    StartsWith,
    EndsWith,
    Contains,
}

impl ComparisonKind {
    pub const WILDCARD: char = '%';

    /// Detects and strips the partial-match markers of a value.
    pub fn detect(value: &str) -> (Self, &str) {
        let leading = value.starts_with(Self::WILDCARD);
        let trailing = value.len() > 1 && value.ends_with(Self::WILDCARD);
        match (leading, trailing) {
            (true, true) => (ComparisonKind::Contains, &value[1..value.len() - 1]),
            (true, false) => (ComparisonKind::EndsWith, &value[1..]),
            (false, true) => (ComparisonKind::StartsWith, &value[..value.len() - 1]),
            (false, false) => (ComparisonKind::Full, value),
        }
    }

    pub fn is_partial(&self) -> bool {
        !matches!(self, ComparisonKind::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One resolved filter or sort term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter<V> {
    /// Resolved path key.
    pub key: String,
    pub raw_key: String,
    pub raw_value: String,
    pub operator: Operator,
    pub combinator: Combinator,
    pub comparison: ComparisonKind,
    pub declaration_order: usize,
    pub value: V,
    pub property: PropertyInfo,
}

pub type FilterParameter = Parameter<Value>;
pub type SortParameter = Parameter<SortDirection>;

impl<V> Parameter<V> {
    pub fn is_traversal(&self) -> bool {
        self.property.is_traversal
    }

    /// Value with any partial-match markers removed.
    pub fn stripped_value(&self) -> &str {
        ComparisonKind::detect(&self.raw_value).1
    }
}

impl SortParameter {
    /// True when the direction was spelled `asc` or `desc`.
    pub fn is_short_form(&self) -> bool {
        let raw = self.raw_value.trim();
        raw.eq_ignore_ascii_case("asc") || raw.eq_ignore_ascii_case("desc")
    }
}
