use std::cmp::Ordering;

use serde_json::Value as Json;
use uuid::Uuid;

use crate::ast::{
    ComparisonKind, FilterExpression, FilterParameter, LogicTree, Operator, TypeTag, Value,
};
use crate::datetime::{parse_datetime, DatePattern};
use crate::error::ParseError;

/// Follows `path` through a serialized item.
///
/// Object keys are matched exactly first, then case-insensitively. Numeric
/// segments index into arrays. JSON `null` reads as absent.
pub fn lookup<'v, S: AsRef<str>>(document: &'v Json, path: &[S]) -> Option<&'v Json> {
    path.iter()
        .try_fold(document, |current, key| {
            let key = key.as_ref();
            match current {
                Json::Object(map) => map.get(key).or_else(|| {
                    map.iter()
                        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                        .map(|(_, value)| value)
                }),
                Json::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
                _ => None,
            }
        })
        .filter(|value| !value.is_null())
}

/// Lower-cased string form of a serialized value.
pub(crate) fn fold(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.to_lowercase(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n
            .as_f64()
            .map(crate::ast::format_number)
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string().to_lowercase(),
    }
}

fn number_of(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Test {
    /// Compared against `null`.
    Absent,
    /// Lower-cased needle of a string partial match.
    Pattern(ComparisonKind, String),
    Dates(DatePattern),
    /// Folded members of a list literal.
    AnyOf(Vec<String>),
    Typed(Value),
    /// Folded literal for an untyped blob key.
    Loose(String),
}

/// One compiled term.
#[derive(Debug, Clone, PartialEq)]
struct Comparison {
    path: Vec<String>,
    operator: Operator,
    test: Test,
}

impl Comparison {
    fn compile(param: &FilterParameter) -> Result<Self, ParseError> {
        let tag = param.property.value_type.underlying();

        let test = if param.value.is_null() {
            Test::Absent
        } else if param.comparison.is_partial() {
            let needle = param.value.to_folded_string();
            match tag {
                TypeTag::DateTime => {
                    Test::Dates(DatePattern::decompose(param.stripped_value(), param.comparison)?)
                }
                _ => Test::Pattern(param.comparison, needle),
            }
        } else {
            match (&param.value, tag) {
                (Value::List(items), _) => {
                    Test::AnyOf(items.iter().map(Value::to_folded_string).collect())
                }
                (value, TypeTag::Any) => Test::Loose(value.to_folded_string()),
                (Value::Text(s), _) => Test::Typed(Value::Text(s.to_lowercase())),
                (Value::Enum(s), _) => Test::Typed(Value::Enum(s.to_lowercase())),
                (value, _) => Test::Typed(value.clone()),
            }
        };

        Ok(Self {
            path: param
                .property
                .access_path()
                .into_iter()
                .map(str::to_string)
                .collect(),
            operator: param.operator,
            test,
        })
    }

    /// `!=` negates equality and partial matches as a whole.
    fn resolve(&self, matched: bool) -> bool {
        if self.operator == Operator::NotEqual {
            !matched
        } else {
            matched
        }
    }

    /// Incomparable values are only ever not-equal.
    fn accept(&self, ordering: Option<Ordering>) -> bool {
        match ordering {
            Some(ordering) => self.operator.accepts(ordering),
            None => self.operator == Operator::NotEqual,
        }
    }

    fn matches(&self, document: &Json) -> bool {
        let actual = lookup(document, &self.path);

        match (&self.test, actual) {
            (Test::Absent, actual) => self.resolve(actual.is_none()),
            (_, None) => self.operator == Operator::NotEqual,
            (Test::Pattern(kind, needle), Some(actual)) => {
                let haystack = fold(actual);
                self.resolve(match kind {
                    ComparisonKind::StartsWith => haystack.starts_with(needle.as_str()),
                    ComparisonKind::EndsWith => haystack.ends_with(needle.as_str()),
                    ComparisonKind::Contains => haystack.contains(needle.as_str()),
                    ComparisonKind::Full => haystack == *needle,
                })
            }
            (Test::Dates(pattern), Some(actual)) => self.resolve(
                actual
                    .as_str()
                    .and_then(parse_datetime)
                    .map_or(false, |dt| pattern.matches(&dt)),
            ),
            (Test::AnyOf(expected), Some(actual)) => self.resolve(match actual {
                Json::Array(items) => items.iter().any(|item| expected.contains(&fold(item))),
                scalar => expected.contains(&fold(scalar)),
            }),
            (Test::Typed(expected), Some(actual)) => self.accept(compare_typed(actual, expected)),
            (Test::Loose(expected), Some(actual)) => {
                self.accept(compare_loose(actual, expected, self.operator))
            }
        }
    }
}

fn compare_typed(actual: &Json, expected: &Value) -> Option<Ordering> {
    match expected {
        Value::Number(n) => number_of(actual)?.partial_cmp(n),
        Value::Text(s) | Value::Enum(s) => Some(fold(actual).cmp(s)),
        Value::Boolean(b) => {
            let actual = match actual {
                Json::Bool(b) => Some(*b),
                Json::String(s) => s.trim().to_lowercase().parse::<bool>().ok(),
                _ => None,
            }?;
            Some(actual.cmp(b))
        }
        Value::Uuid(u) => Uuid::parse_str(actual.as_str()?.trim())
            .ok()
            .map(|actual| actual.cmp(u)),
        Value::DateTime(dt) => parse_datetime(actual.as_str()?).map(|actual| actual.cmp(dt)),
        Value::Json(json) => (actual == json).then_some(Ordering::Equal),
        Value::Null | Value::List(_) => None,
    }
}

/// Blob keys carry no declared type. Equality is on folded strings; ordering
/// is numeric or chronological when both sides parse as such.
fn compare_loose(actual: &Json, expected: &str, operator: Operator) -> Option<Ordering> {
    let folded = fold(actual);
    if operator.is_equality() {
        return Some(folded.as_str().cmp(expected));
    }

    if let (Some(a), Ok(b)) = (number_of(actual), expected.parse::<f64>()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (parse_datetime(&folded), parse_datetime(expected)) {
        return Some(a.cmp(&b));
    }
    Some(folded.as_str().cmp(expected))
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Term(Comparison),
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl Node {
    fn compile(tree: &LogicTree, parameters: &[FilterParameter]) -> Result<Self, ParseError> {
        let children = |nodes: &[LogicTree]| {
            nodes
                .iter()
                .map(|node| Node::compile(node, parameters))
                .collect::<Result<Vec<_>, _>>()
        };

        match tree {
            LogicTree::Term(index) => {
                let param = parameters.get(*index).ok_or_else(|| {
                    ParseError::MalformedParameterList(format!("no parameter at position {}", index))
                })?;
                Ok(Node::Term(Comparison::compile(param)?))
            }
            LogicTree::And(nodes) => Ok(Node::And(children(nodes)?)),
            LogicTree::Or(nodes) => Ok(Node::Or(children(nodes)?)),
        }
    }

    fn matches(&self, document: &Json) -> bool {
        match self {
            Node::Term(comparison) => comparison.matches(document),
            Node::And(nodes) => nodes.iter().all(|node| node.matches(document)),
            Node::Or(nodes) => nodes.iter().any(|node| node.matches(document)),
        }
    }
}

/// Filter predicate over serialized items.
///
/// The primary half holds terms on declared fields. The secondary half holds
/// traversal terms, which are only evaluated on items carrying every
/// referenced map or blob key.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    primary: Node,
    secondary: Node,
    required_keys: Vec<Vec<String>>,
}

impl Predicate {
    pub fn compile(filter: &FilterExpression) -> Result<Self, ParseError> {
        let mut required_keys: Vec<Vec<String>> = filter
            .secondary_parameters()
            .iter()
            .map(|param| {
                param
                    .property
                    .access_path()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        required_keys.sort();
        required_keys.dedup();

        Ok(Self {
            primary: Node::compile(&filter.primary.to_tree(), &filter.parameters)?,
            secondary: Node::compile(&filter.secondary.to_tree(), &filter.parameters)?,
            required_keys,
        })
    }

    /// Accepts every item.
    pub fn always() -> Self {
        Self {
            primary: Node::And(Vec::new()),
            secondary: Node::And(Vec::new()),
            required_keys: Vec::new(),
        }
    }

    pub fn matches(&self, document: &Json) -> bool {
        self.matches_primary(document)
            && self.has_required_keys(document)
            && self.matches_secondary(document)
    }

    pub fn matches_primary(&self, document: &Json) -> bool {
        self.primary.matches(document)
    }

    pub fn matches_secondary(&self, document: &Json) -> bool {
        self.secondary.matches(document)
    }

    pub fn has_secondary(&self) -> bool {
        !self.required_keys.is_empty()
    }

    /// Access paths of the traversal terms.
    pub fn required_keys(&self) -> &[Vec<String>] {
        &self.required_keys
    }

    pub fn has_required_keys(&self, document: &Json) -> bool {
        self.required_keys
            .iter()
            .all(|path| lookup(document, path).is_some())
    }
}
