use std::cmp::Ordering;

use serde_json::Value as Json;

use super::predicate::lookup;
use crate::ast::{SortDirection, SortExpression};

#[derive(Debug, Clone, PartialEq)]
struct SortKey {
    path: Vec<String>,
    direction: SortDirection,
}

/// Multi-key comparator over serialized items.
///
/// Primary keys always come before secondary (traversal) keys. Absent values
/// sort first ascending and last descending; items lacking a traversal key
/// are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparator {
    keys: Vec<SortKey>,
    secondary: bool,
}

impl Comparator {
    pub fn compile(sort: &SortExpression) -> Self {
        let keys = sort
            .ordered_parameters()
            .map(|param| SortKey {
                path: param
                    .property
                    .access_path()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                direction: param.value,
            })
            .collect();

        Self {
            keys,
            secondary: sort.has_secondary(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary
    }

    pub fn compare(&self, a: &Json, b: &Json) -> Ordering {
        self.keys
            .iter()
            .map(|key| {
                let ordering = compare_present(lookup(a, &key.path), lookup(b, &key.path));
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Stable sort of `indices` into `documents`.
    pub fn sort_indices(&self, documents: &[Json], indices: &mut [usize]) {
        if self.is_empty() {
            return;
        }
        indices.sort_by(|a, b| match (documents.get(*a), documents.get(*b)) {
            (Some(a), Some(b)) => self.compare(a, b),
            _ => Ordering::Equal,
        });
    }
}

fn compare_present(a: Option<&Json>, b: Option<&Json>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn rank(value: &Json) -> u8 {
    match value {
        Json::Null => 0,
        Json::Bool(_) => 1,
        Json::Number(_) => 2,
        Json::String(_) => 3,
        Json::Array(_) => 4,
        Json::Object(_) => 5,
    }
}

fn compare_values(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::String(x), Json::String(y)) => {
            match (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => x.to_lowercase().cmp(&y.to_lowercase()),
            }
        }
        (Json::Array(_), Json::Array(_)) | (Json::Object(_), Json::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
