use super::{Expression, FilterParameter, SortParameter};
use serde::{Deserialize, Serialize};

/// A parsed filter, split into the half the store can evaluate and the half
/// that must run in process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub type_name: String,
    /// Indexed by declaration order.
    pub parameters: Vec<FilterParameter>,
    pub primary: Expression,
    pub secondary: Expression,
}

impl FilterExpression {
    pub fn empty(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters: Vec::new(),
            primary: Expression::new(),
            secondary: Expression::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    pub fn has_secondary(&self) -> bool {
        !self.secondary.is_empty()
    }

    /// Copy without the in-process half, for push-down to a store.
    pub fn primary_only(&self) -> Self {
        Self {
            secondary: Expression::new(),
            ..self.clone()
        }
    }

    /// Parameters of the in-process half, in declaration order.
    pub fn secondary_parameters(&self) -> Vec<&FilterParameter> {
        let mut indices = self.secondary.terms();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| self.parameters.get(index))
            .collect()
    }
}

/// A parsed sort. `primary` and `secondary` hold declaration indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortExpression {
    pub type_name: String,
    pub parameters: Vec<SortParameter>,
    pub primary: Vec<usize>,
    pub secondary: Vec<usize>,
}

impl SortExpression {
    pub fn empty(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters: Vec::new(),
            primary: Vec::new(),
            secondary: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn has_secondary(&self) -> bool {
        !self.secondary.is_empty()
    }

    pub fn primary_only(&self) -> Self {
        Self {
            secondary: Vec::new(),
            ..self.clone()
        }
    }

    /// Primary keys first, then secondary keys.
    pub fn ordered_parameters(&self) -> impl Iterator<Item = &SortParameter> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .filter_map(|index| self.parameters.get(*index))
    }
}
