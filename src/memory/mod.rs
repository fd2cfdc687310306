//! In-memory evaluation of parsed filters and sorts.
//!
//! Items are serialized to `serde_json::Value` once and every compiled term
//! reads from that document, so any `Serialize` type can be queried.

pub mod predicate;
pub mod scan;
pub mod sort;

pub use predicate::{lookup, Predicate};
pub use scan::Scanner;
pub use sort::Comparator;

use serde::Serialize;
use serde_json::Value as Json;

use crate::ast::{FilterExpression, SortExpression};
use crate::error::Error;

/// A compiled predicate and comparator pair.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryQuery {
    pub predicate: Predicate,
    pub comparator: Comparator,
}

impl InMemoryQuery {
    pub fn compile(filter: &FilterExpression, sort: &SortExpression) -> Result<Self, Error> {
        Ok(Self {
            predicate: Predicate::compile(filter)?,
            comparator: Comparator::compile(sort),
        })
    }

    /// Indices of the matching documents, sorted.
    pub fn select(&self, documents: &[Json], scanner: &Scanner<'_>) -> Vec<usize> {
        let candidates: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, document)| self.predicate.matches_primary(document))
            .map(|(index, _)| index)
            .collect();

        let mut selected = self.reduce_secondary(documents, candidates, scanner);
        self.comparator.sort_indices(documents, &mut selected);
        selected
    }

    /// Whether any term or sort key must run in process.
    pub fn needs_refinement(&self) -> bool {
        self.predicate.has_secondary() || self.comparator.has_secondary()
    }

    /// Applies only what a store could not: the secondary predicate, and a
    /// re-sort when a sort key is secondary. `documents` are assumed already
    /// filtered and ordered by the primary halves.
    pub fn refine(&self, documents: &[Json], scanner: &Scanner<'_>) -> Vec<usize> {
        let mut selected = self.reduce_secondary(documents, (0..documents.len()).collect(), scanner);
        if self.comparator.has_secondary() {
            self.comparator.sort_indices(documents, &mut selected);
        }
        selected
    }

    fn reduce_secondary(
        &self,
        documents: &[Json],
        candidates: Vec<usize>,
        scanner: &Scanner<'_>,
    ) -> Vec<usize> {
        if !self.predicate.has_secondary() {
            return candidates;
        }

        scanner
            .retain_with_keys(documents, &candidates, self.predicate.required_keys())
            .into_iter()
            .filter(|index| {
                documents
                    .get(*index)
                    .map_or(false, |document| self.predicate.matches_secondary(document))
            })
            .collect()
    }

    /// Filters and sorts `items`, returning clones in result order.
    pub fn apply<T: Serialize + Clone>(
        &self,
        items: &[T],
        scanner: &Scanner<'_>,
    ) -> Result<Vec<T>, Error> {
        let documents = to_documents(items)?;
        Ok(self
            .select(&documents, scanner)
            .into_iter()
            .filter_map(|index| items.get(index).cloned())
            .collect())
    }
}

/// Serializes items into the documents read by compiled terms.
pub fn to_documents<T: Serialize>(items: &[T]) -> Result<Vec<Json>, Error> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Error::from))
        .collect()
}
