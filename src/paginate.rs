//! Filter, sort, then page a collection.
//!
//! Against a [`DataSource`] the store-evaluable halves are pushed down as a
//! parameterized fragment and only traversal terms run in process. When
//! nothing is left to run in process the page is pushed down as well. A store
//! that rejects the fragment can be replaced by a full local evaluation when
//! the engine allows it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{Error, SourceError};
use crate::memory::{to_documents, InMemoryQuery, Scanner};
use crate::sql::SqlFragment;

/// A backing store able to run compiled fragments.
pub trait DataSource {
    type Item: Serialize + Clone + Send + Sync;

    /// Returns the rows matching `fragment.where_clause`, ordered by
    /// `fragment.order_by`. When `fragment.limit` or `fragment.offset` is
    /// set only that window is returned.
    fn fetch(&self, fragment: &SqlFragment) -> Result<Vec<Self::Item>, SourceError>;

    /// Number of rows matching `fragment.where_clause`. Called with an
    /// unpaged fragment after a paged fetch. The default fetches every match;
    /// stores should answer with a `COUNT(*)`.
    fn count(&self, fragment: &SqlFragment) -> Result<usize, SourceError> {
        self.fetch(&fragment.unpaged()).map(|rows| rows.len())
    }

    /// Every row, unfiltered. Used for local fallback.
    fn load_all(&self) -> Result<Vec<Self::Item>, SourceError>;
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching items before paging.
    pub total: usize,
    pub offset: usize,
    /// Requested page size.
    pub count: usize,
    /// Offset of the following page, if there is one.
    pub next_offset: Option<usize>,
}

impl<T> Page<T> {
    /// Slices an already filtered and ordered result.
    pub fn from_ordered(ordered: Vec<T>, offset: usize, count: usize) -> Self {
        let total = ordered.len();
        let items: Vec<T> = ordered.into_iter().skip(offset).take(count).collect();
        Self::from_window(items, total, offset, count)
    }

    /// Wraps a page that was already cut, e.g. by the store.
    pub fn from_window(items: Vec<T>, total: usize, offset: usize, count: usize) -> Self {
        let end = offset.saturating_add(items.len());

        Self {
            next_offset: (end < total && !items.is_empty()).then_some(end),
            items,
            total,
            offset,
            count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything needed to run one request against a source.
pub(crate) struct Plan<'a> {
    pub query: InMemoryQuery,
    /// Primary halves only, unpaged.
    pub fragment: SqlFragment,
    pub scanner: Scanner<'a>,
    pub allow_fallback: bool,
}

impl Plan<'_> {
    pub fn execute<S: DataSource>(
        &self,
        source: &S,
        offset: usize,
        count: usize,
        fallbacks: &AtomicU64,
    ) -> Result<Page<S::Item>, Error> {
        let attempt = if self.query.needs_refinement() {
            self.fetch_and_refine(source)
                .map(|ordered| Page::from_ordered(ordered, offset, count))
        } else {
            self.fetch_page(source, offset, count)
        };

        match attempt {
            Err(Error::Source(err)) if err.is_rejection() && self.allow_fallback => {
                tracing::warn!(
                    error = %err,
                    where_clause = %self.fragment.where_clause,
                    "store rejected fragment, evaluating locally"
                );
                fallbacks.fetch_add(1, Ordering::Relaxed);

                let rows = source.load_all()?;
                let documents = to_documents(&rows)?;
                let selected = self.query.select(&documents, &self.scanner);
                Ok(Page::from_ordered(pick(rows, selected), offset, count))
            }
            other => other,
        }
    }

    /// The store evaluates everything, paging included.
    fn fetch_page<S: DataSource>(
        &self,
        source: &S,
        offset: usize,
        count: usize,
    ) -> Result<Page<S::Item>, Error> {
        let items = source.fetch(&self.fragment.paged(offset, count))?;
        let total = source.count(&self.fragment)?;
        tracing::debug!(total, returned = items.len(), "page pushed down to store");
        Ok(Page::from_window(items, total, offset, count))
    }

    /// Traversal terms or keys remain, so every primary match is fetched.
    fn fetch_and_refine<S: DataSource>(&self, source: &S) -> Result<Vec<S::Item>, Error> {
        let rows = source.fetch(&self.fragment)?;
        let documents = to_documents(&rows)?;
        let selected = self.query.refine(&documents, &self.scanner);
        Ok(pick(rows, selected))
    }
}

/// Takes the rows at `indices`, in that order.
fn pick<T>(rows: Vec<T>, indices: Vec<usize>) -> Vec<T> {
    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    indices
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}
