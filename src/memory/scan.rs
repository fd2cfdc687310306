//! Candidate reduction for traversal terms.
//!
//! Items lacking a referenced map or blob key are dropped before the
//! secondary predicate runs. Each check is independent, so large candidate
//! sets fan out over a bounded rayon pool. The fan-in is not assumed to keep
//! order and the surviving indices are sorted afterwards.

use rayon::prelude::*;
use rayon::ThreadPool;
use serde_json::Value as Json;

use super::predicate::lookup;

#[derive(Debug, Clone, Copy)]
pub struct Scanner<'p> {
    pool: Option<&'p ThreadPool>,
    threshold: usize,
}

impl Default for Scanner<'_> {
    fn default() -> Self {
        Self::sequential()
    }
}

impl<'p> Scanner<'p> {
    pub fn sequential() -> Self {
        Self {
            pool: None,
            threshold: usize::MAX,
        }
    }

    /// Scans on `pool` once there are at least `threshold` candidates.
    pub fn parallel(pool: &'p ThreadPool, threshold: usize) -> Self {
        Self {
            pool: Some(pool),
            threshold,
        }
    }

    fn runs_parallel(&self, candidates: usize) -> bool {
        self.pool.is_some() && candidates >= self.threshold
    }

    /// Indices from `candidates` whose document holds every path in `keys`,
    /// in ascending order.
    pub fn retain_with_keys(
        &self,
        documents: &[Json],
        candidates: &[usize],
        keys: &[Vec<String>],
    ) -> Vec<usize> {
        let has_keys = |index: &usize| {
            documents
                .get(*index)
                .map_or(false, |document| keys.iter().all(|path| lookup(document, path).is_some()))
        };

        let mut kept: Vec<usize> = match self.pool {
            Some(pool) if self.runs_parallel(candidates.len()) => {
                pool.install(|| candidates.par_iter().copied().filter(has_keys).collect())
            }
            _ => candidates.iter().copied().filter(has_keys).collect(),
        };
        kept.sort_unstable();

        tracing::debug!(
            candidates = candidates.len(),
            kept = kept.len(),
            parallel = self.runs_parallel(candidates.len()),
            "secondary key scan"
        );

        kept
    }
}
