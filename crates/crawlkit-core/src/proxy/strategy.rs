//! Proxy selection strategies.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::ProxyEntry;

/// How the pool picks among candidate proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Cycle through candidates in order.
    #[default]
    RoundRobin,
    /// Uniformly random candidate.
    Random,
    /// Candidate with the fewest total failures; ties go to the least selected.
    LeastFailures,
}

impl SelectionStrategy {
    /// Pick one index out of `candidates` (indices into `entries`). `candidates` is never empty.
    pub(super) fn pick(
        &self,
        entries: &[ProxyEntry],
        selections: &[AtomicU64],
        candidates: &[usize],
        cursor: &AtomicUsize,
    ) -> usize {
        match self {
            SelectionStrategy::RoundRobin => {
                let n = cursor.fetch_add(1, Ordering::Relaxed);
                candidates[n % candidates.len()]
            }
            SelectionStrategy::Random => {
                let n = rand::rng().random_range(0..candidates.len());
                candidates[n]
            }
            SelectionStrategy::LeastFailures => candidates
                .iter()
                .copied()
                .min_by_key(|&i| {
                    (
                        entries[i].total_failures,
                        selections[i].load(Ordering::Relaxed),
                    )
                })
                .unwrap_or(candidates[0]),
        }
    }
}
