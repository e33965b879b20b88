//! Diffing and upload planning
//!
//! Works out which numbers a write sequence must carry. The create path
//! partitions the desired list directly; the update path only chunks the
//! numbers that are new remotely and folds the rest into the first write.

use crate::error::PlanError;
use crate::partition::partition;
use crate::types::{Chunk, Dnis};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashSet;

/// Numbers in `desired` that are absent from `current`.
///
/// Keeps the order of `desired` and collapses duplicates in it.
#[must_use]
pub fn compute_additions(desired: &[Dnis], current: &[Dnis]) -> Vec<Dnis> {
    let current: HashSet<&Dnis> = current.iter().collect();
    desired
        .iter()
        .filter(|number| !current.contains(number))
        .collect::<IndexSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Single-use write plan for one reconciliation.
///
/// Applying `initial_payload` and then every pending chunk cumulatively
/// leaves exactly the desired numbers on the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPlan {
    initial_payload: Vec<Dnis>,
    pending_chunks: Vec<Chunk>,
    additions: Vec<Dnis>,
}

impl UploadPlan {
    /// Numbers carried by the first write
    #[inline]
    #[must_use]
    pub fn initial_payload(&self) -> &[Dnis] {
        &self.initial_payload
    }

    /// Chunks appended by follow-up writes, in order
    #[inline]
    #[must_use]
    pub fn pending_chunks(&self) -> &[Chunk] {
        &self.pending_chunks
    }

    /// Numbers new to the entity (everything on create)
    #[inline]
    #[must_use]
    pub fn additions(&self) -> &[Dnis] {
        &self.additions
    }

    /// Number of requests needed, counting the first write
    #[inline]
    #[must_use]
    pub fn total_writes(&self) -> usize {
        1 + self.pending_chunks.len()
    }

    /// Whether the plan needs more than one write
    #[inline]
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        !self.pending_chunks.is_empty()
    }

    /// Numbers the entity holds once every write has been applied
    #[must_use]
    pub fn final_dnis(&self) -> Vec<Dnis> {
        let mut all = self.initial_payload.clone();
        for chunk in &self.pending_chunks {
            all.extend(chunk.iter().cloned());
        }
        all
    }

    /// Consume the plan into its first payload and the pending chunks
    #[must_use]
    pub fn into_parts(self) -> (Vec<Dnis>, Vec<Chunk>) {
        (self.initial_payload, self.pending_chunks)
    }
}

/// Plan a create: partition `desired` directly.
///
/// # Errors
/// `PlanError::InvalidConfiguration` if `max_per_request` is zero
pub fn plan_create(desired: &[Dnis], max_per_request: usize) -> Result<UploadPlan, PlanError> {
    let desired: Vec<Dnis> = dedup(desired);
    let mut chunks = partition(&desired, max_per_request)?.into_iter();
    let initial_payload = chunks.next().unwrap_or_default();

    Ok(UploadPlan {
        initial_payload,
        pending_chunks: chunks.collect(),
        additions: desired,
    })
}

/// Plan an update from `current` towards `desired`.
///
/// Numbers already present go out with the first chunk of additions;
/// numbers present remotely but not desired are dropped by never being
/// written again.
///
/// # Errors
/// `PlanError::InvalidConfiguration` if `max_per_request` is zero
pub fn plan_update(
    desired: &[Dnis],
    current: &[Dnis],
    max_per_request: usize,
) -> Result<UploadPlan, PlanError> {
    let additions = compute_additions(desired, current);
    let mut chunks = partition(&additions, max_per_request)?.into_iter();

    let added: HashSet<&Dnis> = additions.iter().collect();
    let mut initial_payload: Vec<Dnis> = dedup(desired)
        .into_iter()
        .filter(|number| !added.contains(number))
        .collect();
    if let Some(first) = chunks.next() {
        initial_payload.extend(first);
    }

    tracing::debug!(
        additions = additions.len(),
        initial = initial_payload.len(),
        "planned dnis update"
    );

    Ok(UploadPlan {
        initial_payload,
        pending_chunks: chunks.collect(),
        additions,
    })
}

fn dedup(numbers: &[Dnis]) -> Vec<Dnis> {
    numbers
        .iter()
        .collect::<IndexSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn n(i: u32) -> Dnis {
        Dnis::new(format!("+1920555{i:04}"))
    }

    fn range(from: u32, to: u32) -> Vec<Dnis> {
        (from..=to).map(n).collect()
    }

    #[test]
    fn additions_preserve_desired_order() {
        let desired = vec![n(5), n(1), n(4), n(2)];
        let current = vec![n(1), n(2)];
        assert_eq!(compute_additions(&desired, &current), vec![n(5), n(4)]);
    }

    #[test]
    fn additions_collapse_duplicates() {
        let desired = vec![n(3), n(3), n(4)];
        assert_eq!(compute_additions(&desired, &[]), vec![n(3), n(4)]);
    }

    #[test]
    fn create_even_split() {
        let plan = plan_create(&range(1, 10), 4).unwrap();
        assert_eq!(plan.initial_payload(), range(1, 4).as_slice());
        assert_eq!(plan.pending_chunks(), &[range(5, 8), range(9, 10)]);
        assert_eq!(plan.total_writes(), 3);
    }

    #[test]
    fn create_without_numbers() {
        let plan = plan_create(&[], 4).unwrap();
        assert!(plan.initial_payload().is_empty());
        assert!(!plan.is_chunked());
    }

    #[test]
    fn update_partial_overlap() {
        let plan = plan_update(&range(1, 7), &range(1, 3), 3).unwrap();
        assert_eq!(plan.additions(), range(4, 7).as_slice());
        assert_eq!(plan.initial_payload(), range(1, 6).as_slice());
        assert_eq!(plan.pending_chunks(), &[vec![n(7)]]);
    }

    #[test]
    fn update_drops_numbers_not_desired() {
        let plan = plan_update(&[n(1), n(9)], &range(1, 5), 2).unwrap();
        assert_eq!(plan.initial_payload(), &[n(1), n(9)]);
        assert!(!plan.is_chunked());
    }

    #[test]
    fn update_identical_is_single_write() {
        let plan = plan_update(&range(1, 6), &range(1, 6), 2).unwrap();
        assert!(plan.additions().is_empty());
        assert!(plan.pending_chunks().is_empty());
        assert_eq!(plan.initial_payload(), range(1, 6).as_slice());
    }

    #[test]
    fn zero_chunk_size_fails_both_paths() {
        assert!(plan_create(&range(1, 3), 0).is_err());
        assert!(plan_update(&range(1, 3), &[], 0).is_err());
    }

    fn numbers() -> impl Strategy<Value = Vec<Dnis>> {
        proptest::collection::hash_set(0u32..60, 0..40)
            .prop_map(|set| set.into_iter().map(n).collect())
    }

    proptest! {
        #[test]
        fn prop_identical_sets_need_no_chunks(desired in numbers(), max in 1usize..10) {
            let plan = plan_update(&desired, &desired, max).unwrap();
            prop_assert!(plan.additions().is_empty());
            prop_assert!(plan.pending_chunks().is_empty());
        }

        #[test]
        fn prop_update_converges(
            desired in numbers(),
            current in numbers(),
            max in 1usize..10,
        ) {
            let plan = plan_update(&desired, &current, max).unwrap();
            let applied = plan.final_dnis();

            let unique: HashSet<&Dnis> = applied.iter().collect();
            prop_assert_eq!(unique.len(), applied.len());

            let mut got = applied;
            let mut want = desired.clone();
            got.sort();
            want.sort();
            prop_assert_eq!(got, want);
        }

        #[test]
        fn prop_create_converges_in_order(desired in numbers(), max in 1usize..10) {
            let plan = plan_create(&desired, max).unwrap();
            prop_assert_eq!(plan.final_dnis(), desired);
            prop_assert!(plan.pending_chunks().iter().all(|c| !c.is_empty() && c.len() <= max));
        }
    }
}
