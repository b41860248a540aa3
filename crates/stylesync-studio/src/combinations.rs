//! Combination planning
//!
//! Finds the (upper, lower) garment pairs a person has not been tried on
//! with yet. Any existing outfit for the exact triple counts, whatever its
//! status, so a failed attempt is not re-proposed by a batch.

use crate::outfit::Outfit;
use std::collections::HashSet;
use stylesync_core::ItemId;

/// A garment pair that has no outfit record yet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingCombination {
    pub upper_id: ItemId,
    pub lower_id: ItemId,
}

/// Compute the pairs of `uppers` x `lowers` with no outfit record for `person_id`.
///
/// Output is upper-major: every lower for the first upper, then every
/// lower for the second, and so on. Repeated ids in the inputs never
/// produce a repeated pair. Returns an empty list when the person id or
/// either garment list is empty.
pub fn pending_combinations(
    person_id: &ItemId,
    uppers: &[ItemId],
    lowers: &[ItemId],
    existing: &[Outfit],
) -> Vec<PendingCombination> {
    if person_id.is_empty() || uppers.is_empty() || lowers.is_empty() {
        return Vec::new();
    }

    let taken: HashSet<(&ItemId, &ItemId)> = existing
        .iter()
        .filter(|o| &o.person_id == person_id)
        .map(|o| (&o.upper_id, &o.lower_id))
        .collect();

    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for upper in uppers {
        for lower in lowers {
            if taken.contains(&(upper, lower)) || !seen.insert((upper, lower)) {
                continue;
            }
            pending.push(PendingCombination {
                upper_id: upper.clone(),
                lower_id: lower.clone(),
            });
        }
    }
    pending
}
