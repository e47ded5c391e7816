//! Duplicate removal for mapping collections.

use std::collections::HashSet;

use mcs_common::DedupeMode;

use crate::mapping::Mapping;

/// Drops every mapping whose signature under `mode` was already seen,
/// keeping the first occurrence so the caller's ordering survives.
pub(crate) fn apply_deduplication(items: &mut Vec<Mapping>, mode: DedupeMode) {
    match mode {
        DedupeMode::Full => {
            let mut seen: HashSet<Vec<(usize, usize)>> = HashSet::new();
            items.retain(|m| seen.insert(m.signature()));
        }
        DedupeMode::TargetSet => {
            let mut seen: HashSet<Vec<usize>> = HashSet::new();
            items.retain(|m| seen.insert(m.target_signature()));
        }
    }
}
