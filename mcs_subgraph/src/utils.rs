//! Utility functions for the search phases.

use std::collections::HashSet;
use std::hash::Hash;

/// Computes the intersection of a vector of sets.
pub(crate) fn intersect_sets<T: Eq + Hash + Clone>(mut items: Vec<HashSet<T>>) -> HashSet<T> {
    items.pop().map_or_else(HashSet::new, |first| {
        items.iter().fold(first, |acc, hs| &acc & hs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_nothing_is_empty() {
        assert!(intersect_sets::<usize>(Vec::new()).is_empty());
    }

    #[test]
    fn intersection_keeps_common_items() {
        let sets = vec![
            HashSet::from([1, 2, 3]),
            HashSet::from([2, 3, 4]),
            HashSet::from([3, 2, 9]),
        ];
        let mut common: Vec<_> = intersect_sets(sets).into_iter().collect();
        common.sort_unstable();
        assert_eq!(common, vec![2, 3]);
    }
}
