//! Correspondences between query and target vertices.

use std::collections::BTreeMap;

use contracts::*;
use mcs_common::{DedupeMode, Graph};
use serde::{Deserialize, Serialize};

use crate::compat::MatcherSet;

/// A collection of mappings produced by one phase of the search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSet {
    /// The mappings, in insertion or canonical order.
    pub items: Vec<Mapping>,
}

impl MappingSet {
    /// Creates a set from a list of mappings.
    #[must_use]
    pub const fn new(items: Vec<Mapping>) -> Self {
        Self { items }
    }

    /// Returns true if the set holds no mappings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of mappings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates over the mappings.
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.items.iter()
    }

    /// Adds a mapping.
    pub fn push(&mut self, mapping: Mapping) {
        self.items.push(mapping);
    }

    /// Vertex count of the largest mapping, 0 when empty.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.items.iter().map(Mapping::len).max().unwrap_or(0)
    }

    /// Removes duplicates, keeping the first occurrence.
    pub fn dedupe(&mut self, mode: DedupeMode) {
        crate::dedupe::apply_deduplication(&mut self.items, mode);
    }

    /// Keeps only the mappings with the largest vertex count.
    pub fn retain_largest(&mut self) {
        let best = self.max_size();
        self.items.retain(|m| m.len() == best);
    }

    /// Keeps only the mappings with the largest vertex count, tie-broken by
    /// the number of query edges they cover.
    pub fn retain_maximum(&mut self, query: &Graph, target: &Graph) {
        let keyed: Vec<((usize, usize), Mapping)> = self
            .items
            .drain(..)
            .map(|m| ((m.len(), m.mapped_edge_count(query, target)), m))
            .collect();
        let Some(best) = keyed.iter().map(|(key, _)| *key).max() else {
            return;
        };
        self.items = keyed
            .into_iter()
            .filter(|(key, _)| *key == best)
            .map(|(_, m)| m)
            .collect();
    }

    /// Orders by size descending, then by pair list ascending.
    pub fn sort_canonical(&mut self) {
        self.items
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }

    /// Drops mappings beyond `cap`. Returns whether any were dropped.
    pub fn truncate(&mut self, cap: usize) -> bool {
        let dropped = self.items.len() > cap;
        self.items.truncate(cap);
        dropped
    }
}

impl IntoIterator for MappingSet {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a MappingSet {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Mapping> for MappingSet {
    fn from_iter<I: IntoIterator<Item = Mapping>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Mapping> for MappingSet {
    fn extend<I: IntoIterator<Item = Mapping>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

/// An injective partial function from query vertices to target vertices.
///
/// Both directions are stored so lookups from either side are cheap. The
/// ordered maps make the derived `Ord` and `Hash` canonical.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mapping {
    /// Query to target vertex mapping
    query_to_target: BTreeMap<usize, usize>,
    /// Target to query vertex mapping
    target_to_query: BTreeMap<usize, usize>,
}

impl Mapping {
    /// Checks that the two directions describe the same injective relation.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.query_to_target.len() == self.target_to_query.len()
            && self
                .query_to_target
                .iter()
                .all(|(q, t)| self.target_to_query.get(t) == Some(q))
    }

    /// Creates an empty mapping.
    #[debug_ensures(ret.is_consistent())]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from (query, target) pairs, or `None` when a vertex
    /// appears twice on either side.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Option<Self> {
        let mut mapping = Self::new();
        for (q, t) in pairs {
            if mapping.contains_query(q) || !mapping.is_target_free(t) {
                return None;
            }
            mapping.assign(q, t);
        }
        Some(mapping)
    }

    /// Records a pair, replacing any previous image of `query`.
    #[debug_requires(
        self.query_of(target).is_none_or(|q| q == query),
        "target vertex already taken"
    )]
    #[debug_ensures(self.is_consistent())]
    #[debug_ensures(self.target_of(query) == Some(target))]
    pub fn assign(&mut self, query: usize, target: usize) {
        self.remove_by_query(query);
        self.query_to_target.insert(query, target);
        self.target_to_query.insert(target, query);
    }

    /// Removes the pair for `query`, returning its former image.
    #[debug_ensures(self.is_consistent())]
    #[debug_ensures(!self.contains_query(query))]
    pub fn remove_by_query(&mut self, query: usize) -> Option<usize> {
        let target = self.query_to_target.remove(&query)?;
        self.target_to_query.remove(&target);
        Some(target)
    }

    /// Image of a query vertex.
    #[must_use]
    pub fn target_of(&self, query: usize) -> Option<usize> {
        self.query_to_target.get(&query).copied()
    }

    /// Preimage of a target vertex.
    #[must_use]
    pub fn query_of(&self, target: usize) -> Option<usize> {
        self.target_to_query.get(&target).copied()
    }

    /// Returns true if the query vertex is mapped.
    #[must_use]
    pub fn contains_query(&self, query: usize) -> bool {
        self.query_to_target.contains_key(&query)
    }

    /// Returns true if the target vertex is not yet used.
    #[must_use]
    pub fn is_target_free(&self, target: usize) -> bool {
        !self.target_to_query.contains_key(&target)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.query_to_target.len(), self.target_to_query.len());
        self.query_to_target.len()
    }

    /// Returns true if no pairs are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_to_target.is_empty()
    }

    /// Pairs in ascending query order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.query_to_target.iter().map(|(&q, &t)| (q, t))
    }

    /// Sorted pair list; equal signatures mean equal mappings.
    #[must_use]
    pub fn signature(&self) -> Vec<(usize, usize)> {
        self.pairs().collect()
    }

    /// Sorted list of covered target vertices.
    #[must_use]
    pub fn target_signature(&self) -> Vec<usize> {
        self.target_to_query.keys().copied().collect()
    }

    /// The same correspondence read from the target side.
    #[must_use]
    pub fn transposed(&self) -> Self {
        Self {
            query_to_target: self.target_to_query.clone(),
            target_to_query: self.query_to_target.clone(),
        }
    }

    /// Number of query edges whose endpoints are mapped onto adjacent target vertices.
    #[must_use]
    pub fn mapped_edge_count(&self, query: &Graph, target: &Graph) -> usize {
        query
            .bonds()
            .iter()
            .filter(|bond| {
                match (self.target_of(bond.begin), self.target_of(bond.end)) {
                    (Some(a), Some(b)) => target.adjacent(a, b),
                    _ => false,
                }
            })
            .count()
    }

    /// Every query edge between mapped vertices has a compatible target edge.
    #[must_use]
    pub fn is_edge_consistent(&self, query: &Graph, target: &Graph, matchers: &MatcherSet) -> bool {
        query.bonds().iter().enumerate().all(|(qe, bond)| {
            match (self.target_of(bond.begin), self.target_of(bond.end)) {
                (Some(a), Some(b)) => target
                    .edge_between(a, b)
                    .is_some_and(|te| matchers.edges(query, qe, target, te)),
                _ => true,
            }
        })
    }

    /// No target edge joins the images of two non-adjacent query vertices.
    #[must_use]
    pub fn is_induced(&self, query: &Graph, target: &Graph) -> bool {
        target.bonds().iter().all(|bond| {
            match (self.query_of(bond.begin), self.query_of(bond.end)) {
                (Some(a), Some(b)) => query.adjacent(a, b),
                _ => true,
            }
        })
    }

    /// Full check of a finished mapping: indices in range, injective, vertex
    /// compatible and edge consistent.
    #[must_use]
    pub fn is_valid(&self, query: &Graph, target: &Graph, matchers: &MatcherSet) -> bool {
        self.is_consistent()
            && self.pairs().all(|(q, t)| {
                q < query.vertex_count()
                    && t < target.vertex_count()
                    && matchers.vertices(query, q, target, t)
            })
            && self.is_edge_consistent(query, target, matchers)
    }
}


#[cfg(test)]
mod property_tests {
    use quickcheck::{Arbitrary, Gen, quickcheck};

    use super::*;

    #[derive(Clone, Debug)]
    struct ArbitraryMappingOp {
        query: usize,
        target: usize,
        is_remove: bool,
    }

    impl Arbitrary for ArbitraryMappingOp {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                query: usize::arbitrary(g) % 50,
                target: usize::arbitrary(g) % 50,
                is_remove: bool::arbitrary(g),
            }
        }
    }

    fn apply(mapping: &mut Mapping, op: &ArbitraryMappingOp) {
        if op.is_remove {
            mapping.remove_by_query(op.query);
        } else if mapping.is_target_free(op.target) {
            mapping.assign(op.query, op.target);
        }
    }

    quickcheck! {
        fn prop_mapping_ops_maintain_consistency(ops: Vec<ArbitraryMappingOp>) -> bool {
            let mut mapping = Mapping::new();
            for op in &ops {
                apply(&mut mapping, op);
                if !mapping.is_consistent() {
                    return false;
                }
            }
            true
        }

        fn prop_mapping_is_injective(ops: Vec<ArbitraryMappingOp>) -> bool {
            let mut mapping = Mapping::new();
            for op in &ops {
                apply(&mut mapping, op);
            }
            let mut targets = mapping.target_signature();
            targets.dedup();
            targets.len() == mapping.len()
                && mapping.pairs().all(|(q, t)| mapping.query_of(t) == Some(q))
        }

        fn prop_transpose_round_trips(ops: Vec<ArbitraryMappingOp>) -> bool {
            let mut mapping = Mapping::new();
            for op in &ops {
                apply(&mut mapping, op);
            }
            mapping.transposed().transposed() == mapping
        }
    }
}
