//! Short-circuit for graphs with a single vertex.

use mcs_common::Graph;

use crate::compat::MatcherSet;
use crate::mapping::{Mapping, MappingSet};

/// Every compatible placement of a one-vertex graph onto the other graph.
///
/// When the query is the single vertex it is mapped onto each compatible
/// target vertex; otherwise each compatible query vertex is mapped onto the
/// lone target vertex. No edge can be involved either way.
pub(crate) fn single_vertex_mappings(
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
) -> MappingSet {
    let pairs: Vec<(usize, usize)> = if query.vertex_count() == 1 {
        (0..target.vertex_count()).map(|t| (0, t)).collect()
    } else {
        (0..query.vertex_count()).map(|q| (q, 0)).collect()
    };

    pairs
        .into_iter()
        .filter(|&(q, t)| matchers.vertices(query, q, target, t))
        .filter_map(|pair| Mapping::from_pairs([pair]))
        .collect()
}
