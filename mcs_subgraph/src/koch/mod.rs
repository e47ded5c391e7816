//! Clique-based common-subgraph search.
//!
//! Compatible (query bond, target bond) pairs become vertices of a
//! compatibility graph. Two pairs are linked when their bonds touch in both
//! graphs through consistently aligned endpoints, or touch in neither. Every
//! clique of that graph describes a common substructure; the maximum ones
//! are decoded into vertex mappings and used as seeds.

mod clique;
mod compat_graph;

use itertools::Itertools;
use mcs_common::{Config, Graph};
use tracing::{debug, info};

use crate::budget::StepBudget;
use crate::compat::MatcherSet;
use crate::error::McsError;
use crate::mapping::{Mapping, MappingSet};

pub use clique::{CliqueLimits, CliqueOutcome, maximum_cliques};
pub use compat_graph::{CompatGraph, EdgePair, Link};

use compat_graph::aligns;

/// Target bonds that are compatible with at least one query bond.
///
/// Pruning the rest up front shrinks the compatibility graph without
/// changing which cliques exist.
#[must_use]
pub fn reduce_target_edges(query: &Graph, target: &Graph, matchers: &MatcherSet) -> Vec<usize> {
    (0..target.edge_count())
        .filter(|&te| (0..query.edge_count()).any(|qe| matchers.edges(query, qe, target, te)))
        .collect()
}

/// Result of one clique-based run.
#[derive(Clone, Debug, Default)]
pub struct KochOutcome {
    /// Decoded, validated mappings from the maximum cliques.
    pub mappings: MappingSet,
    /// Size of the largest clique.
    pub clique_size: usize,
    /// Maximal cliques visited.
    pub cliques_visited: usize,
    /// The step budget ran out during enumeration.
    pub timed_out: bool,
    /// Tied maximum cliques beyond `config.max_mappings` were dropped.
    pub truncated: bool,
    /// Steps consumed.
    pub steps: u64,
}

/// Builds the compatibility graph, enumerates its maximum cliques and
/// decodes each one.
///
/// # Errors
///
/// [`McsError::ResourceExceeded`] when the compatibility graph or the
/// clique enumeration outgrows the bounds in `config`.
pub fn clique_mappings(
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
    config: &Config,
) -> Result<KochOutcome, McsError> {
    let kept_edges = reduce_target_edges(query, target, matchers);
    debug!(
        "koch: kept {} of {} target bonds",
        kept_edges.len(),
        target.edge_count()
    );

    let graph = CompatGraph::build(query, target, &kept_edges, matchers, config.max_compat_nodes)?;
    let budget = StepBudget::from_config(config);
    let limits = CliqueLimits {
        max_cliques: config.max_cliques,
        max_kept: config.max_mappings,
    };
    let found = maximum_cliques(&graph, &budget, limits)?;

    let mut mappings: MappingSet = found
        .cliques
        .iter()
        .map(|clique| decode_clique(&graph, clique, query, target, matchers))
        .filter(|m| !m.is_empty())
        .collect();
    mappings.dedupe(mcs_common::DedupeMode::Full);
    mappings.retain_largest();
    mappings.sort_canonical();

    info!(
        "koch: {} cliques of size {} decoded to {} mappings of size {}",
        found.cliques.len(),
        found.cliques.first().map_or(0, Vec::len),
        mappings.len(),
        mappings.max_size()
    );

    Ok(KochOutcome {
        clique_size: found.cliques.first().map_or(0, Vec::len),
        cliques_visited: found.visited,
        timed_out: found.timed_out,
        truncated: found.truncated,
        steps: budget.used(),
        mappings,
    })
}

/// Projects a clique onto bond endpoints.
///
/// Shared endpoints of connected pairs are fixed first. Each pair is then
/// oriented to agree with endpoints already placed, or straight when it is
/// free to choose. Pairs that would break injectivity or edge consistency
/// are dropped, so the result is always a valid mapping.
pub(crate) fn decode_clique(
    graph: &CompatGraph,
    clique: &[usize],
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
) -> Mapping {
    let mut mapping = Mapping::new();

    for (&a, &b) in clique.iter().tuple_combinations() {
        if graph.link(a, b) != Link::Connected {
            continue;
        }
        let (pa, pb) = (graph.node(a), graph.node(b));
        let shared_q = query.bond(pa.query_edge).shared_vertex(query.bond(pb.query_edge));
        let shared_t = target.bond(pa.target_edge).shared_vertex(target.bond(pb.target_edge));
        if let (Some(q), Some(t)) = (shared_q, shared_t) {
            try_assign(&mut mapping, q, t, query, target, matchers);
        }
    }

    for &node in clique {
        let pair = graph.node(node);
        let (qb, tb) = (query.bond(pair.query_edge), target.bond(pair.target_edge));
        let straight = [(qb.begin, tb.begin), (qb.end, tb.end)];
        let crossed = [(qb.begin, tb.end), (qb.end, tb.begin)];
        let agrees = |pairs: &[(usize, usize); 2]| {
            pairs.iter().any(|&(q, t)| mapping.target_of(q) == Some(t))
                && pairs.iter().all(|&(q, t)| aligns(query, target, pair, q, t))
        };
        let orientation = if agrees(&straight) {
            straight
        } else if agrees(&crossed) {
            crossed
        } else if pair.straight {
            straight
        } else {
            crossed
        };

        let mut added = Vec::with_capacity(2);
        let mut ok = true;
        for (q, t) in orientation {
            if mapping.target_of(q) == Some(t) {
                continue;
            }
            if try_assign(&mut mapping, q, t, query, target, matchers) {
                added.push(q);
            } else {
                ok = false;
                break;
            }
        }
        if !ok {
            for q in added {
                mapping.remove_by_query(q);
            }
        }
    }

    mapping
}

/// Adds `q -> t` if both are free, compatible, and every query bond from
/// `q` to an already mapped vertex has a compatible target bond.
fn try_assign(
    mapping: &mut Mapping,
    q: usize,
    t: usize,
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
) -> bool {
    if mapping.contains_query(q) || !mapping.is_target_free(t) {
        return false;
    }
    if !matchers.vertices(query, q, target, t) {
        return false;
    }
    let consistent = query.incident(q).iter().all(|&(n, qe)| {
        mapping.target_of(n).is_none_or(|tn| {
            target
                .edge_between(t, tn)
                .is_some_and(|te| matchers.edges(query, qe, target, te))
        })
    });
    if consistent {
        mapping.assign(q, t);
    }
    consistent
}

#[cfg(test)]
mod tests {
    use mcs_common::{BENZENE, CYCLOHEXANE, NAPHTHALENE, PHENOL, TOLUENE};

    use super::*;

    #[test]
    fn reduction_drops_unmatchable_bonds() {
        let strict = MatcherSet::from_flags(true, false, false);
        // benzene has only aromatic bonds, so phenol keeps its ring but not C-O
        let kept = reduce_target_edges(&BENZENE, &PHENOL, &strict);
        assert_eq!(kept.len(), 6);
        assert!(reduce_target_edges(&CYCLOHEXANE, &BENZENE, &strict).is_empty());
    }

    #[test]
    fn benzene_in_naphthalene_decodes_full_rings() {
        let matchers = MatcherSet::default();
        let out = clique_mappings(&BENZENE, &NAPHTHALENE, &matchers, &Config::default()).unwrap();
        assert_eq!(out.clique_size, 6);
        assert_eq!(out.mappings.max_size(), 6);
        for m in &out.mappings {
            assert!(m.is_valid(&BENZENE, &NAPHTHALENE, &matchers));
            assert_eq!(m.mapped_edge_count(&BENZENE, &NAPHTHALENE), 6);
        }
    }

    #[test]
    fn toluene_phenol_shares_the_ring() {
        let matchers = MatcherSet::default();
        let out = clique_mappings(&TOLUENE, &PHENOL, &matchers, &Config::default()).unwrap();
        assert_eq!(out.mappings.max_size(), 6);
        assert!(out.mappings.iter().all(|m| m.is_valid(&TOLUENE, &PHENOL, &matchers)));
    }

    #[test]
    fn no_compatible_bonds_means_no_seeds() {
        let strict = MatcherSet::from_flags(true, false, false);
        let out = clique_mappings(&CYCLOHEXANE, &BENZENE, &strict, &Config::default()).unwrap();
        assert!(out.mappings.is_empty());
        assert_eq!(out.cliques_visited, 0);
    }

    #[test]
    fn compat_bound_is_reported() {
        let matchers = MatcherSet::default();
        let config = Config::builder().max_compat_nodes(8).build();
        let err = clique_mappings(&BENZENE, &NAPHTHALENE, &matchers, &config).unwrap_err();
        assert!(matches!(err, McsError::ResourceExceeded { .. }));
    }
}
