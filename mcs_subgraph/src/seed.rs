//! Seed generators raced by the engine.
//!
//! A seed generator proposes starting mappings for the extension phase.
//! Generators only read the shared [`SearchContext`]; each returns its own
//! [`SeedOutcome`] and the engine merges them after the join.

use std::collections::VecDeque;

use mcs_common::{Config, Graph};
use tracing::debug;

use crate::budget::StepBudget;
use crate::compat::MatcherSet;
use crate::error::{McsError, Phase};
use crate::koch;
use crate::mapping::{Mapping, MappingSet};

/// Everything a generator may look at.
#[derive(Clone, Copy, Debug)]
pub struct SearchContext<'a> {
    /// Query graph.
    pub query: &'a Graph,
    /// Target graph.
    pub target: &'a Graph,
    /// Matchers selected for this search.
    pub matchers: &'a MatcherSet,
    /// Search configuration.
    pub config: &'a Config,
}

/// Seeds returned by one generator.
#[derive(Clone, Debug, Default)]
pub struct SeedOutcome {
    /// Proposed mappings, query→target.
    pub seeds: MappingSet,
    /// The generator stopped at its step budget.
    pub timed_out: bool,
    /// Tied seeds beyond `config.max_mappings` were dropped.
    pub truncated: bool,
    /// Steps consumed.
    pub steps: u64,
}

/// A source of seed mappings.
pub trait SeedGenerator: Send + Sync {
    /// Short name used in logs and advisories.
    fn name(&self) -> &'static str;

    /// Phase reported in advisories raised by this generator.
    fn phase(&self) -> Phase;

    /// Proposes seeds for the given search.
    ///
    /// # Errors
    ///
    /// Any [`McsError`]; the engine records it as an advisory and carries on
    /// without this generator's seeds.
    fn generate(&self, ctx: &SearchContext<'_>) -> Result<SeedOutcome, McsError>;
}

/// Seeds from the maximum cliques of the edge-pair compatibility graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct CliqueSeeds;

impl SeedGenerator for CliqueSeeds {
    fn name(&self) -> &'static str {
        "clique"
    }

    fn phase(&self) -> Phase {
        Phase::Clique
    }

    fn generate(&self, ctx: &SearchContext<'_>) -> Result<SeedOutcome, McsError> {
        let outcome = koch::clique_mappings(ctx.query, ctx.target, ctx.matchers, ctx.config)?;
        Ok(SeedOutcome {
            seeds: outcome.mappings,
            timed_out: outcome.timed_out,
            truncated: outcome.truncated,
            steps: outcome.steps,
        })
    }
}

/// Greedy overlap seeds.
///
/// Every compatible (query vertex, target vertex) pair is used as an anchor
/// and grown breadth-first: each newly mapped query vertex takes the first
/// free compatible target neighbor for each of its unmapped neighbors. The
/// largest grown mappings are kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlapSeeds;

impl SeedGenerator for OverlapSeeds {
    fn name(&self) -> &'static str {
        "overlap"
    }

    fn phase(&self) -> Phase {
        Phase::Overlap
    }

    fn generate(&self, ctx: &SearchContext<'_>) -> Result<SeedOutcome, McsError> {
        let budget = StepBudget::from_config(ctx.config);
        let mut seeds = MappingSet::default();
        let mut best = 0usize;
        let mut truncated = false;

        'anchors: for q in 0..ctx.query.vertex_count() {
            for t in 0..ctx.target.vertex_count() {
                if !budget.tick() {
                    break 'anchors;
                }
                if !ctx.matchers.vertices(ctx.query, q, ctx.target, t) {
                    continue;
                }
                let grown = grow_from_anchor(ctx, q, t);
                if grown.len() > best {
                    best = grown.len();
                    seeds.items.clear();
                    truncated = false;
                }
                if grown.len() < best || seeds.items.contains(&grown) {
                    continue;
                }
                if seeds.len() < ctx.config.max_mappings {
                    seeds.push(grown);
                } else {
                    truncated = true;
                }
            }
        }

        seeds.sort_canonical();
        debug!(
            "overlap: {} seeds of size {}{}",
            seeds.len(),
            best,
            if budget.is_exhausted() { " (timed out)" } else { "" }
        );
        Ok(SeedOutcome {
            seeds,
            timed_out: budget.is_exhausted(),
            truncated,
            steps: budget.used(),
        })
    }
}

fn grow_from_anchor(ctx: &SearchContext<'_>, anchor_q: usize, anchor_t: usize) -> Mapping {
    let (query, target) = (ctx.query, ctx.target);
    let mut mapping = Mapping::new();
    mapping.assign(anchor_q, anchor_t);
    let mut queue = VecDeque::from([anchor_q]);

    while let Some(q) = queue.pop_front() {
        let Some(t) = mapping.target_of(q) else {
            continue;
        };
        for &(qn, _) in query.incident(q) {
            if mapping.contains_query(qn) {
                continue;
            }
            let image = target.neighbors(t).find(|&tn| {
                mapping.is_target_free(tn)
                    && ctx.matchers.vertices(query, qn, target, tn)
                    && consistent_with(ctx, &mapping, qn, tn)
            });
            if let Some(tn) = image {
                mapping.assign(qn, tn);
                queue.push_back(qn);
            }
        }
    }
    mapping
}

/// Every query bond from `q` to a mapped vertex has a compatible target bond.
fn consistent_with(ctx: &SearchContext<'_>, mapping: &Mapping, q: usize, t: usize) -> bool {
    ctx.query.incident(q).iter().all(|&(n, qe)| {
        mapping.target_of(n).is_none_or(|tn| {
            ctx.target
                .edge_between(t, tn)
                .is_some_and(|te| ctx.matchers.edges(ctx.query, qe, ctx.target, te))
        })
    })
}

#[cfg(test)]
mod tests {
    use mcs_common::{BENZENE, CYCLOHEXANE, ETHANE, HYDRAZINE, NAPHTHALENE, PHENOL, TOLUENE};

    use super::*;

    fn ctx<'a>(
        query: &'a Graph,
        target: &'a Graph,
        matchers: &'a MatcherSet,
        config: &'a Config,
    ) -> SearchContext<'a> {
        SearchContext {
            query,
            target,
            matchers,
            config,
        }
    }

    #[test]
    fn overlap_finds_the_ring() {
        let (matchers, config) = (MatcherSet::default(), Config::default());
        let out = OverlapSeeds
            .generate(&ctx(&TOLUENE, &PHENOL, &matchers, &config))
            .unwrap();
        assert_eq!(out.seeds.max_size(), 6);
        assert!(out.seeds.iter().all(|m| m.is_valid(&TOLUENE, &PHENOL, &matchers)));
    }

    #[test]
    fn overlap_keeps_single_atoms_when_bonds_differ() {
        let matchers = MatcherSet::from_flags(true, false, false);
        let config = Config::default();
        let out = OverlapSeeds
            .generate(&ctx(&CYCLOHEXANE, &BENZENE, &matchers, &config))
            .unwrap();
        assert_eq!(out.seeds.len(), 36);
        assert_eq!(out.seeds.max_size(), 1);
        assert!(!out.truncated);
    }

    #[test]
    fn overlap_reports_dropped_ties() {
        let matchers = MatcherSet::from_flags(true, false, false);
        let config = Config::builder().max_mappings(5).build();
        let out = OverlapSeeds
            .generate(&ctx(&CYCLOHEXANE, &BENZENE, &matchers, &config))
            .unwrap();
        assert_eq!(out.seeds.len(), 5);
        assert!(out.truncated);
    }

    #[test]
    fn repeated_growth_is_not_counted_against_the_cap() {
        // 36 anchors grow into at most 12 distinct ring mappings
        let (matchers, config) = (
            MatcherSet::default(),
            Config::builder().max_mappings(12).build(),
        );
        let out = OverlapSeeds
            .generate(&ctx(&BENZENE, &BENZENE, &matchers, &config))
            .unwrap();
        assert_eq!(out.seeds.max_size(), 6);
        assert!(!out.truncated);
    }

    #[test]
    fn disjoint_labels_give_no_seeds() {
        let (matchers, config) = (MatcherSet::default(), Config::default());
        let overlap = OverlapSeeds
            .generate(&ctx(&ETHANE, &HYDRAZINE, &matchers, &config))
            .unwrap();
        let clique = CliqueSeeds
            .generate(&ctx(&ETHANE, &HYDRAZINE, &matchers, &config))
            .unwrap();
        assert!(overlap.seeds.is_empty());
        assert!(clique.seeds.is_empty());
    }

    #[test]
    fn clique_seeds_are_valid() {
        let (matchers, config) = (MatcherSet::default(), Config::default());
        let out = CliqueSeeds
            .generate(&ctx(&BENZENE, &NAPHTHALENE, &matchers, &config))
            .unwrap();
        assert_eq!(out.seeds.max_size(), 6);
        assert!(out.seeds.iter().all(|m| m.is_valid(&BENZENE, &NAPHTHALENE, &matchers)));
    }

    #[test]
    fn generators_are_named() {
        assert_eq!(CliqueSeeds.name(), "clique");
        assert_eq!(OverlapSeeds.name(), "overlap");
        assert_eq!(CliqueSeeds.phase(), Phase::Clique);
    }
}
