//! VF-style subgraph isomorphism.
//!
//! A depth-first search extends a partial mapping one query vertex at a
//! time, in a rarest-first, connectivity-driven order. Candidates
//! for a vertex are the target vertices adjacent to the images of all its
//! already-mapped neighbors (any target vertex for the first vertex of a
//! component), filtered by degree, vertex compatibility and edge
//! feasibility against every mapped neighbor.

mod order;
mod state;

use std::collections::HashSet;
use std::ops::ControlFlow;

use mcs_common::{Config, Graph};
use tracing::{debug, trace};

use crate::budget::StepBudget;
use crate::compat::MatcherSet;
use crate::error::{McsError, Phase};
use crate::mapping::{Mapping, MappingSet};
use crate::utils::intersect_sets;

use order::rarest_first_order;
use state::{VfState, with_mapping};

/// What counts as success for a VF-core run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VfGoal {
    /// Every query vertex is mapped.
    #[default]
    Substructure,
    /// Every query vertex is mapped and both graphs have the same size.
    Identical,
}

/// The result of one VF-core run.
#[derive(Clone, Debug, Default)]
pub struct VfOutcome {
    /// Complete embeddings, canonically sorted.
    pub mappings: MappingSet,
    /// Largest dead-end mappings, filled only when no embedding was found.
    pub partials: MappingSet,
    /// The step budget ran out before the search space was exhausted.
    pub timed_out: bool,
    /// More embeddings exist than `config.max_mappings`.
    pub truncated: bool,
    /// Steps consumed.
    pub steps: u64,
}

impl VfOutcome {
    /// True if at least one complete embedding was found.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        !self.mappings.is_empty()
    }
}

/// Backtracking subgraph-isomorphism matcher.
#[derive(Clone, Copy, Debug)]
pub struct VfMatcher<'a> {
    query: &'a Graph,
    target: &'a Graph,
    matchers: &'a MatcherSet,
    config: &'a Config,
    goal: VfGoal,
    reversed: bool,
}

impl<'a> VfMatcher<'a> {
    /// A substructure matcher of `query` into `target`.
    #[must_use]
    pub const fn new(
        query: &'a Graph,
        target: &'a Graph,
        matchers: &'a MatcherSet,
        config: &'a Config,
    ) -> Self {
        Self {
            query,
            target,
            matchers,
            config,
            goal: VfGoal::Substructure,
            reversed: false,
        }
    }

    /// Evaluates the matchers with the graphs' roles swapped.
    ///
    /// Used when the caller's query is searched for inside its own target:
    /// `query` here holds the caller's target, and query-side constraints
    /// still come from the caller's query.
    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Changes the success condition.
    #[must_use]
    pub const fn with_goal(mut self, goal: VfGoal) -> Self {
        self.goal = goal;
        self
    }

    /// Whether the query embeds at all. Stops at the first embedding.
    ///
    /// # Errors
    ///
    /// [`McsError::TimedOut`] when the step budget runs out before a verdict.
    pub fn is_subgraph(&self) -> Result<bool, McsError> {
        let outcome = self.run(1);
        if outcome.is_match() {
            Ok(true)
        } else if outcome.timed_out {
            Err(McsError::TimedOut {
                phase: Phase::Isomorphism,
            })
        } else {
            Ok(false)
        }
    }

    /// All embeddings up to `config.max_mappings`.
    ///
    /// The search looks for one embedding past the cap so that
    /// [`VfOutcome::truncated`] only reports embeddings that were really dropped.
    #[must_use]
    pub fn enumerate(&self) -> VfOutcome {
        let cap = self.config.max_mappings.max(1);
        let mut outcome = self.run(cap.saturating_add(1));
        outcome.truncated = outcome.mappings.truncate(cap);
        outcome
    }

    fn sizes_admissible(&self) -> bool {
        let (q, t) = (self.query, self.target);
        match self.goal {
            VfGoal::Substructure => q.vertex_count() <= t.vertex_count(),
            VfGoal::Identical => {
                q.vertex_count() == t.vertex_count() && q.edge_count() == t.edge_count()
            }
        }
    }

    fn run(&self, limit: usize) -> VfOutcome {
        if self.query.is_empty() {
            return VfOutcome {
                mappings: MappingSet::new(vec![Mapping::new()]),
                ..VfOutcome::default()
            };
        }
        if !self.sizes_admissible() {
            debug!(
                "vf: {:?} impossible for {}/{} into {}/{}",
                self.goal,
                self.query.vertex_count(),
                self.query.edge_count(),
                self.target.vertex_count(),
                self.target.edge_count()
            );
            return VfOutcome::default();
        }

        let rules = Rules {
            query: self.query,
            target: self.target,
            matchers: self.matchers,
            reversed: self.reversed,
        };
        let search = VfSearch {
            query: self.query,
            target: self.target,
            rules,
            induced: self.config.induced,
            exact_degree: self.goal == VfGoal::Identical,
            order: rarest_first_order(self.query, self.target, |q, t| rules.vertices(q, t)),
            budget: StepBudget::from_config(self.config),
            limit: limit.max(1),
        };

        let mut st = VfState::new();
        // A break only comes from the budget or the match limit.
        let _ = search.backtrack(&mut st, 0);

        let timed_out = search.budget.is_exhausted();
        let steps = search.budget.used();
        let (mut mappings, mut partials) = st.into_sets();
        if !mappings.is_empty() {
            partials = MappingSet::default();
        }
        mappings.sort_canonical();
        partials.sort_canonical();

        debug!(
            "vf: {} embeddings, {} partials of size {}, {} steps{}",
            mappings.len(),
            partials.len(),
            partials.max_size(),
            steps,
            if timed_out { " (timed out)" } else { "" }
        );

        VfOutcome {
            mappings,
            partials,
            timed_out,
            truncated: false,
            steps,
        }
    }
}

/// Matcher evaluation in the caller's orientation.
#[derive(Clone, Copy)]
struct Rules<'a> {
    query: &'a Graph,
    target: &'a Graph,
    matchers: &'a MatcherSet,
    reversed: bool,
}

impl Rules<'_> {
    fn vertices(&self, q: usize, t: usize) -> bool {
        if self.reversed {
            self.matchers.vertices(self.target, t, self.query, q)
        } else {
            self.matchers.vertices(self.query, q, self.target, t)
        }
    }

    fn edges(&self, qe: usize, te: usize) -> bool {
        if self.reversed {
            self.matchers.edges(self.target, te, self.query, qe)
        } else {
            self.matchers.edges(self.query, qe, self.target, te)
        }
    }
}

struct VfSearch<'a> {
    query: &'a Graph,
    target: &'a Graph,
    rules: Rules<'a>,
    induced: bool,
    exact_degree: bool,
    order: Vec<usize>,
    budget: StepBudget,
    limit: usize,
}

impl VfSearch<'_> {
    fn backtrack(&self, st: &mut VfState, depth: usize) -> ControlFlow<()> {
        let Some(&next_q) = self.order.get(depth) else {
            st.record_match();
            return if st.found_count() >= self.limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            };
        };

        if !self.budget.tick() {
            st.record_dead_end();
            return ControlFlow::Break(());
        }

        let candidates = self.candidates(next_q, &st.mapping);
        if candidates.is_empty() {
            trace!("vf: dead end at depth {} (query vertex {})", depth, next_q);
            st.record_dead_end();
            return ControlFlow::Continue(());
        }

        for t in candidates {
            with_mapping(st, next_q, t, |st_inner| self.backtrack(st_inner, depth + 1))?;
        }
        ControlFlow::Continue(())
    }

    fn candidates(&self, q: usize, mapping: &Mapping) -> Vec<usize> {
        let mapped_neighbors: Vec<usize> = self
            .query
            .neighbors(q)
            .filter_map(|n| mapping.target_of(n))
            .collect();

        let pool: Vec<usize> = if mapped_neighbors.is_empty() {
            (0..self.target.vertex_count()).collect()
        } else {
            let neighbor_sets: Vec<HashSet<usize>> = mapped_neighbors
                .iter()
                .map(|&t| self.target.neighbors(t).collect())
                .collect();
            let mut common: Vec<usize> = intersect_sets(neighbor_sets).into_iter().collect();
            common.sort_unstable();
            common
        };

        pool.into_iter()
            .filter(|&t| mapping.is_target_free(t))
            .filter(|&t| self.degree_admissible(q, t))
            .filter(|&t| self.rules.vertices(q, t))
            .filter(|&t| self.edges_feasible(q, t, mapping))
            .filter(|&t| !self.induced || self.no_extra_edges(q, t, mapping))
            .collect()
    }

    fn degree_admissible(&self, q: usize, t: usize) -> bool {
        let (dq, dt) = (self.query.degree(q), self.target.degree(t));
        if self.exact_degree { dq == dt } else { dq <= dt }
    }

    /// Every query edge from `q` to a mapped vertex has a compatible target edge.
    fn edges_feasible(&self, q: usize, t: usize, mapping: &Mapping) -> bool {
        self.query.incident(q).iter().all(|&(n, qe)| {
            mapping.target_of(n).is_none_or(|tn| {
                self.target
                    .edge_between(t, tn)
                    .is_some_and(|te| self.rules.edges(qe, te))
            })
        })
    }

    /// No target edge from `t` reaches the image of a query vertex not adjacent to `q`.
    fn no_extra_edges(&self, q: usize, t: usize, mapping: &Mapping) -> bool {
        self.target
            .neighbors(t)
            .all(|tn| mapping.query_of(tn).is_none_or(|n| self.query.adjacent(q, n)))
    }
}

#[cfg(test)]
mod tests {
    use mcs_common::{
        Atom, AtomQuery, BENZENE, BICYCLO_OCTANE, BondOrder, CYCLOHEXANE, ETHANE, GraphBuilder,
        HYDRAZINE, NAPHTHALENE, PHENOL, PROPANE, TOLUENE,
    };

    use super::*;
    use crate::test_harness::init_test_logger;

    fn strict() -> MatcherSet {
        MatcherSet::from_flags(true, false, false)
    }

    #[test]
    fn ethane_embeds_eighteen_ways() {
        init_test_logger();
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&ETHANE, &BICYCLO_OCTANE, &matchers, &config).enumerate();
        assert_eq!(outcome.mappings.len(), 18);
        assert!(!outcome.timed_out);
        assert!(outcome.partials.is_empty());
    }

    #[test]
    fn naphthalene_has_four_automorphisms() {
        init_test_logger();
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&NAPHTHALENE, &NAPHTHALENE, &matchers, &config)
            .with_goal(VfGoal::Identical)
            .enumerate();
        assert_eq!(outcome.mappings.len(), 4);
        for m in &outcome.mappings {
            assert!(m.is_valid(&NAPHTHALENE, &NAPHTHALENE, &matchers));
            assert_eq!(m.mapped_edge_count(&NAPHTHALENE, &NAPHTHALENE), 11);
        }
    }

    #[test]
    fn identical_rejects_size_mismatch() {
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&BENZENE, &NAPHTHALENE, &matchers, &config)
            .with_goal(VfGoal::Identical)
            .enumerate();
        assert!(!outcome.is_match());
    }

    #[test]
    fn empty_query_matches_trivially() {
        let empty = Graph::new(Vec::new(), Vec::new()).unwrap();
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&empty, &BENZENE, &matchers, &config).enumerate();
        assert_eq!(outcome.mappings.len(), 1);
        assert!(outcome.mappings.items[0].is_empty());
    }

    #[test]
    fn larger_query_never_matches() {
        let config = Config::default();
        let matchers = strict();
        let vf = VfMatcher::new(&NAPHTHALENE, &BENZENE, &matchers, &config);
        assert_eq!(vf.is_subgraph(), Ok(false));
        assert!(vf.enumerate().partials.is_empty());
    }

    #[test]
    fn bond_order_blocks_cyclohexane_but_keeps_partials() {
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&CYCLOHEXANE, &BENZENE, &matchers, &config).enumerate();
        assert!(!outcome.is_match());
        assert_eq!(outcome.partials.max_size(), 1);
        assert_eq!(outcome.partials.len(), 6);

        let loose = MatcherSet::from_flags(false, false, false);
        let vf = VfMatcher::new(&CYCLOHEXANE, &BENZENE, &loose, &config);
        assert_eq!(vf.is_subgraph(), Ok(true));
        assert_eq!(vf.enumerate().mappings.len(), 12);
    }

    #[test]
    fn toluene_partials_cover_the_ring() {
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&TOLUENE, &PHENOL, &matchers, &config).enumerate();
        assert!(!outcome.is_match());
        assert_eq!(outcome.partials.max_size(), 6);
        assert_eq!(outcome.partials.len(), 2);
        assert!(outcome.partials.iter().all(|m| m.is_valid(&TOLUENE, &PHENOL, &matchers)));
    }

    #[test]
    fn induced_mode_rejects_closed_paths() {
        let mut b = GraphBuilder::new();
        let ring = b.chain("C", 3, BondOrder::Single);
        b.ring(&ring, BondOrder::Single);
        let cyclopropane = b.build().unwrap();

        let matchers = MatcherSet::from_flags(false, false, false);
        let loose = Config::default();
        let induced = Config::builder().induced(true).build();
        let open = VfMatcher::new(&PROPANE, &cyclopropane, &matchers, &loose).enumerate();
        assert_eq!(open.mappings.len(), 6);
        let closed = VfMatcher::new(&PROPANE, &cyclopropane, &matchers, &induced).enumerate();
        assert!(!closed.is_match());

        let ring6 = VfMatcher::new(&PROPANE, &BENZENE, &matchers, &induced).enumerate();
        assert_eq!(ring6.mappings.len(), 12);
        assert!(ring6.mappings.iter().all(|m| m.is_induced(&PROPANE, &BENZENE)));
    }

    #[test]
    fn disjoint_labels_have_no_partials() {
        let config = Config::default();
        let matchers = strict();
        let outcome = VfMatcher::new(&ETHANE, &HYDRAZINE, &matchers, &config).enumerate();
        assert!(!outcome.is_match());
        assert!(outcome.partials.is_empty());
    }

    #[test]
    fn exhausted_budget_times_out_with_partials() {
        let config = Config::builder().step_budget(3).build();
        let matchers = strict();
        let outcome = VfMatcher::new(&TOLUENE, &PHENOL, &matchers, &config).enumerate();
        assert!(outcome.timed_out);
        assert!(!outcome.partials.is_empty());
        let vf = VfMatcher::new(&BENZENE, &NAPHTHALENE, &matchers, &config);
        assert_eq!(
            vf.is_subgraph(),
            Err(McsError::TimedOut {
                phase: Phase::Isomorphism
            })
        );
    }

    /// C-C-X where X is written as nitrogen but constrained to carbon.
    fn carbon_query_path() -> Graph {
        let mut b = GraphBuilder::new();
        b.element("C");
        b.element("C");
        b.atom(Atom::new("N").with_query(AtomQuery {
            elements: vec!["C".into()],
            ..AtomQuery::default()
        }));
        b.bond(0, 1, BondOrder::Single);
        b.bond(1, 2, BondOrder::Single);
        b.build().unwrap()
    }

    #[test]
    fn reversed_search_keeps_query_constraints_on_the_caller_side() {
        init_test_logger();
        let path = carbon_query_path();
        let config = Config::default();
        let matchers = MatcherSet::query();

        let plain = VfMatcher::new(&ETHANE, &path, &matchers, &config).enumerate();
        assert_eq!(plain.mappings.len(), 2);

        let reversed = VfMatcher::new(&ETHANE, &path, &matchers, &config)
            .reversed()
            .enumerate();
        assert_eq!(reversed.mappings.len(), 4);
        for m in &reversed.mappings {
            assert!(m.transposed().is_valid(&path, &ETHANE, &matchers));
        }
    }

    #[test]
    fn enumeration_reports_the_mapping_cap() {
        let matchers = strict();
        let capped = Config::builder().max_mappings(2).build();
        let outcome = VfMatcher::new(&ETHANE, &BICYCLO_OCTANE, &matchers, &capped).enumerate();
        assert_eq!(outcome.mappings.len(), 2);
        assert!(outcome.truncated);

        let exact = Config::builder().max_mappings(18).build();
        let outcome = VfMatcher::new(&ETHANE, &BICYCLO_OCTANE, &matchers, &exact).enumerate();
        assert_eq!(outcome.mappings.len(), 18);
        assert!(!outcome.truncated);
    }
}
