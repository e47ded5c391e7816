//! Search orchestration.
//!
//! The engine tries a direct subgraph-isomorphism match first. When that
//! does not settle the question it races the seed generators, merges and
//! ranks their seeds, and extends the best of them.

use std::panic::{AssertUnwindSafe, catch_unwind};

use mcs_common::{Config, DedupeMode, Graph, SearchMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::compat::MatcherSet;
use crate::error::{Advisory, McsError, Phase};
use crate::mapping::MappingSet;
use crate::mcgregor::McGregor;
use crate::seed::{CliqueSeeds, OverlapSeeds, SearchContext, SeedGenerator, SeedOutcome};
use crate::single::single_vertex_mappings;
use crate::vf::{VfGoal, VfMatcher, VfOutcome};

/// Work done by each phase of one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Steps used by the direct isomorphism attempt.
    pub vf_steps: u64,
    /// Steps used by all seed generators together.
    pub seed_steps: u64,
    /// Valid seeds proposed before deduplication.
    pub seeds_raw: usize,
    /// Seeds handed to the extension phase.
    pub seeds_retained: usize,
    /// Steps used by the extension phase.
    pub extension_steps: u64,
}

/// The answer to one search.
#[derive(Clone, Debug, Default)]
pub struct McsResult {
    /// Maximum mappings, query→target, canonically ordered.
    pub mappings: MappingSet,
    /// The maximum mapping covers every query vertex (and, when bonds are
    /// compared, every query bond).
    pub is_exact_subgraph: bool,
    /// Degradations met along the way.
    pub advisories: Vec<Advisory>,
    /// Per-phase counters.
    pub stats: SearchStats,
    max_edges: usize,
}

impl McsResult {
    /// Vertex count of the maximum mappings.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.mappings.max_size()
    }

    /// Query bonds covered by the maximum mappings.
    #[must_use]
    pub const fn max_edge_count(&self) -> usize {
        self.max_edges
    }

    /// True if a budget or bound cut the search short, so larger mappings
    /// or further tied ones may exist.
    #[must_use]
    pub fn is_heuristic(&self) -> bool {
        !self.advisories.is_empty()
    }
}

/// The common-subgraph search driver.
pub struct McsEngine {
    generators: Vec<Box<dyn SeedGenerator>>,
}

impl Default for McsEngine {
    fn default() -> Self {
        Self::with_generators(vec![Box::new(CliqueSeeds), Box::new(OverlapSeeds)])
    }
}

impl std::fmt::Debug for McsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.generators.iter().map(|g| g.name()).collect();
        f.debug_struct("McsEngine").field("generators", &names).finish()
    }
}

impl McsEngine {
    /// An engine racing the clique and overlap seed generators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine racing the given seed generators instead.
    #[must_use]
    pub fn with_generators(generators: Vec<Box<dyn SeedGenerator>>) -> Self {
        Self { generators }
    }

    /// Finds the maximum common subgraph mappings from `query` into `target`.
    ///
    /// # Errors
    ///
    /// [`McsError::InvalidInput`] when either graph has no vertices. Every
    /// other problem is absorbed and reported through
    /// [`McsResult::advisories`].
    pub fn find(
        &self,
        query: &Graph,
        target: &Graph,
        matchers: &MatcherSet,
        mode: SearchMode,
        config: &Config,
    ) -> Result<McsResult, McsError> {
        if query.is_empty() {
            return Err(McsError::invalid_input("query graph has no vertices"));
        }
        if target.is_empty() {
            return Err(McsError::invalid_input("target graph has no vertices"));
        }

        info!(
            "mcs: {:?} search, query {}/{}, target {}/{}",
            mode,
            query.vertex_count(),
            query.edge_count(),
            target.vertex_count(),
            target.edge_count()
        );

        let search = Search {
            query,
            target,
            matchers,
            config,
        };

        if query.vertex_count() == 1 || target.vertex_count() == 1 {
            debug!("mcs: single-vertex short circuit");
            let mappings = single_vertex_mappings(query, target, matchers);
            return Ok(search.finish(
                mappings,
                Vec::new(),
                SearchStats::default(),
                Phase::Isomorphism,
            ));
        }

        let mut stats = SearchStats::default();
        let mut advisories = Vec::new();

        let direct = search.direct(mode);
        stats.vf_steps = direct.as_ref().map_or(0, |run| run.steps);
        if let Some(run) = &direct {
            if run.truncated {
                warn!("mcs: direct isomorphism attempt hit the mapping cap");
                note(
                    &mut advisories,
                    Advisory::mapping_cap(Phase::Isomorphism, config.max_mappings),
                );
            }
            if run.complete && !run.timed_out {
                debug!("mcs: direct match settles the search");
                return Ok(search.finish(
                    run.mappings.clone(),
                    advisories,
                    stats,
                    Phase::Isomorphism,
                ));
            }
            if run.timed_out {
                warn!("mcs: direct isomorphism attempt ran out of steps");
                advisories.push(Advisory::TimedOut {
                    phase: Phase::Isomorphism,
                });
            }
        }

        let ctx = SearchContext {
            query,
            target,
            matchers,
            config,
        };
        let mut raw = MappingSet::default();
        for (generator, result) in self.generators.iter().zip(self.race(&ctx)) {
            match result {
                Ok(outcome) => {
                    debug!(
                        "mcs: {} proposed {} seeds of size {}",
                        generator.name(),
                        outcome.seeds.len(),
                        outcome.seeds.max_size()
                    );
                    stats.seed_steps += outcome.steps;
                    if outcome.timed_out {
                        warn!("mcs: {} seed generator ran out of steps", generator.name());
                        advisories.push(Advisory::TimedOut {
                            phase: generator.phase(),
                        });
                    }
                    if outcome.truncated {
                        warn!("mcs: {} seed generator hit the mapping cap", generator.name());
                        note(
                            &mut advisories,
                            Advisory::mapping_cap(generator.phase(), config.max_mappings),
                        );
                    }
                    raw.extend(outcome.seeds);
                }
                Err(err) => {
                    warn!("mcs: {} seed generator gave up: {}", generator.name(), err);
                    advisories.push(Advisory::from_generator(
                        generator.name(),
                        generator.phase(),
                        err,
                    ));
                }
            }
        }
        if let Some(run) = direct {
            raw.extend(run.mappings);
            raw.extend(run.partials);
        }

        let (seeds, seeds_truncated) = merge_seeds(raw, &search, &mut stats);
        debug!(
            "mcs: {} of {} seeds retained, size {}",
            stats.seeds_retained,
            stats.seeds_raw,
            seeds.max_size()
        );

        let extension = McGregor::new(query, target, matchers, config).extend_all(&seeds);
        stats.extension_steps = extension.steps;
        if extension.timed_out {
            warn!("mcs: extension ran out of steps");
            advisories.push(Advisory::TimedOut {
                phase: Phase::Extension,
            });
        }
        if seeds_truncated || extension.truncated {
            warn!("mcs: extension hit the mapping cap");
            note(
                &mut advisories,
                Advisory::mapping_cap(Phase::Extension, config.max_mappings),
            );
        }

        Ok(search.finish(extension.mappings, advisories, stats, Phase::Extension))
    }

    /// Runs every generator, concurrently when allowed, and returns their
    /// results in generator order.
    fn race(&self, ctx: &SearchContext<'_>) -> Vec<Result<SeedOutcome, McsError>> {
        let mut slots: Vec<Option<Result<SeedOutcome, McsError>>> =
            self.generators.iter().map(|_| None).collect();
        self.fill_slots(ctx, &mut slots);
        self.generators
            .iter()
            .zip(slots)
            .map(|(generator, slot)| {
                slot.unwrap_or_else(|| {
                    Err(McsError::SeedGeneratorFailure {
                        generator: generator.name().to_owned(),
                        reason: "task did not report".to_owned(),
                    })
                })
            })
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn fill_slots(
        &self,
        ctx: &SearchContext<'_>,
        slots: &mut [Option<Result<SeedOutcome, McsError>>],
    ) {
        if !ctx.config.parallel {
            self.fill_slots_sequential(ctx, slots);
            return;
        }
        rayon::scope(|s| {
            for (generator, slot) in self.generators.iter().zip(slots.iter_mut()) {
                s.spawn(move |_| *slot = Some(guarded_generate(generator.as_ref(), ctx)));
            }
        });
    }

    #[cfg(not(feature = "rayon"))]
    fn fill_slots(
        &self,
        ctx: &SearchContext<'_>,
        slots: &mut [Option<Result<SeedOutcome, McsError>>],
    ) {
        self.fill_slots_sequential(ctx, slots);
    }

    fn fill_slots_sequential(
        &self,
        ctx: &SearchContext<'_>,
        slots: &mut [Option<Result<SeedOutcome, McsError>>],
    ) {
        for (generator, slot) in self.generators.iter().zip(slots.iter_mut()) {
            *slot = Some(guarded_generate(generator.as_ref(), ctx));
        }
    }
}

/// Runs a generator, turning a panic into a [`McsError::SeedGeneratorFailure`].
fn guarded_generate(
    generator: &dyn SeedGenerator,
    ctx: &SearchContext<'_>,
) -> Result<SeedOutcome, McsError> {
    catch_unwind(AssertUnwindSafe(|| generator.generate(ctx))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panicked".to_owned());
        Err(McsError::SeedGeneratorFailure {
            generator: generator.name().to_owned(),
            reason,
        })
    })
}

/// Records `advisory` unless an equal one is already present.
fn note(advisories: &mut Vec<Advisory>, advisory: Advisory) {
    if !advisories.contains(&advisory) {
        advisories.push(advisory);
    }
}

/// Validates, deduplicates and ranks every proposed seed, keeping only the
/// largest. The flag reports seeds dropped at the mapping cap.
fn merge_seeds(
    mut raw: MappingSet,
    search: &Search<'_>,
    stats: &mut SearchStats,
) -> (MappingSet, bool) {
    raw.items
        .retain(|m| !m.is_empty() && m.is_valid(search.query, search.target, search.matchers));
    stats.seeds_raw = raw.len();
    raw.dedupe(DedupeMode::Full);
    raw.retain_largest();
    raw.sort_canonical();
    let truncated = raw.truncate(search.config.max_mappings);
    stats.seeds_retained = raw.len();
    (raw, truncated)
}

/// One direct VF-core attempt, already in the caller's orientation.
struct DirectRun {
    mappings: MappingSet,
    partials: MappingSet,
    complete: bool,
    timed_out: bool,
    truncated: bool,
    steps: u64,
}

#[derive(Clone, Copy)]
struct Search<'a> {
    query: &'a Graph,
    target: &'a Graph,
    matchers: &'a MatcherSet,
    config: &'a Config,
}

impl Search<'_> {
    /// Picks and runs the direct isomorphism attempt for `mode`, or `None`
    /// when the sizes rule it out.
    fn direct(&self, mode: SearchMode) -> Option<DirectRun> {
        let (q, t) = (self.query.vertex_count(), self.target.vertex_count());
        let forward = |goal| {
            VfMatcher::new(self.query, self.target, self.matchers, self.config)
                .with_goal(goal)
                .enumerate()
        };
        match mode {
            SearchMode::Identical if q == t => {
                Some(self.oriented(forward(VfGoal::Identical), false))
            }
            SearchMode::Identical => None,
            SearchMode::Substructure if q <= t => {
                Some(self.oriented(forward(VfGoal::Substructure), false))
            }
            SearchMode::Substructure => None,
            SearchMode::GeneralMcs if q <= t => {
                Some(self.oriented(forward(VfGoal::Substructure), false))
            }
            SearchMode::GeneralMcs => {
                let reverse = VfMatcher::new(self.target, self.query, self.matchers, self.config)
                    .reversed()
                    .enumerate();
                Some(self.oriented(reverse, true))
            }
        }
    }

    /// Brings a VF-core outcome into query→target orientation and drops any
    /// mapping that is not edge consistent from the query's side.
    fn oriented(&self, outcome: VfOutcome, transposed: bool) -> DirectRun {
        let orient = |set: MappingSet| -> MappingSet {
            set.into_iter()
                .map(|m| if transposed { m.transposed() } else { m })
                .filter(|m| m.is_valid(self.query, self.target, self.matchers))
                .collect()
        };
        let mappings = orient(outcome.mappings);
        let partials = orient(outcome.partials);
        DirectRun {
            complete: !mappings.is_empty(),
            mappings,
            partials,
            timed_out: outcome.timed_out,
            truncated: outcome.truncated,
            steps: outcome.steps,
        }
    }

    /// Final dedupe, maximum filter and verdict. A cut at the mapping cap is
    /// charged to `phase`, the phase that produced `mappings`.
    fn finish(
        &self,
        mut mappings: MappingSet,
        mut advisories: Vec<Advisory>,
        stats: SearchStats,
        phase: Phase,
    ) -> McsResult {
        mappings.dedupe(self.config.dedupe);
        mappings.retain_maximum(self.query, self.target);
        mappings.sort_canonical();
        if mappings.truncate(self.config.max_mappings) {
            warn!("mcs: final mappings hit the mapping cap");
            note(
                &mut advisories,
                Advisory::mapping_cap(phase, self.config.max_mappings),
            );
        }

        let max_edges = mappings
            .iter()
            .next()
            .map_or(0, |m| m.mapped_edge_count(self.query, self.target));
        let covers_vertices = mappings.max_size() == self.query.vertex_count();
        let covers_edges = !self.matchers.bond_sensitive() || max_edges == self.query.edge_count();
        let is_exact_subgraph = !mappings.is_empty() && covers_vertices && covers_edges;

        info!(
            "mcs: {} mappings of size {} ({} bonds), exact: {}, advisories: {}",
            mappings.len(),
            mappings.max_size(),
            max_edges,
            is_exact_subgraph,
            advisories.len()
        );

        McsResult {
            mappings,
            is_exact_subgraph,
            advisories,
            stats,
            max_edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use mcs_common::{
        Atom, AtomQuery, BENZENE, BICYCLO_OCTANE, BondOrder, CYCLOHEXANE, ETHANE, GraphBuilder,
        HYDRAZINE, METHANE, NAPHTHALENE, PHENOL, TOLUENE,
    };

    use super::*;
    use crate::test_harness::init_test_logger;

    fn strict() -> MatcherSet {
        MatcherSet::from_flags(true, false, false)
    }

    struct Panicking;

    impl SeedGenerator for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn phase(&self) -> Phase {
            Phase::Overlap
        }

        fn generate(&self, _ctx: &SearchContext<'_>) -> Result<SeedOutcome, McsError> {
            panic!("boom")
        }
    }

    #[test]
    fn empty_graph_is_invalid_input() {
        let empty = Graph::new(Vec::new(), Vec::new()).unwrap();
        let err = McsEngine::new()
            .find(&empty, &BENZENE, &strict(), SearchMode::GeneralMcs, &Config::default())
            .unwrap_err();
        assert!(matches!(err, McsError::InvalidInput(_)));
    }

    #[test]
    fn direct_match_returns_all_embeddings() {
        init_test_logger();
        let result = McsEngine::new()
            .find(
                &ETHANE,
                &BICYCLO_OCTANE,
                &strict(),
                SearchMode::Substructure,
                &Config::default(),
            )
            .unwrap();
        assert!(result.is_exact_subgraph);
        assert_eq!(result.mappings.len(), 18);
        assert_eq!(result.stats.seeds_raw, 0);
        assert!(!result.is_heuristic());
    }

    #[test]
    fn seeds_and_extension_find_shared_ring() {
        init_test_logger();
        let result = McsEngine::new()
            .find(&TOLUENE, &PHENOL, &strict(), SearchMode::GeneralMcs, &Config::default())
            .unwrap();
        assert!(!result.is_exact_subgraph);
        assert_eq!(result.max_size(), 6);
        assert_eq!(result.max_edge_count(), 6);
        assert_eq!(result.mappings.len(), 12);
        assert!(result.stats.seeds_retained > 0);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let parallel = Config::default();
        let sequential = Config::builder().parallel(false).build();
        let engine = McsEngine::new();
        let a = engine
            .find(&CYCLOHEXANE, &BENZENE, &strict(), SearchMode::GeneralMcs, &parallel)
            .unwrap();
        let b = engine
            .find(&CYCLOHEXANE, &BENZENE, &strict(), SearchMode::GeneralMcs, &sequential)
            .unwrap();
        assert_eq!(a.mappings, b.mappings);
        assert_eq!(a.max_size(), 1);
    }

    #[test]
    fn panicking_generator_becomes_advisory() {
        let engine = McsEngine::with_generators(vec![Box::new(Panicking), Box::new(OverlapSeeds)]);
        let result = engine
            .find(&TOLUENE, &PHENOL, &strict(), SearchMode::GeneralMcs, &Config::default())
            .unwrap();
        assert_eq!(result.max_size(), 6);
        assert!(result.is_heuristic());
        assert!(result.advisories.iter().any(|a| matches!(
            a,
            Advisory::SeedGeneratorFailed { generator, reason }
                if generator == "panicking" && reason == "boom"
        )));
    }

    #[test]
    fn compat_bound_degrades_to_overlap_seeds() {
        let config = Config::builder().max_compat_nodes(4).build();
        let result = McsEngine::new()
            .find(&TOLUENE, &PHENOL, &strict(), SearchMode::GeneralMcs, &config)
            .unwrap();
        assert_eq!(result.max_size(), 6);
        assert!(result.advisories.iter().any(|a| matches!(
            a,
            Advisory::ResourceExceeded {
                phase: Phase::Clique,
                ..
            }
        )));
    }

    #[test]
    fn larger_query_is_searched_in_reverse() {
        let result = McsEngine::new()
            .find(&NAPHTHALENE, &BENZENE, &strict(), SearchMode::GeneralMcs, &Config::default())
            .unwrap();
        assert_eq!(result.max_size(), 6);
        assert_eq!(result.mappings.len(), 24);
        assert!(!result.is_exact_subgraph);
        for m in &result.mappings {
            assert!(m.is_valid(&NAPHTHALENE, &BENZENE, &strict()));
        }
    }

    #[test]
    fn single_vertex_short_circuits() {
        let result = McsEngine::new()
            .find(&METHANE, &BENZENE, &strict(), SearchMode::Substructure, &Config::default())
            .unwrap();
        assert!(result.is_exact_subgraph);
        assert_eq!(result.mappings.len(), 6);
        assert_eq!(result.stats, SearchStats::default());
    }

    #[test]
    fn disjoint_labels_give_nothing() {
        let result = McsEngine::new()
            .find(&ETHANE, &HYDRAZINE, &strict(), SearchMode::GeneralMcs, &Config::default())
            .unwrap();
        assert!(result.mappings.is_empty());
        assert_eq!(result.max_size(), 0);
        assert!(!result.is_exact_subgraph);
    }

    #[test]
    fn query_constraints_survive_the_reverse_search() {
        init_test_logger();
        // C-C-X with X written as nitrogen but constrained to carbon
        let mut b = GraphBuilder::new();
        b.element("C");
        b.element("C");
        b.atom(Atom::new("N").with_query(AtomQuery {
            elements: vec!["C".into()],
            ..AtomQuery::default()
        }));
        b.bond(0, 1, BondOrder::Single);
        b.bond(1, 2, BondOrder::Single);
        let path = b.build().unwrap();

        let matchers = MatcherSet::query();
        let result = McsEngine::new()
            .find(&path, &ETHANE, &matchers, SearchMode::GeneralMcs, &Config::default())
            .unwrap();
        assert_eq!(result.max_size(), 2);
        assert_eq!(result.mappings.len(), 4);
        assert!(result.mappings.iter().any(|m| m.target_of(2).is_some()));
        assert!(result.advisories.is_empty());
        for m in &result.mappings {
            assert!(m.is_valid(&path, &ETHANE, &matchers));
        }
    }

    #[test]
    fn direct_match_reports_the_mapping_cap() {
        let config = Config::builder().max_mappings(2).build();
        let result = McsEngine::new()
            .find(&ETHANE, &BICYCLO_OCTANE, &strict(), SearchMode::Substructure, &config)
            .unwrap();
        assert!(result.is_exact_subgraph);
        assert_eq!(result.mappings.len(), 2);
        assert!(result.is_heuristic());
        assert_eq!(
            result.advisories,
            vec![Advisory::mapping_cap(Phase::Isomorphism, 2)]
        );
    }

    #[test]
    fn seeded_ties_report_the_mapping_cap() {
        // twelve tied ring mappings, two allowed
        let config = Config::builder().max_mappings(2).build();
        let result = McsEngine::new()
            .find(&TOLUENE, &PHENOL, &strict(), SearchMode::GeneralMcs, &config)
            .unwrap();
        assert_eq!(result.max_size(), 6);
        assert_eq!(result.mappings.len(), 2);
        assert!(result.is_heuristic());
        assert!(
            result
                .advisories
                .iter()
                .all(|a| matches!(a, Advisory::ResourceExceeded { .. }))
        );
    }
}
