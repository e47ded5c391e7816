//! End-to-end tests for the common-subgraph engine.


use itertools::Itertools;
use mcs_common::{
    ALL_TEST_CASES, BENZENE, CYCLOHEXANE, NAPHTHALENE, PHENOL, TOLUENE, test_case,
};
use mcs_subgraph::{
    Advisory, BondOrder, Config, DedupeMode, Graph, GraphBuilder, McsEngine, McsError, MatcherSet,
    Phase, SearchContext, SearchMode, SeedGenerator, SeedOutcome, find_mcs,
};
use rstest::rstest;
use shared_harness::{assert_all_valid, check_case, init_test_logger, run_case};

lazy_static::lazy_static! {
    /// Two benzene rings joined by a single bond.
    static ref BIPHENYL: Graph = {
        let mut b = GraphBuilder::new();
        let left = b.aromatic_ring("C", 6);
        let right = b.aromatic_ring("C", 6);
        b.bond(left[0], right[0], BondOrder::Single);
        b.build().unwrap()
    };
}

#[rstest]
#[case::ethane_in_bicyclo_octane("ethane_in_bicyclo_octane")]
#[case::benzene_in_naphthalene("benzene_in_naphthalene")]
#[case::benzene_in_naphthalene_target_sets("benzene_in_naphthalene_target_sets")]
#[case::naphthalene_self("naphthalene_self")]
#[case::benzene_self("benzene_self")]
#[case::toluene_phenol_mcs("toluene_phenol_mcs")]
#[case::naphthalene_onto_benzene("naphthalene_onto_benzene")]
#[case::disjoint_labels("disjoint_labels")]
#[case::methane_in_benzene("methane_in_benzene")]
#[case::cyclohexane_benzene_bond_sensitive("cyclohexane_benzene_bond_sensitive")]
#[case::cyclohexane_benzene_bond_insensitive("cyclohexane_benzene_bond_insensitive")]
#[case::azine_query_in_pyridine("azine_query_in_pyridine")]
fn shared_case(#[case] name: &str) {
    init_test_logger();
    let tc = test_case(name).unwrap_or_else(|| panic!("unknown test case {name}"));
    let result = run_case(tc).unwrap();
    if let Err(msg) = check_case(tc, &result) {
        panic!("{msg}");
    }
}

#[test]
fn every_shared_case_passes_sequentially() {
    init_test_logger();
    let failures: Vec<String> = ALL_TEST_CASES
        .iter()
        .filter_map(|tc| {
            let mut tc = tc.clone();
            tc.config.parallel = false;
            match run_case(&tc) {
                Ok(result) => check_case(&tc, &result).err(),
                Err(e) => Some(format!("'{}': {e}", tc.name)),
            }
        })
        .collect();
    assert!(failures.is_empty(), "failures: {failures:#?}");
}

#[rstest]
#[case::all_pairs(DedupeMode::Full, 24)]
#[case::target_sets(DedupeMode::TargetSet, 2)]
fn benzene_in_biphenyl(#[case] dedupe: DedupeMode, #[case] expected: usize) {
    init_test_logger();
    let matchers = MatcherSet::default();
    let config = Config::builder().dedupe(dedupe).build();
    let result = McsEngine::default()
        .find(&BENZENE, &BIPHENYL, &matchers, SearchMode::Substructure, &config)
        .unwrap();
    assert!(result.is_exact_subgraph);
    assert_eq!(result.mappings.len(), expected);
    assert_all_valid(&BENZENE, &BIPHENYL, &matchers, &result);
}

#[test]
fn benzene_fits_each_naphthalene_ring_twelve_ways() {
    init_test_logger();
    let matchers = MatcherSet::default();
    let result = McsEngine::default()
        .find(
            &BENZENE,
            &NAPHTHALENE,
            &matchers,
            SearchMode::Substructure,
            &Config::default(),
        )
        .unwrap();
    assert!(result.is_exact_subgraph);
    let per_ring = result.mappings.iter().counts_by(|m| m.target_signature());
    assert_eq!(per_ring.len(), 2);
    assert!(per_ring.values().all(|&n| n == 12), "{per_ring:?}");
    assert_all_valid(&BENZENE, &NAPHTHALENE, &matchers, &result);
}

#[test]
fn mcs_is_symmetric_in_size() {
    let matchers = MatcherSet::default();
    let config = Config::default();
    let engine = McsEngine::default();
    let forward = engine
        .find(&TOLUENE, &PHENOL, &matchers, SearchMode::GeneralMcs, &config)
        .unwrap();
    let reverse = engine
        .find(&PHENOL, &TOLUENE, &matchers, SearchMode::GeneralMcs, &config)
        .unwrap();
    assert_eq!(forward.max_size(), reverse.max_size());
    assert_eq!(forward.max_edge_count(), reverse.max_edge_count());
    assert_eq!(forward.mappings.len(), reverse.mappings.len());
}

#[test]
fn empty_query_is_rejected() {
    let empty = GraphBuilder::new().build().unwrap();
    let err = find_mcs(
        &empty,
        &BENZENE,
        mcs_subgraph::VertexMatcher::Element,
        mcs_subgraph::EdgeMatcher::Order,
        SearchMode::GeneralMcs,
        &Config::default(),
    )
    .unwrap_err();
    assert!(matches!(err, McsError::InvalidInput(_)));
}

struct Failing;

impl SeedGenerator for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn phase(&self) -> Phase {
        Phase::Overlap
    }

    fn generate(&self, _ctx: &SearchContext<'_>) -> Result<SeedOutcome, McsError> {
        Err(McsError::invalid_input("refuses to run"))
    }
}

#[test]
fn failing_generator_is_reported_not_fatal() {
    init_test_logger();
    let engine = McsEngine::with_generators(vec![
        Box::new(Failing),
        Box::new(mcs_subgraph::CliqueSeeds),
    ]);
    let matchers = MatcherSet::default();
    let result = engine
        .find(&TOLUENE, &PHENOL, &matchers, SearchMode::GeneralMcs, &Config::default())
        .unwrap();
    assert_eq!(result.max_size(), 6);
    assert_all_valid(&TOLUENE, &PHENOL, &matchers, &result);
    assert!(result.is_heuristic());
    assert!(result.advisories.iter().any(|a| matches!(
        a,
        Advisory::SeedGeneratorFailed { generator, .. } if generator == "failing"
    )));
}

#[test]
fn no_generators_still_extends_vf_partials() {
    let engine = McsEngine::with_generators(Vec::new());
    let matchers = MatcherSet::default();
    let result = engine
        .find(&TOLUENE, &PHENOL, &matchers, SearchMode::GeneralMcs, &Config::default())
        .unwrap();
    assert_eq!(result.max_size(), 6);
    assert!(result.advisories.is_empty());
}

#[test]
fn tiny_budget_degrades_gracefully() {
    init_test_logger();
    let matchers = MatcherSet::default();
    let config = Config::builder().step_budget(4).build();
    let result = McsEngine::default()
        .find(&NAPHTHALENE, &TOLUENE, &matchers, SearchMode::GeneralMcs, &config)
        .unwrap();
    assert!(result.is_heuristic());
    assert!(
        result
            .advisories
            .iter()
            .all(|a| matches!(a, Advisory::TimedOut { .. }))
    );
    assert_all_valid(&NAPHTHALENE, &TOLUENE, &matchers, &result);
}

#[test]
fn substructure_mode_falls_back_to_mcs() {
    let matchers = MatcherSet::from_flags(true, false, false);
    let result = McsEngine::default()
        .find(
            &CYCLOHEXANE,
            &BENZENE,
            &matchers,
            SearchMode::Substructure,
            &Config::default(),
        )
        .unwrap();
    assert!(!result.is_exact_subgraph);
    assert_eq!(result.max_size(), 1);
}

#[test]
fn result_counters_are_filled() {
    let result = McsEngine::default()
        .find(
            &TOLUENE,
            &PHENOL,
            &MatcherSet::default(),
            SearchMode::GeneralMcs,
            &Config::default(),
        )
        .unwrap();
    assert!(result.stats.vf_steps > 0);
    assert!(result.stats.seed_steps > 0);
    assert!(result.stats.seeds_raw >= result.stats.seeds_retained);
    assert!(result.stats.extension_steps > 0);
}
