//! Common test molecules and expected search outcomes.
//!
//! This module defines the fixture graphs (queries and targets) and a table
//! of [`TestCase`]s shared by the unit and integration tests of every crate.

use crate::builder::GraphBuilder;
use crate::config::{Config, DedupeMode, SearchMode};
use crate::graph::{Atom, AtomQuery, BondOrder, Graph};

/// Which matcher combination a test case runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatcherFlags {
    /// Element equality plus strict bond order.
    BondSensitive,
    /// Element equality, any adjacency.
    BondInsensitive,
    /// Element and ring-size equality plus bond order and ring membership.
    RingSensitive,
    /// Constraints embedded in the query graph decide.
    QueryBound,
}

/// A complete test case definition.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// The name of the test case.
    pub name: &'static str,
    /// The configuration for the search.
    pub config: Config,
    /// Search mode requested by the caller.
    pub mode: SearchMode,
    /// Matcher combination.
    pub matchers: MatcherFlags,
    /// The query graph.
    pub query: &'static Graph,
    /// The target graph.
    pub target: &'static Graph,
    /// Expected vertex count of every returned mapping.
    pub expected_size: usize,
    /// Expected mapped query edge count of every returned mapping.
    pub expected_edges: usize,
    /// Expected number of distinct mappings, when it is stable.
    pub expected_mappings: Option<usize>,
    /// Expected exact-subgraph verdict.
    pub expected_exact: bool,
}

fn build(name: &str, f: impl FnOnce(&mut GraphBuilder)) -> Graph {
    let mut builder = GraphBuilder::new();
    f(&mut builder);
    builder
        .build()
        .unwrap_or_else(|e| panic!("fixture {name} is malformed: {e}"))
}

fn benzene_with_substituent(b: &mut GraphBuilder, element: &str) {
    let ring = b.aromatic_ring("C", 6);
    let sub = b.element(element);
    b.bond(ring[0], sub, BondOrder::Single);
}

// #####################
// MOLECULES
// #####################
lazy_static::lazy_static! {
    /// A single carbon.
    pub static ref METHANE: Graph = build("methane", |b| {
        b.element("C");
    });

    /// Two carbons joined by a single bond.
    pub static ref ETHANE: Graph = build("ethane", |b| {
        b.chain("C", 2, BondOrder::Single);
    });

    /// Three-carbon chain.
    pub static ref PROPANE: Graph = build("propane", |b| {
        b.chain("C", 3, BondOrder::Single);
    });

    /// Two nitrogens joined by a single bond; shares no label with the alkanes.
    pub static ref HYDRAZINE: Graph = build("hydrazine", |b| {
        b.chain("N", 2, BondOrder::Single);
    });

    /// Bicyclo[2.2.2]octane: 8 carbons, 9 single bonds, three fused 6-rings.
    pub static ref BICYCLO_OCTANE: Graph = build("bicyclo[2.2.2]octane", |b| {
        let head = b.element("C");
        let tail = b.element("C");
        let bridges: Vec<[usize; 2]> = (0..3)
            .map(|_| {
                let pair = b.chain("C", 2, BondOrder::Single);
                b.bond(head, pair[0], BondOrder::Single);
                b.bond(pair[1], tail, BondOrder::Single);
                [pair[0], pair[1]]
            })
            .collect();
        for (x, y) in [(0, 1), (1, 2), (0, 2)] {
            let [x0, x1] = bridges[x];
            let [y0, y1] = bridges[y];
            b.mark_ring(&[head, x0, x1, tail, y1, y0]);
        }
    });

    /// Saturated six-membered carbon ring.
    pub static ref CYCLOHEXANE: Graph = build("cyclohexane", |b| {
        let ring = b.chain("C", 6, BondOrder::Single);
        b.ring(&ring, BondOrder::Single);
    });

    /// Aromatic six-membered carbon ring.
    pub static ref BENZENE: Graph = build("benzene", |b| {
        b.aromatic_ring("C", 6);
    });

    /// Two fused aromatic six-membered rings.
    pub static ref NAPHTHALENE: Graph = build("naphthalene", |b| {
        let first = b.aromatic_ring("C", 6);
        let extra: Vec<usize> = (0..4)
            .map(|_| b.atom(Atom::new("C").with_aromatic(true)))
            .collect();
        b.ring(
            &[first[0], extra[0], extra[1], extra[2], extra[3], first[1]],
            BondOrder::Aromatic,
        );
    });

    /// Benzene with a methyl substituent.
    pub static ref TOLUENE: Graph = build("toluene", |b| benzene_with_substituent(b, "C"));

    /// Benzene with a hydroxyl substituent.
    pub static ref PHENOL: Graph = build("phenol", |b| benzene_with_substituent(b, "O"));

    /// Aromatic six-membered ring with one nitrogen.
    pub static ref PYRIDINE: Graph = build("pyridine", |b| {
        let n = b.atom(Atom::new("N").with_aromatic(true));
        let rest: Vec<usize> = (0..5)
            .map(|_| b.atom(Atom::new("C").with_aromatic(true)))
            .collect();
        let mut members = vec![n];
        members.extend(rest);
        b.ring(&members, BondOrder::Aromatic);
    });

    /// Aromatic ring query whose first atom accepts carbon or nitrogen.
    pub static ref AZINE_QUERY: Graph = build("azine query", |b| {
        let ring = b.aromatic_ring("C", 6);
        if let Some(atom) = b.atom_mut(ring[0]) {
            atom.query = Some(AtomQuery {
                elements: vec!["N".into(), "C".into()],
                aromatic: Some(true),
                ..AtomQuery::default()
            });
        }
    });
}

// #####################
// TEST CASES
// #####################
lazy_static::lazy_static! {
    /// Every shared test case.
    pub static ref ALL_TEST_CASES: Vec<TestCase> = vec![
        TestCase {
            name: "ethane_in_bicyclo_octane",
            config: Config::default(),
            mode: SearchMode::Substructure,
            matchers: MatcherFlags::BondSensitive,
            query: &ETHANE,
            target: &BICYCLO_OCTANE,
            expected_size: 2,
            expected_edges: 1,
            expected_mappings: Some(18),
            expected_exact: true,
        },
        TestCase {
            name: "benzene_in_naphthalene",
            config: Config::default(),
            mode: SearchMode::Substructure,
            matchers: MatcherFlags::BondSensitive,
            query: &BENZENE,
            target: &NAPHTHALENE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(24),
            expected_exact: true,
        },
        TestCase {
            name: "benzene_in_naphthalene_target_sets",
            config: Config::builder().dedupe(DedupeMode::TargetSet).build(),
            mode: SearchMode::GeneralMcs,
            matchers: MatcherFlags::BondSensitive,
            query: &BENZENE,
            target: &NAPHTHALENE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(2),
            expected_exact: true,
        },
        TestCase {
            name: "naphthalene_self",
            config: Config::default(),
            mode: SearchMode::Identical,
            matchers: MatcherFlags::BondSensitive,
            query: &NAPHTHALENE,
            target: &NAPHTHALENE,
            expected_size: 10,
            expected_edges: 11,
            expected_mappings: Some(4),
            expected_exact: true,
        },
        TestCase {
            name: "benzene_self",
            config: Config::default(),
            mode: SearchMode::Identical,
            matchers: MatcherFlags::RingSensitive,
            query: &BENZENE,
            target: &BENZENE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(12),
            expected_exact: true,
        },
        TestCase {
            name: "toluene_phenol_mcs",
            config: Config::default(),
            mode: SearchMode::GeneralMcs,
            matchers: MatcherFlags::BondSensitive,
            query: &TOLUENE,
            target: &PHENOL,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(12),
            expected_exact: false,
        },
        TestCase {
            name: "naphthalene_onto_benzene",
            config: Config::default(),
            mode: SearchMode::GeneralMcs,
            matchers: MatcherFlags::BondSensitive,
            query: &NAPHTHALENE,
            target: &BENZENE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(24),
            expected_exact: false,
        },
        TestCase {
            name: "disjoint_labels",
            config: Config::default(),
            mode: SearchMode::GeneralMcs,
            matchers: MatcherFlags::BondSensitive,
            query: &ETHANE,
            target: &HYDRAZINE,
            expected_size: 0,
            expected_edges: 0,
            expected_mappings: Some(0),
            expected_exact: false,
        },
        TestCase {
            name: "methane_in_benzene",
            config: Config::default(),
            mode: SearchMode::Substructure,
            matchers: MatcherFlags::BondSensitive,
            query: &METHANE,
            target: &BENZENE,
            expected_size: 1,
            expected_edges: 0,
            expected_mappings: Some(6),
            expected_exact: true,
        },
        TestCase {
            name: "cyclohexane_benzene_bond_sensitive",
            config: Config::default(),
            mode: SearchMode::GeneralMcs,
            matchers: MatcherFlags::BondSensitive,
            query: &CYCLOHEXANE,
            target: &BENZENE,
            expected_size: 1,
            expected_edges: 0,
            expected_mappings: Some(36),
            expected_exact: false,
        },
        TestCase {
            name: "cyclohexane_benzene_bond_insensitive",
            config: Config::default(),
            mode: SearchMode::Substructure,
            matchers: MatcherFlags::BondInsensitive,
            query: &CYCLOHEXANE,
            target: &BENZENE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(12),
            expected_exact: true,
        },
        TestCase {
            name: "azine_query_in_pyridine",
            config: Config::default(),
            mode: SearchMode::Substructure,
            matchers: MatcherFlags::QueryBound,
            query: &AZINE_QUERY,
            target: &PYRIDINE,
            expected_size: 6,
            expected_edges: 6,
            expected_mappings: Some(2),
            expected_exact: true,
        },
    ];
}

/// Looks up a shared test case by name.
#[must_use]
pub fn test_case(name: &str) -> Option<&'static TestCase> {
    ALL_TEST_CASES.iter().find(|tc| tc.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_sizes() {
        assert_eq!((BICYCLO_OCTANE.vertex_count(), BICYCLO_OCTANE.edge_count()), (8, 9));
        assert_eq!((NAPHTHALENE.vertex_count(), NAPHTHALENE.edge_count()), (10, 11));
        assert_eq!((TOLUENE.vertex_count(), TOLUENE.edge_count()), (7, 7));
        assert!(BICYCLO_OCTANE.atoms().iter().all(|a| a.ring_sizes == vec![6]));
        assert!(BICYCLO_OCTANE.bonds().iter().all(|b| b.in_ring));
        assert!(AZINE_QUERY.has_query_constraints());
        assert!(!PYRIDINE.has_query_constraints());
    }

    #[test]
    fn case_names_are_unique() {
        let mut names: Vec<&str> = ALL_TEST_CASES.iter().map(|tc| tc.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_TEST_CASES.len());
        assert!(test_case("toluene_phenol_mcs").is_some());
    }
}
