//! Maximum common subgraph search over labeled molecular graphs.
//!
//! The entry point is [`find_mcs`], which settles the search with a direct
//! subgraph-isomorphism match when one exists and otherwise races seed
//! generators (maximum cliques of the bond-pair compatibility graph, greedy
//! overlap growth) before extending the best seeds to maximum mappings.
//!
//! ```
//! use mcs_subgraph::{find_mcs, Config, EdgeMatcher, SearchMode, VertexMatcher};
//! use mcs_common::{BENZENE, NAPHTHALENE};
//!
//! let result = find_mcs(
//!     &BENZENE,
//!     &NAPHTHALENE,
//!     VertexMatcher::Element,
//!     EdgeMatcher::Order,
//!     SearchMode::Substructure,
//!     &Config::default(),
//! )
//! .unwrap();
//! assert!(result.is_exact_subgraph);
//! assert_eq!(result.max_size(), 6);
//! ```

pub mod budget;
pub mod compat;
mod dedupe;
pub mod engine;
pub mod error;
pub mod koch;
pub mod mapping;
pub mod mcgregor;
pub mod seed;
mod single;
mod utils;
pub mod vf;

#[cfg(test)]
mod test_harness;

pub use mcs_common::{
    Atom, AtomQuery, Bond, BondOrder, BondQuery, Config, ConfigBuilder, DedupeMode, Graph,
    GraphBuilder, GraphError, SearchMode,
};

pub use crate::budget::StepBudget;
pub use crate::compat::{EdgeMatcher, MatcherSet, VertexMatcher};
pub use crate::engine::{McsEngine, McsResult, SearchStats};
pub use crate::error::{Advisory, McsError, Phase};
pub use crate::mapping::{Mapping, MappingSet};
pub use crate::mcgregor::{ExtensionOutcome, McGregor};
pub use crate::seed::{CliqueSeeds, OverlapSeeds, SearchContext, SeedGenerator, SeedOutcome};
pub use crate::vf::{VfGoal, VfMatcher, VfOutcome};

/// Finds the maximum common subgraph mappings of `query` into `target` with
/// the default seed generators.
///
/// # Errors
///
/// [`McsError::InvalidInput`] when either graph is empty.
pub fn find_mcs(
    query: &Graph,
    target: &Graph,
    vertex_matcher: VertexMatcher,
    edge_matcher: EdgeMatcher,
    mode: SearchMode,
    config: &Config,
) -> Result<McsResult, McsError> {
    let matchers = MatcherSet::new(vertex_matcher, edge_matcher);
    McsEngine::default().find(query, target, &matchers, mode, config)
}

/// Whether `query` embeds completely into `target`.
///
/// # Errors
///
/// [`McsError::TimedOut`] when the step budget runs out before a verdict.
pub fn is_subgraph(
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
    config: &Config,
) -> Result<bool, McsError> {
    VfMatcher::new(query, target, matchers, config).is_subgraph()
}

/// Every embedding of `query` into `target` up to `config.max_mappings`,
/// deduplicated per `config.dedupe`. [`VfMatcher::enumerate`] also reports
/// whether the cap cut any off.
#[must_use]
pub fn find_subgraphs(
    query: &Graph,
    target: &Graph,
    matchers: &MatcherSet,
    config: &Config,
) -> MappingSet {
    let mut mappings = VfMatcher::new(query, target, matchers, config)
        .enumerate()
        .mappings;
    mappings.dedupe(config.dedupe);
    mappings.sort_canonical();
    mappings
}
