//! Configuration for the common-subgraph search.
//!
//! This module exposes a minimal, stable surface for consumers to
//! parameterize how matching should behave. Every search receives its
//! [`Config`] by reference; nothing here is process-wide.
//!
//! The main concepts are:
//! - budgets: soft step limits and size bounds that degrade a search to a
//!   best-effort result instead of failing it.
//! - dedupe: how to deduplicate mappings after search (by the full set of
//!   vertex pairs, or by the set of matched target vertices only).
//!
//! Quick examples
//!
//! Defaults (full dedupe, one million steps per matcher):
//! ```
//! use mcs_common::Config;
//! let cfg = Config::default();
//! assert!(cfg.step_budget.is_some());
//! ```
//!
//! Collapse automorphisms and run without a step budget:
//! ```
//! use mcs_common::{Config, DedupeMode};
//! let cfg = Config::builder().dedupe(DedupeMode::TargetSet).unbounded().build();
//! assert_eq!(cfg.step_budget, None);
//! ```

use serde::{Deserialize, Serialize};

/// Which relationship the caller wants established between the two graphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Both graphs have the same size; look for a full correspondence first.
    Identical,
    /// The query should embed completely into the target.
    Substructure,
    /// Find the largest common subgraph, whatever the sizes.
    #[default]
    GeneralMcs,
}

/// Control how mappings are deduplicated.
///
/// - Full:
///     Two mappings are distinct if their sets of (query, target) vertex
///     pairs differ. Rotations and reflections of a symmetric query onto the
///     same target atoms are all kept.
/// - TargetSet:
///     Two mappings are the same if they cover the same SET of target
///     vertices, regardless of which query vertex lands where (collapses
///     automorphisms).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DedupeMode {
    /// Compare the full vertex-pair set.
    #[default]
    Full,
    /// Compare only the covered target vertex set.
    TargetSet,
}

/// Global search configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Also forbid target edges between images of non-adjacent query vertices.
    pub induced: bool,
    /// Soft step budget per matcher run. `None` disables the limit.
    pub step_budget: Option<u64>,
    /// Upper bound on compatibility-graph vertices before the clique phase gives up.
    pub max_compat_nodes: usize,
    /// Upper bound on maximal cliques visited before the clique phase gives up.
    pub max_cliques: usize,
    /// Cap on tied solutions kept by any single matcher.
    pub max_mappings: usize,
    /// How to deduplicate the final mappings.
    pub dedupe: DedupeMode,
    /// Race seed generators on the worker pool.
    pub parallel: bool,
}

impl Config {
    /// Default step budget per matcher run.
    pub const DEFAULT_STEP_BUDGET: u64 = 1_000_000;

    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            induced: false,
            step_budget: Some(Self::DEFAULT_STEP_BUDGET),
            max_compat_nodes: 4096,
            max_cliques: 100_000,
            max_mappings: 10_000,
            dedupe: DedupeMode::Full,
            parallel: true,
        }
    }
}

/// Fluent builder for [`Config`].
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Require induced embeddings in the subgraph-isomorphism phase.
    #[must_use]
    pub const fn induced(mut self, induced: bool) -> Self {
        self.config.induced = induced;
        self
    }

    /// Sets the soft step budget per matcher run.
    #[must_use]
    pub const fn step_budget(mut self, steps: u64) -> Self {
        self.config.step_budget = Some(steps);
        self
    }

    /// Removes the step budget.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.config.step_budget = None;
        self
    }

    /// Sets the compatibility-graph size bound.
    #[must_use]
    pub const fn max_compat_nodes(mut self, nodes: usize) -> Self {
        self.config.max_compat_nodes = nodes;
        self
    }

    /// Sets the maximal-clique bound.
    #[must_use]
    pub const fn max_cliques(mut self, cliques: usize) -> Self {
        self.config.max_cliques = cliques;
        self
    }

    /// Sets the cap on tied solutions per matcher.
    #[must_use]
    pub const fn max_mappings(mut self, mappings: usize) -> Self {
        self.config.max_mappings = mappings;
        self
    }

    /// Sets the dedupe mode.
    #[must_use]
    pub const fn dedupe(mut self, dedupe: DedupeMode) -> Self {
        self.config.dedupe = dedupe;
        self
    }

    /// Enables or disables concurrent seed generation.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}
