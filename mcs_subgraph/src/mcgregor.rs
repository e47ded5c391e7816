//! Seed extension by bounded backtracking.
//!
//! Starting from a seed mapping, the search repeatedly picks the
//! lowest-index unmapped vertex of the smaller graph that touches the
//! mapped region and branches on every compatible image for it, plus one
//! branch that leaves it out. Growth only follows common edges, so a
//! mapping never picks up unconnected vertices. Branches whose optimistic
//! size bound falls below the best mapping found are cut.

use std::collections::{BTreeSet, VecDeque};
use std::ops::ControlFlow;

use mcs_common::{Config, DedupeMode, Graph};
use tracing::{debug, trace};

use crate::budget::StepBudget;
use crate::compat::MatcherSet;
use crate::mapping::{Mapping, MappingSet};

/// Result of extending one or more seeds.
#[derive(Clone, Debug, Default)]
pub struct ExtensionOutcome {
    /// Best extensions, in the caller's query→target orientation.
    pub mappings: MappingSet,
    /// The step budget ran out; some seeds were returned unextended or
    /// partially extended.
    pub timed_out: bool,
    /// A seed had more tied best extensions than `config.max_mappings`.
    pub truncated: bool,
    /// Steps consumed.
    pub steps: u64,
}

/// Grows seed mappings to maximum common subgraphs.
#[derive(Clone, Copy, Debug)]
pub struct McGregor<'a> {
    query: &'a Graph,
    target: &'a Graph,
    matchers: &'a MatcherSet,
    config: &'a Config,
}

impl<'a> McGregor<'a> {
    /// An extender for mappings from `query` into `target`.
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
        }
    }

    /// Best extensions of a single seed.
    #[must_use]
    pub fn extend(&self, seed: &Mapping) -> ExtensionOutcome {
        let budget = StepBudget::from_config(self.config);
        let (mappings, truncated) = self.extend_with(seed, &budget);
        ExtensionOutcome {
            mappings,
            timed_out: budget.is_exhausted(),
            truncated,
            steps: budget.used(),
        }
    }

    /// Extends every seed under one shared budget and returns the union of
    /// their best results, deduplicated by pair set.
    #[must_use]
    pub fn extend_all(&self, seeds: &MappingSet) -> ExtensionOutcome {
        let budget = StepBudget::from_config(self.config);
        let mut mappings = MappingSet::default();
        let mut truncated_sizes = Vec::new();
        for seed in seeds {
            let (grown, truncated) = self.extend_with(seed, &budget);
            if truncated {
                truncated_sizes.push(grown.max_size());
            }
            mappings.extend(grown);
        }
        mappings.dedupe(DedupeMode::Full);
        mappings.sort_canonical();
        // cuts below the overall best size drop nothing from the result
        let truncated = truncated_sizes.contains(&mappings.max_size());
        debug!(
            "mcgregor: {} seeds extended to {} mappings of size {} in {} steps",
            seeds.len(),
            mappings.len(),
            mappings.max_size(),
            budget.used()
        );
        ExtensionOutcome {
            mappings,
            timed_out: budget.is_exhausted(),
            truncated,
            steps: budget.used(),
        }
    }

    /// Best extensions of `seed` and whether tied ones were dropped at the cap.
    fn extend_with(&self, seed: &Mapping, budget: &StepBudget) -> (MappingSet, bool) {
        let transposed = self.query.vertex_count() > self.target.vertex_count();
        let view = if transposed {
            Oriented {
                small: self.target,
                large: self.query,
                transposed,
                matchers: self.matchers,
            }
        } else {
            Oriented {
                small: self.query,
                large: self.target,
                transposed,
                matchers: self.matchers,
            }
        };

        let mut search = Extension {
            view,
            budget,
            best: (0, 0),
            kept: Vec::new(),
            cap: self.config.max_mappings.max(1),
            truncated: false,
        };
        let mut mapping = if transposed {
            seed.transposed()
        } else {
            seed.clone()
        };
        let mut excluded = vec![false; view.small.vertex_count()];
        // Break only signals budget exhaustion, which `budget` already records.
        let _ = search.grow(&mut mapping, &mut excluded);

        trace!(
            "mcgregor: seed of size {} grew to {:?} ({} kept)",
            seed.len(),
            search.best,
            search.kept.len()
        );

        let kept = search
            .kept
            .into_iter()
            .map(|m| if transposed { m.transposed() } else { m })
            .collect();
        (kept, search.truncated)
    }
}

/// The two graphs arranged so the search always walks the smaller one.
///
/// Mappings inside the search run small→large; matcher calls and the
/// edge-consistency rule are always evaluated in the caller's orientation.
#[derive(Clone, Copy)]
struct Oriented<'a> {
    small: &'a Graph,
    large: &'a Graph,
    transposed: bool,
    matchers: &'a MatcherSet,
}

impl Oriented<'_> {
    fn vertices_match(&self, s: usize, l: usize) -> bool {
        if self.transposed {
            self.matchers.vertices(self.large, l, self.small, s)
        } else {
            self.matchers.vertices(self.small, s, self.large, l)
        }
    }

    fn edges_match(&self, se: usize, le: usize) -> bool {
        if self.transposed {
            self.matchers.edges(self.large, le, self.small, se)
        } else {
            self.matchers.edges(self.small, se, self.large, le)
        }
    }

    /// Small edge `s–sn` and large edge `l–ln` both exist and match.
    fn common_edge(&self, s: usize, sn: usize, l: usize, ln: usize) -> bool {
        match (self.small.edge_between(s, sn), self.large.edge_between(l, ln)) {
            (Some(se), Some(le)) => self.edges_match(se, le),
            _ => false,
        }
    }

    /// Whether `s -> l` keeps the mapping edge consistent and attaches to
    /// the mapped region through at least one common edge.
    fn feasible(&self, m: &Mapping, s: usize, l: usize) -> bool {
        let consistent = if self.transposed {
            self.large.incident(l).iter().all(|&(ln, _)| {
                m.query_of(ln).is_none_or(|sn| self.common_edge(s, sn, l, ln))
            })
        } else {
            self.small.incident(s).iter().all(|&(sn, _)| {
                m.target_of(sn).is_none_or(|ln| self.common_edge(s, sn, l, ln))
            })
        };
        let attached = m.is_empty()
            || self.small.incident(s).iter().any(|&(sn, _)| {
                m.target_of(sn).is_some_and(|ln| self.common_edge(s, sn, l, ln))
            });
        consistent && attached
    }

    /// Edges of the caller's query whose endpoints are both mapped.
    fn mapped_edges(&self, m: &Mapping) -> usize {
        if self.transposed {
            self.large
                .bonds()
                .iter()
                .filter(|b| m.query_of(b.begin).is_some() && m.query_of(b.end).is_some())
                .count()
        } else {
            self.small
                .bonds()
                .iter()
                .filter(|b| m.contains_query(b.begin) && m.contains_query(b.end))
                .count()
        }
    }
}

struct Extension<'a, 'b> {
    view: Oriented<'a>,
    budget: &'b StepBudget,
    best: (usize, usize),
    kept: Vec<Mapping>,
    cap: usize,
    truncated: bool,
}

impl Extension<'_, '_> {
    fn grow(&mut self, m: &mut Mapping, excluded: &mut [bool]) -> ControlFlow<()> {
        if !self.budget.tick() {
            self.record(m);
            return ControlFlow::Break(());
        }

        if self.upper_bound(m, excluded) < self.best.0 {
            return ControlFlow::Continue(());
        }

        let Some(s) = self.frontier(m, excluded) else {
            self.record(m);
            return ControlFlow::Continue(());
        };

        for l in self.candidates(m, s) {
            m.assign(s, l);
            let flow = self.grow(m, excluded);
            m.remove_by_query(s);
            flow?;
        }

        excluded[s] = true;
        let flow = self.grow(m, excluded);
        excluded[s] = false;
        flow
    }

    fn record(&mut self, m: &Mapping) {
        let key = (m.len(), self.view.mapped_edges(m));
        if key < self.best {
            return;
        }
        if key > self.best {
            self.best = key;
            self.kept.clear();
            self.truncated = false;
        }
        if self.kept.len() < self.cap {
            self.kept.push(m.clone());
        } else {
            self.truncated = true;
        }
    }

    /// Lowest-index small vertex that is unmapped, not excluded and adjacent
    /// to the mapped region (any such vertex when nothing is mapped yet).
    fn frontier(&self, m: &Mapping, excluded: &[bool]) -> Option<usize> {
        let small = self.view.small;
        (0..small.vertex_count()).find(|&s| {
            !excluded[s]
                && !m.contains_query(s)
                && (m.is_empty() || small.neighbors(s).any(|n| m.contains_query(n)))
        })
    }

    fn candidates(&self, m: &Mapping, s: usize) -> Vec<usize> {
        let (small, large) = (self.view.small, self.view.large);
        let pool: BTreeSet<usize> = if m.is_empty() {
            (0..large.vertex_count()).collect()
        } else {
            small
                .neighbors(s)
                .filter_map(|sn| m.target_of(sn))
                .flat_map(|ln| large.neighbors(ln))
                .collect()
        };
        pool.into_iter()
            .filter(|&l| m.is_target_free(l))
            .filter(|&l| self.view.vertices_match(s, l))
            .filter(|&l| self.view.feasible(m, s, l))
            .collect()
    }

    /// Mapped size plus every small vertex still reachable through
    /// unmapped, non-excluded vertices, capped by free large vertices.
    fn upper_bound(&self, m: &Mapping, excluded: &[bool]) -> usize {
        let small = self.view.small;
        let open = |v: usize| !excluded[v] && !m.contains_query(v);

        let reachable = if m.is_empty() {
            (0..small.vertex_count()).filter(|&v| open(v)).count()
        } else {
            let mut seen = vec![false; small.vertex_count()];
            let mut queue: VecDeque<usize> = m.pairs().map(|(s, _)| s).collect();
            let mut count = 0;
            while let Some(v) = queue.pop_front() {
                for n in small.neighbors(v) {
                    if open(n) && !seen[n] {
                        seen[n] = true;
                        count += 1;
                        queue.push_back(n);
                    }
                }
            }
            count
        };

        let free_large = self.view.large.vertex_count() - m.len();
        m.len() + reachable.min(free_large)
    }
}
