//! Maximum clique enumeration over a [`CompatGraph`].
//!
//! Bron–Kerbosch with pivoting, driven by an explicit stack of frames
//! instead of recursion so the visit count and step budget can cut the
//! search off at any point.

use tracing::{debug, trace};

use super::compat_graph::CompatGraph;
use crate::budget::StepBudget;
use crate::error::{McsError, Phase};

/// Limits applied to one enumeration.
#[derive(Clone, Copy, Debug)]
pub struct CliqueLimits {
    /// Maximal cliques that may be visited before giving up.
    pub max_cliques: usize,
    /// Tied maximum cliques kept.
    pub max_kept: usize,
}

/// Maximum cliques found by one enumeration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliqueOutcome {
    /// Cliques of the largest size seen, each sorted ascending.
    pub cliques: Vec<Vec<usize>>,
    /// Maximal cliques visited, including smaller ones later discarded.
    pub visited: usize,
    /// The step budget ran out; `cliques` is best-so-far.
    pub timed_out: bool,
    /// More maximum cliques existed than `max_kept`.
    pub truncated: bool,
}

struct Frame {
    r: Vec<usize>,
    p: Vec<usize>,
    x: Vec<usize>,
}

/// Enumerates the maximal cliques of globally maximum size.
///
/// Branches that cannot reach the best size found so far are skipped, so
/// smaller maximal cliques are only visited until a larger one turns up.
///
/// # Errors
///
/// [`McsError::ResourceExceeded`] when more than `limits.max_cliques`
/// maximal cliques are visited.
pub fn maximum_cliques(
    graph: &CompatGraph,
    budget: &StepBudget,
    limits: CliqueLimits,
) -> Result<CliqueOutcome, McsError> {
    let mut outcome = CliqueOutcome::default();
    if graph.is_empty() {
        return Ok(outcome);
    }

    let mut best = 0usize;
    let mut stack = vec![Frame {
        r: Vec::new(),
        p: (0..graph.len()).collect(),
        x: Vec::new(),
    }];

    while let Some(Frame { r, mut p, mut x }) = stack.pop() {
        if !budget.tick() {
            outcome.timed_out = true;
            break;
        }

        if p.is_empty() {
            if x.is_empty() {
                outcome.visited += 1;
                if outcome.visited > limits.max_cliques {
                    return Err(McsError::resource_exceeded(
                        Phase::Clique,
                        format!("more than {} maximal cliques", limits.max_cliques),
                    ));
                }
                record(&mut outcome, &mut best, r, limits.max_kept);
            }
            continue;
        }

        if r.len() + p.len() < best {
            trace!("koch: pruned frame at depth {}", r.len());
            continue;
        }

        let pivot = choose_pivot(graph, &p, &x);
        let branches: Vec<usize> = p
            .iter()
            .copied()
            .filter(|&v| pivot.is_none_or(|u| !graph.linked(u, v)))
            .collect();

        let mut children = Vec::with_capacity(branches.len());
        for v in branches {
            let mut child_r = r.clone();
            child_r.push(v);
            children.push(Frame {
                r: child_r,
                p: p.iter().copied().filter(|&w| graph.linked(v, w)).collect(),
                x: x.iter().copied().filter(|&w| graph.linked(v, w)).collect(),
            });
            p.retain(|&w| w != v);
            x.push(v);
        }
        stack.extend(children.into_iter().rev());
    }

    debug!(
        "koch: {} maximal cliques visited, {} of size {}{}",
        outcome.visited,
        outcome.cliques.len(),
        best,
        if outcome.timed_out { " (timed out)" } else { "" }
    );
    Ok(outcome)
}

/// The vertex of `p ∪ x` with the most neighbors in `p`.
fn choose_pivot(graph: &CompatGraph, p: &[usize], x: &[usize]) -> Option<usize> {
    p.iter()
        .chain(x)
        .copied()
        .max_by_key(|&u| p.iter().filter(|&&w| graph.linked(u, w)).count())
}

fn record(outcome: &mut CliqueOutcome, best: &mut usize, mut clique: Vec<usize>, cap: usize) {
    if clique.len() < *best {
        return;
    }
    if clique.len() > *best {
        *best = clique.len();
        outcome.cliques.clear();
        outcome.truncated = false;
    }
    if outcome.cliques.len() < cap {
        clique.sort_unstable();
        outcome.cliques.push(clique);
    } else {
        outcome.truncated = true;
    }
}
