//! The edge-pair compatibility graph (modular product over bonds).

use mcs_common::Graph;
use tracing::debug;

use crate::compat::MatcherSet;
use crate::error::{McsError, Phase};

/// A compatible (query bond, target bond) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgePair {
    /// Query bond index.
    pub query_edge: usize,
    /// Target bond index.
    pub target_edge: usize,
    /// begin→begin and end→end are vertex compatible.
    pub straight: bool,
    /// begin→end and end→begin are vertex compatible.
    pub crossed: bool,
}

/// How two compatibility-graph vertices relate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Link {
    /// The pairs can never coexist in one common subgraph.
    #[default]
    None,
    /// The bonds share an endpoint in both graphs, consistently aligned.
    Connected,
    /// The bonds share no endpoint in either graph.
    Disconnected,
}

impl Link {
    /// True for the two link kinds that allow coexistence.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Compatibility graph with a dense link matrix.
#[derive(Clone, Debug)]
pub struct CompatGraph {
    nodes: Vec<EdgePair>,
    links: Vec<Link>,
}

impl CompatGraph {
    /// Builds the graph over every query bond and the given target bonds.
    ///
    /// # Errors
    ///
    /// [`McsError::ResourceExceeded`] when more than `max_nodes` pairs are compatible.
    pub fn build(
        query: &Graph,
        target: &Graph,
        target_edges: &[usize],
        matchers: &MatcherSet,
        max_nodes: usize,
    ) -> Result<Self, McsError> {
        let mut nodes = Vec::new();
        for qe in 0..query.edge_count() {
            for &te in target_edges {
                let Some(pair) = edge_pair(query, qe, target, te, matchers) else {
                    continue;
                };
                if nodes.len() == max_nodes {
                    return Err(McsError::resource_exceeded(
                        Phase::Clique,
                        format!("more than {max_nodes} compatible edge pairs"),
                    ));
                }
                nodes.push(pair);
            }
        }

        let n = nodes.len();
        let mut links = vec![Link::None; n * n];
        let mut connected = 0usize;
        let mut disconnected = 0usize;
        for a in 0..n {
            for b in (a + 1)..n {
                let link = classify(query, target, &nodes[a], &nodes[b]);
                match link {
                    Link::Connected => connected += 1,
                    Link::Disconnected => disconnected += 1,
                    Link::None => continue,
                }
                links[a * n + b] = link;
                links[b * n + a] = link;
            }
        }

        debug!(
            "koch: {} nodes, {} c-links, {} d-links",
            n, connected, disconnected
        );
        Ok(Self { nodes, links })
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no edge pair is compatible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The edge pair behind vertex `i`.
    #[must_use]
    pub fn node(&self, i: usize) -> &EdgePair {
        &self.nodes[i]
    }

    /// Every vertex.
    #[must_use]
    pub fn nodes(&self) -> &[EdgePair] {
        &self.nodes
    }

    /// Link between two vertices.
    #[must_use]
    pub fn link(&self, a: usize, b: usize) -> Link {
        self.links[a * self.nodes.len() + b]
    }

    /// True if `a` and `b` may share a clique.
    #[must_use]
    pub fn linked(&self, a: usize, b: usize) -> bool {
        self.link(a, b).is_edge()
    }
}

fn edge_pair(
    query: &Graph,
    qe: usize,
    target: &Graph,
    te: usize,
    matchers: &MatcherSet,
) -> Option<EdgePair> {
    if !matchers.edges(query, qe, target, te) {
        return None;
    }
    let (qb, tb) = (query.bond(qe), target.bond(te));
    let straight = matchers.vertices(query, qb.begin, target, tb.begin)
        && matchers.vertices(query, qb.end, target, tb.end);
    let crossed = matchers.vertices(query, qb.begin, target, tb.end)
        && matchers.vertices(query, qb.end, target, tb.begin);
    (straight || crossed).then_some(EdgePair {
        query_edge: qe,
        target_edge: te,
        straight,
        crossed,
    })
}

/// Whether `pair` can send query vertex `q` to target vertex `t`.
pub(crate) fn aligns(query: &Graph, target: &Graph, pair: &EdgePair, q: usize, t: usize) -> bool {
    let (qb, tb) = (query.bond(pair.query_edge), target.bond(pair.target_edge));
    let straight = (q == qb.begin && t == tb.begin) || (q == qb.end && t == tb.end);
    let crossed = (q == qb.begin && t == tb.end) || (q == qb.end && t == tb.begin);
    (pair.straight && straight) || (pair.crossed && crossed)
}

fn classify(query: &Graph, target: &Graph, a: &EdgePair, b: &EdgePair) -> Link {
    if a.query_edge == b.query_edge || a.target_edge == b.target_edge {
        return Link::None;
    }
    let shared_q = query.bond(a.query_edge).shared_vertex(query.bond(b.query_edge));
    let shared_t = target.bond(a.target_edge).shared_vertex(target.bond(b.target_edge));
    match (shared_q, shared_t) {
        (Some(q), Some(t)) => {
            if aligns(query, target, a, q, t) && aligns(query, target, b, q, t) {
                Link::Connected
            } else {
                Link::None
            }
        }
        (None, None) => Link::Disconnected,
        _ => Link::None,
    }
}
