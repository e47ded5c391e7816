//! Vertex and edge compatibility predicates.
//!
//! The matcher catalog is a closed set of tagged variants dispatched through
//! a single `matches` function each. Matchers hold no state, so one
//! [`MatcherSet`] is shared by reference across every concurrent phase.

use mcs_common::{Atom, Bond, BondOrder, Graph, MatcherFlags};
use serde::{Deserialize, Serialize};

/// Vertex compatibility rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexMatcher {
    /// Every vertex matches every vertex.
    Any,
    /// Element symbols must be equal.
    #[default]
    Element,
    /// Element equal; ring atoms only match ring atoms sharing a ring size.
    ElementRing,
    /// Element equal; perceived atom types equal when both are known.
    ElementType,
    /// `ElementRing` and `ElementType` together.
    ElementRingType,
    /// The query atom's embedded constraints decide; plain atoms fall back to `Element`.
    Query,
}

impl VertexMatcher {
    /// Evaluates the rule for a (query, target) atom pair.
    #[must_use]
    pub fn matches(self, query: &Atom, target: &Atom) -> bool {
        match self {
            Self::Any => true,
            Self::Element => query.element == target.element,
            Self::ElementRing => query.element == target.element && rings_compatible(query, target),
            Self::ElementType => query.element == target.element && types_compatible(query, target),
            Self::ElementRingType => {
                query.element == target.element
                    && rings_compatible(query, target)
                    && types_compatible(query, target)
            }
            Self::Query => query.query.as_ref().map_or_else(
                || query.element == target.element,
                |constraint| constraint.matches(target),
            ),
        }
    }
}

/// Edge compatibility rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeMatcher {
    /// Any bond matches any bond; only adjacency matters.
    Any,
    /// Bond orders must agree; aromatic only matches aromatic.
    #[default]
    Order,
    /// Ring membership must agree.
    Ring,
    /// `Order` and `Ring` together.
    OrderRing,
    /// The query bond's embedded constraints decide; plain bonds fall back to `Order`.
    Query,
}

impl EdgeMatcher {
    /// Evaluates the rule for a (query, target) bond pair.
    #[must_use]
    pub fn matches(self, query: &Bond, target: &Bond) -> bool {
        match self {
            Self::Any => true,
            Self::Order => orders_compatible(query, target),
            Self::Ring => query.in_ring == target.in_ring,
            Self::OrderRing => orders_compatible(query, target) && query.in_ring == target.in_ring,
            Self::Query => query.query.as_ref().map_or_else(
                || orders_compatible(query, target),
                |constraint| constraint.matches(target),
            ),
        }
    }
}

fn rings_compatible(query: &Atom, target: &Atom) -> bool {
    match (query.in_ring(), target.in_ring()) {
        (false, false) => true,
        (true, true) => query
            .ring_sizes
            .iter()
            .any(|size| target.ring_sizes.binary_search(size).is_ok()),
        _ => false,
    }
}

fn types_compatible(query: &Atom, target: &Atom) -> bool {
    match (&query.atom_type, &target.atom_type) {
        (Some(q), Some(t)) => q == t,
        _ => true,
    }
}

fn orders_compatible(query: &Bond, target: &Bond) -> bool {
    match (query.is_aromatic(), target.is_aromatic()) {
        (true, true) => true,
        (false, false) => {
            query.order == target.order
                || query.order == BondOrder::Unset
                || target.order == BondOrder::Unset
        }
        _ => false,
    }
}

/// The vertex/edge matcher pair selected once per search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatcherSet {
    /// Vertex rule.
    pub vertex: VertexMatcher,
    /// Edge rule.
    pub edge: EdgeMatcher,
}

impl MatcherSet {
    /// Pairs two rules.
    #[must_use]
    pub const fn new(vertex: VertexMatcher, edge: EdgeMatcher) -> Self {
        Self { vertex, edge }
    }

    /// Picks matchers from the caller's sensitivity switches.
    #[must_use]
    pub const fn from_flags(
        bond_sensitive: bool,
        ring_sensitive: bool,
        type_sensitive: bool,
    ) -> Self {
        let vertex = match (ring_sensitive, type_sensitive) {
            (false, false) => VertexMatcher::Element,
            (true, false) => VertexMatcher::ElementRing,
            (false, true) => VertexMatcher::ElementType,
            (true, true) => VertexMatcher::ElementRingType,
        };
        let edge = match (bond_sensitive, ring_sensitive) {
            (false, false) => EdgeMatcher::Any,
            (true, false) => EdgeMatcher::Order,
            (false, true) => EdgeMatcher::Ring,
            (true, true) => EdgeMatcher::OrderRing,
        };
        Self { vertex, edge }
    }

    /// Matchers for query graphs that carry their own constraints.
    #[must_use]
    pub const fn query() -> Self {
        Self {
            vertex: VertexMatcher::Query,
            edge: EdgeMatcher::Query,
        }
    }

    /// Matchers for a shared test case.
    #[must_use]
    pub const fn for_flags(flags: MatcherFlags) -> Self {
        match flags {
            MatcherFlags::BondSensitive => Self::from_flags(true, false, false),
            MatcherFlags::BondInsensitive => Self::from_flags(false, false, false),
            MatcherFlags::RingSensitive => Self::from_flags(true, true, false),
            MatcherFlags::QueryBound => Self::query(),
        }
    }

    /// True when edges are compared by label rather than by adjacency alone.
    #[must_use]
    pub const fn bond_sensitive(&self) -> bool {
        !matches!(self.edge, EdgeMatcher::Any)
    }

    /// Vertex compatibility between `query[q]` and `target[t]`.
    #[must_use]
    pub fn vertices(&self, query: &Graph, q: usize, target: &Graph, t: usize) -> bool {
        self.vertex.matches(query.atom(q), target.atom(t))
    }

    /// Edge compatibility between `query` bond `qe` and `target` bond `te`.
    #[must_use]
    pub fn edges(&self, query: &Graph, qe: usize, target: &Graph, te: usize) -> bool {
        self.edge.matches(query.bond(qe), target.bond(te))
    }
}
