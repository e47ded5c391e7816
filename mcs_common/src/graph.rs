//! Labeled graph model shared by every search phase.
//!
//! A [`Graph`] is an immutable, index-addressed set of atoms (vertices) and
//! bonds (edges). Labels are opaque to the search algorithms; they are only
//! inspected through the matcher predicates in `mcs_subgraph::compat`.
//! Ring membership, aromaticity and atom types are expected to be perceived
//! by whoever builds the graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling a [`Graph`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A bond references a vertex index outside the atom list.
    #[error("bond {edge} references vertex {vertex}, but the graph has {vertex_count} vertices")]
    EdgeOutOfBounds {
        /// Index of the offending bond.
        edge: usize,
        /// The out-of-range vertex index.
        vertex: usize,
        /// Number of atoms in the graph.
        vertex_count: usize,
    },

    /// A bond connects a vertex to itself.
    #[error("bond {edge} is a self loop on vertex {vertex}")]
    SelfLoop {
        /// Index of the offending bond.
        edge: usize,
        /// The vertex on both ends.
        vertex: usize,
    },

    /// Two bonds connect the same pair of vertices.
    #[error("bond {edge} duplicates an existing bond between {begin} and {end}")]
    DuplicateEdge {
        /// Index of the offending bond.
        edge: usize,
        /// First endpoint.
        begin: usize,
        /// Second endpoint.
        end: usize,
    },
}

/// Bond order as perceived by the structure loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BondOrder {
    /// Single bond.
    Single,
    /// Double bond.
    Double,
    /// Triple bond.
    Triple,
    /// Quadruple bond.
    Quadruple,
    /// Delocalised aromatic bond.
    Aromatic,
    /// Order not known; compatible with any non-aromatic order.
    Unset,
}

/// Constraints carried by a query atom. Empty fields accept anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomQuery {
    /// Allowed element symbols.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Required aromaticity.
    #[serde(default)]
    pub aromatic: Option<bool>,
    /// Required ring membership.
    #[serde(default)]
    pub in_ring: Option<bool>,
    /// Required smallest-ring size.
    #[serde(default)]
    pub ring_size: Option<u8>,
}

impl AtomQuery {
    /// Evaluates this query against a target atom.
    #[must_use]
    pub fn matches(&self, atom: &Atom) -> bool {
        if !self.elements.is_empty() && !self.elements.iter().any(|e| *e == atom.element) {
            return false;
        }
        if self.aromatic.is_some_and(|a| a != atom.aromatic) {
            return false;
        }
        if self.in_ring.is_some_and(|r| r != atom.in_ring()) {
            return false;
        }
        self.ring_size
            .is_none_or(|size| atom.ring_sizes.contains(&size))
    }
}

/// Constraints carried by a query bond. Empty fields accept anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondQuery {
    /// Allowed orders.
    #[serde(default)]
    pub orders: Vec<BondOrder>,
    /// Required ring membership.
    #[serde(default)]
    pub in_ring: Option<bool>,
}

impl BondQuery {
    /// Evaluates this query against a target bond.
    #[must_use]
    pub fn matches(&self, bond: &Bond) -> bool {
        if !self.orders.is_empty()
            && !self
                .orders
                .iter()
                .any(|&o| o == bond.order || (o == BondOrder::Aromatic && bond.is_aromatic()))
        {
            return false;
        }
        self.in_ring.is_none_or(|r| r == bond.in_ring)
    }
}

/// Vertex label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    /// Element symbol, e.g. `"C"`.
    pub element: String,
    /// Perceived atom type, e.g. `"C.ar"`.
    #[serde(default)]
    pub atom_type: Option<String>,
    /// Sizes of the smallest rings this atom belongs to, sorted and unique.
    #[serde(default)]
    pub ring_sizes: Vec<u8>,
    /// Aromaticity flag.
    #[serde(default)]
    pub aromatic: bool,
    /// Embedded query constraints, if this atom belongs to a query graph.
    #[serde(default)]
    pub query: Option<AtomQuery>,
}

impl Atom {
    /// A plain, acyclic, non-aromatic atom of the given element.
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            ..Self::default()
        }
    }

    /// Sets the perceived atom type.
    #[must_use]
    pub fn with_type(mut self, atom_type: impl Into<String>) -> Self {
        self.atom_type = Some(atom_type.into());
        self
    }

    /// Sets the aromaticity flag.
    #[must_use]
    pub const fn with_aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }

    /// Attaches query constraints.
    #[must_use]
    pub fn with_query(mut self, query: AtomQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Records membership in a ring of `size` atoms.
    pub fn add_ring_size(&mut self, size: u8) {
        if let Err(pos) = self.ring_sizes.binary_search(&size) {
            self.ring_sizes.insert(pos, size);
        }
    }

    /// True if the atom is part of at least one ring.
    #[must_use]
    pub fn in_ring(&self) -> bool {
        !self.ring_sizes.is_empty()
    }
}

/// Edge label plus its two endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// First endpoint.
    pub begin: usize,
    /// Second endpoint.
    pub end: usize,
    /// Bond order.
    pub order: BondOrder,
    /// Aromaticity flag, independent of `order` for Kekulé inputs.
    #[serde(default)]
    pub aromatic: bool,
    /// Ring membership.
    #[serde(default)]
    pub in_ring: bool,
    /// Embedded query constraints, if this bond belongs to a query graph.
    #[serde(default)]
    pub query: Option<BondQuery>,
}

impl Bond {
    /// A non-ring bond between `begin` and `end`.
    #[must_use]
    pub const fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Self {
            begin,
            end,
            order,
            aromatic: matches!(order, BondOrder::Aromatic),
            in_ring: false,
            query: None,
        }
    }

    /// True if the bond is aromatic by order or by flag.
    #[must_use]
    pub fn is_aromatic(&self) -> bool {
        self.aromatic || self.order == BondOrder::Aromatic
    }

    /// True if `vertex` is one of the endpoints.
    #[must_use]
    pub const fn touches(&self, vertex: usize) -> bool {
        self.begin == vertex || self.end == vertex
    }

    /// The endpoint shared with `other`, if the two bonds are adjacent.
    #[must_use]
    pub const fn shared_vertex(&self, other: &Self) -> Option<usize> {
        if other.touches(self.begin) {
            Some(self.begin)
        } else if other.touches(self.end) {
            Some(self.end)
        } else {
            None
        }
    }
}

/// Serialized form of a graph; adjacency is rebuilt on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawGraph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

/// Immutable labeled graph with a prebuilt adjacency index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGraph", into = "RawGraph")]
pub struct Graph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// Per vertex: `(neighbor, bond index)`, sorted by neighbor.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Graph {
    /// Builds a graph, validating every bond.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for out-of-range endpoints, self loops or
    /// parallel bonds.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, GraphError> {
        let vertex_count = atoms.len();
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); vertex_count];

        for (edge, bond) in bonds.iter().enumerate() {
            for vertex in [bond.begin, bond.end] {
                if vertex >= vertex_count {
                    return Err(GraphError::EdgeOutOfBounds {
                        edge,
                        vertex,
                        vertex_count,
                    });
                }
            }
            if bond.begin == bond.end {
                return Err(GraphError::SelfLoop {
                    edge,
                    vertex: bond.begin,
                });
            }
            if adjacency[bond.begin].iter().any(|&(n, _)| n == bond.end) {
                return Err(GraphError::DuplicateEdge {
                    edge,
                    begin: bond.begin,
                    end: bond.end,
                });
            }
            adjacency[bond.begin].push((bond.end, edge));
            adjacency[bond.end].push((bond.begin, edge));
        }

        for list in &mut adjacency {
            list.sort_unstable();
        }

        tracing::trace!(
            "built graph with {} vertices and {} edges",
            vertex_count,
            bonds.len()
        );

        Ok(Self {
            atoms,
            bonds,
            adjacency,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.bonds.len()
    }

    /// True if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Vertex label by index.
    #[must_use]
    pub fn atom(&self, vertex: usize) -> &Atom {
        &self.atoms[vertex]
    }

    /// Edge label by index.
    #[must_use]
    pub fn bond(&self, edge: usize) -> &Bond {
        &self.bonds[edge]
    }

    /// All vertex labels in index order.
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// All edge labels in index order.
    #[must_use]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// `(neighbor, bond index)` pairs incident to `vertex`, sorted by neighbor.
    #[must_use]
    pub fn incident(&self, vertex: usize) -> &[(usize, usize)] {
        &self.adjacency[vertex]
    }

    /// Neighbors of `vertex` in ascending order.
    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[vertex].iter().map(|&(n, _)| n)
    }

    /// Number of bonds incident to `vertex`.
    #[must_use]
    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency[vertex].len()
    }

    /// Index of the bond between `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a]
            .binary_search_by_key(&b, |&(n, _)| n)
            .ok()
            .map(|pos| self.adjacency[a][pos].1)
    }

    /// True if `a` and `b` are bonded.
    #[must_use]
    pub fn adjacent(&self, a: usize, b: usize) -> bool {
        self.edge_between(a, b).is_some()
    }

    /// True if any atom or bond carries embedded query constraints.
    #[must_use]
    pub fn has_query_constraints(&self) -> bool {
        self.atoms.iter().any(|a| a.query.is_some()) || self.bonds.iter().any(|b| b.query.is_some())
    }
}

impl TryFrom<RawGraph> for Graph {
    type Error = GraphError;

    fn try_from(raw: RawGraph) -> Result<Self, Self::Error> {
        Self::new(raw.atoms, raw.bonds)
    }
}

impl From<Graph> for RawGraph {
    fn from(graph: Graph) -> Self {
        Self {
            atoms: graph.atoms,
            bonds: graph.bonds,
        }
    }
}
