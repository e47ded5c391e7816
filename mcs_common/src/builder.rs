//! Programmatic graph assembly.
//!
//! Stands in for a structure loader: callers add atoms and bonds, mark the
//! rings they already know about, and get a validated [`Graph`] back.

use crate::graph::{Atom, Bond, BondOrder, Graph, GraphError};

/// Incremental builder for [`Graph`].
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an atom and returns its index.
    pub fn atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Adds a plain atom of `element` and returns its index.
    pub fn element(&mut self, element: &str) -> usize {
        self.atom(Atom::new(element))
    }

    /// Adds a bond and returns its index.
    pub fn bond(&mut self, begin: usize, end: usize, order: BondOrder) -> usize {
        self.bonds.push(Bond::new(begin, end, order));
        self.bonds.len() - 1
    }

    /// Adds `n` atoms of `element` joined in a chain by `order` bonds.
    pub fn chain(&mut self, element: &str, n: usize, order: BondOrder) -> Vec<usize> {
        let members: Vec<usize> = (0..n).map(|_| self.element(element)).collect();
        for pair in members.windows(2) {
            self.bond(pair[0], pair[1], order);
        }
        members
    }

    /// Closes `members` into a ring with `order` bonds and marks ring membership.
    ///
    /// Bonds that already exist between consecutive members are reused.
    pub fn ring(&mut self, members: &[usize], order: BondOrder) {
        let n = members.len();
        for i in 0..n {
            let (a, b) = (members[i], members[(i + 1) % n]);
            if self.find_bond(a, b).is_none() {
                self.bond(a, b, order);
            }
        }
        self.mark_ring(members);
    }

    /// Records that `members` (in cyclic order) form a ring.
    pub fn mark_ring(&mut self, members: &[usize]) {
        let n = members.len();
        let Ok(size) = u8::try_from(n) else {
            tracing::warn!("ring of {} atoms exceeds the ring-size label range", n);
            return;
        };
        for i in 0..n {
            let (a, b) = (members[i], members[(i + 1) % n]);
            if let Some(atom) = self.atoms.get_mut(a) {
                atom.add_ring_size(size);
            }
            if let Some(edge) = self.find_bond(a, b) {
                self.bonds[edge].in_ring = true;
            }
        }
    }

    /// Adds `n` aromatic atoms of `element` closed into an aromatic ring.
    pub fn aromatic_ring(&mut self, element: &str, n: usize) -> Vec<usize> {
        let members: Vec<usize> = (0..n)
            .map(|_| self.atom(Atom::new(element).with_aromatic(true)))
            .collect();
        self.ring(&members, BondOrder::Aromatic);
        members
    }

    /// Mutable access to an atom already added.
    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    fn find_bond(&self, a: usize, b: usize) -> Option<usize> {
        self.bonds
            .iter()
            .position(|bond| bond.touches(a) && bond.touches(b) && a != b)
    }

    /// Validates and freezes the graph.
    ///
    /// # Errors
    ///
    /// Propagates [`GraphError`] from [`Graph::new`].
    pub fn build(self) -> Result<Graph, GraphError> {
        Graph::new(self.atoms, self.bonds)
    }
}
