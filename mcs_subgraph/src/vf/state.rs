//! Mutable search state of one VF-core run.

use crate::mapping::{Mapping, MappingSet};

/// Dead-end mappings kept for the caller when no full embedding exists.
const MAX_PARTIALS: usize = 256;

#[derive(Debug, Default)]
pub(crate) struct VfState {
    pub(crate) mapping: Mapping,
    found: Vec<Mapping>,
    partials: Vec<Mapping>,
    best_partial: usize,
}

impl VfState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_match(&mut self) {
        self.found.push(self.mapping.clone());
    }

    pub(crate) fn found_count(&self) -> usize {
        self.found.len()
    }

    /// Keeps the current mapping if it is at least as large as every
    /// dead end seen so far.
    pub(crate) fn record_dead_end(&mut self) {
        let size = self.mapping.len();
        if size == 0 || size < self.best_partial {
            return;
        }
        if size > self.best_partial {
            self.best_partial = size;
            self.partials.clear();
        }
        if self.partials.len() < MAX_PARTIALS {
            self.partials.push(self.mapping.clone());
        }
    }

    pub(crate) fn into_sets(self) -> (MappingSet, MappingSet) {
        (MappingSet::new(self.found), MappingSet::new(self.partials))
    }
}

/// Scoped helper that maps (`query` -> `target`), runs `f`, then unmaps.
pub(crate) fn with_mapping<R>(
    st: &mut VfState,
    query: usize,
    target: usize,
    f: impl FnOnce(&mut VfState) -> R,
) -> R {
    st.mapping.assign(query, target);
    let out = f(st);
    st.mapping.remove_by_query(query);
    out
}
