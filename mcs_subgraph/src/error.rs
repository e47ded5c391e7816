//! Error and advisory types for the search.
//!
//! Only [`McsError::InvalidInput`] (and graph construction failures) ever
//! reach the caller of [`crate::find_mcs`]. Every other variant is raised
//! inside a phase, absorbed by the engine, and reported as an [`Advisory`]
//! on the result.

use std::fmt;

use mcs_common::GraphError;
use thiserror::Error;

/// The phase of the search a condition originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Direct subgraph-isomorphism attempt.
    Isomorphism,
    /// Compatibility graph and clique enumeration.
    Clique,
    /// Greedy overlap seeding.
    Overlap,
    /// Seed extension.
    Extension,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Isomorphism => "isomorphism",
            Self::Clique => "clique",
            Self::Overlap => "overlap",
            Self::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// Errors raised by the search phases.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum McsError {
    /// An input graph cannot be searched (for example it has no vertices).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A phase exhausted its step budget.
    #[error("{phase} phase exhausted its step budget")]
    TimedOut {
        /// Phase that ran out of steps.
        phase: Phase,
    },

    /// A phase outgrew one of its configured bounds.
    #[error("{phase} phase exceeded a resource bound: {detail}")]
    ResourceExceeded {
        /// Phase that gave up.
        phase: Phase,
        /// Which bound was exceeded.
        detail: String,
    },

    /// A seed generator failed unexpectedly.
    #[error("seed generator '{generator}' failed: {reason}")]
    SeedGeneratorFailure {
        /// Generator name.
        generator: String,
        /// Failure description.
        reason: String,
    },

    /// A graph could not be assembled.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl McsError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a resource error.
    pub fn resource_exceeded(phase: Phase, detail: impl Into<String>) -> Self {
        Self::ResourceExceeded {
            phase,
            detail: detail.into(),
        }
    }
}

/// A non-fatal degradation recorded while searching.
///
/// When any advisory is present the mappings are a heuristic result and may
/// be smaller than the true maximum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// A phase stopped at its step budget and contributed its best-so-far result.
    TimedOut {
        /// Phase that ran out of steps.
        phase: Phase,
    },
    /// A phase hit a resource bound. It contributed nothing, or only its
    /// first mappings up to `Config::max_mappings`.
    ResourceExceeded {
        /// Phase that gave up.
        phase: Phase,
        /// Which bound was exceeded.
        detail: String,
    },
    /// A seed generator failed and was left out of the merge.
    SeedGeneratorFailed {
        /// Generator name.
        generator: String,
        /// Failure description.
        reason: String,
    },
}

impl Advisory {
    /// Records a seed generator's error against the generator's own phase.
    #[must_use]
    pub fn from_generator(generator: &str, phase: Phase, err: McsError) -> Self {
        match err {
            McsError::TimedOut { .. } => Self::TimedOut { phase },
            McsError::ResourceExceeded { detail, .. } => Self::ResourceExceeded { phase, detail },
            McsError::SeedGeneratorFailure { reason, .. } => Self::SeedGeneratorFailed {
                generator: generator.to_owned(),
                reason,
            },
            other @ (McsError::InvalidInput(_) | McsError::Graph(_)) => {
                Self::SeedGeneratorFailed {
                    generator: generator.to_owned(),
                    reason: other.to_string(),
                }
            }
        }
    }

    /// A phase found more tied mappings than `cap` and kept only the first `cap`.
    #[must_use]
    pub fn mapping_cap(phase: Phase, cap: usize) -> Self {
        Self::ResourceExceeded {
            phase,
            detail: format!("more than {cap} tied mappings"),
        }
    }
}
