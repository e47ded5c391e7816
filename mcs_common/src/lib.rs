//! Common model types and shared test cases for the MCS workspace.
//!
//! This crate provides the labeled graph model, configuration handling, and
//! the fixture molecules used across the project's tests.

pub mod builder;
mod config;
pub mod graph;
mod test_cases;

pub use crate::builder::GraphBuilder;
pub use crate::config::*;
pub use crate::graph::{Atom, AtomQuery, Bond, BondOrder, BondQuery, Graph, GraphError};
pub use crate::test_cases::*;
