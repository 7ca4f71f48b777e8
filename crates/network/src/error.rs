//! Error types for network queries and CPT updates.

use ipfp_core::CoreError;
use thiserror::Error;

/// Errors raised by a [`BeliefNetwork`](crate::BeliefNetwork) or the
/// closure algorithms.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    /// Malformed variable, distribution or index.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No node with this name.
    #[error("Unknown node '{name}'")]
    UnknownNode { name: String },

    /// A node with this name already exists.
    #[error("Node '{name}' already exists")]
    DuplicateNode { name: String },

    /// A node lists the same parent twice.
    #[error("Node '{node}' lists parent '{parent}' more than once")]
    DuplicateParent { node: String, parent: String },

    /// CPT has the wrong number of rows or row length.
    #[error("CPT of '{node}' has the wrong shape: expected {expected} entries, got {got}")]
    CptShape {
        node: String,
        expected: usize,
        got: usize,
    },

    /// Parent assignment has the wrong length or an out-of-range state.
    #[error("Invalid parent assignment {states:?} for '{node}'")]
    ParentAssignment { node: String, states: Vec<usize> },

    /// A CPT entry is negative or not finite.
    #[error("CPT of '{node}' row {row} has an invalid entry {value}")]
    InvalidEntry { node: String, row: usize, value: f64 },

    /// A CPT row does not sum to one.
    #[error("CPT of '{node}' row {row} not normalized: sum = {sum}")]
    RowNotNormalized { node: String, row: usize, sum: f64 },

    /// The same node appears twice in a set of findings with different states.
    #[error("Conflicting findings for '{node}'")]
    ConflictingEvidence { node: String },

    /// The findings have probability zero under the network.
    #[error("Evidence has zero probability")]
    ImpossibleEvidence,

    /// Closure requested for an empty variable set.
    #[error("Closure of an empty variable set")]
    EmptyClosure,
}
