//! # Error Types
//!
//! Every failure in the distribution algebra is a malformed argument:
//! an index outside a tensor, a variable list that overlaps or names a
//! variable the distribution does not carry, a table whose length does not
//! match its variables. Undefined ratios in conditioning are *not* errors;
//! they produce zero entries.

use thiserror::Error;

/// Errors raised by tensors, random variables and distributions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A tensor needs at least one dimension.
    #[error("Tensor must have at least one dimension")]
    NoDimensions,

    /// Every dimension must be positive.
    #[error("Dimension {axis} has size zero")]
    ZeroDimension { axis: usize },

    /// Index vector has the wrong number of components.
    #[error("Rank mismatch: expected {expected} indices, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// One component of an index vector is outside its dimension.
    #[error("Index {index} out of bounds on axis {axis} (size {size})")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        size: usize,
    },

    /// Flat offset outside the tensor.
    #[error("Offset {offset} out of bounds for {len} entries")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// Data length does not equal the product of the dimensions.
    #[error("Data length mismatch: expected {expected} entries, got {got}")]
    DataLengthMismatch { expected: usize, got: usize },

    /// Random variable with an empty name.
    #[error("Random variable name cannot be empty")]
    EmptyName,

    /// Random variable with no states.
    #[error("Random variable '{name}' has no states")]
    NoStates { name: String },

    /// Random variable with an empty state label.
    #[error("Random variable '{name}' has an empty state label")]
    EmptyState { name: String },

    /// A state label appears twice.
    #[error("Random variable '{name}' repeats state '{state}'")]
    DuplicateState { name: String, state: String },

    /// A state label the variable does not have.
    #[error("Random variable '{name}' has no state '{state}'")]
    UnknownState { name: String, state: String },

    /// A variable list that must be non-empty was empty.
    #[error("Empty variable list for {context}")]
    EmptyVariables { context: &'static str },

    /// The same variable appears twice in one list.
    #[error("Variable '{name}' appears more than once")]
    DuplicateVariable { name: String },

    /// The distribution has no variable with this name.
    #[error("Variable '{name}' is not part of the distribution")]
    UnknownVariable { name: String },

    /// Prior and condition lists share a variable.
    #[error("Variable '{name}' is both a prior and a condition")]
    OverlappingVariables { name: String },

    /// Same name, different states.
    #[error("Variable '{name}' does not match: states differ")]
    VariableMismatch { name: String },

    /// Two distributions are over different variable lists.
    #[error("Scope mismatch: [{left}] vs [{right}]")]
    ScopeMismatch { left: String, right: String },
}
