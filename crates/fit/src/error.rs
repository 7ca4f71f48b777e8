//! Error types for the fitting procedures.
//!
//! Every failure falls into one of two kinds:
//!
//! - [`ErrorKind::InvalidArgument`]: a malformed constraint, an unknown
//!   variable, a constraint that does not fit the network's structure, or a
//!   bad configuration. Raised before (or at the first step of) a run.
//! - [`ErrorKind::NonConvergence`]: the iteration budget ran out before the
//!   threshold was met. Carries the iteration count and the last distance.
//!
//! Undefined divergences are values ([`ipfp_core::Divergence::Undefined`]),
//! not errors.

use ipfp_core::CoreError;
use ipfp_network::NetworkError;
use thiserror::Error;

/// Coarse classification of a [`FitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NonConvergence,
}

/// Errors raised by projections and convergence loops.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    /// Malformed distribution or variable list.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Network query or CPT update failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The iteration bound was exhausted before the threshold was met.
    #[error("Did not converge after {iterations} iterations (last distance {distance})")]
    NonConvergence { iterations: usize, distance: f64 },

    /// A run needs at least one constraint.
    #[error("No constraints given")]
    NoConstraints,

    /// A nonlocal marginal constraint over fewer than two variables.
    #[error("Nonlocal marginal constraint needs at least two variables, got {count}")]
    NonlocalTooSmall { count: usize },

    /// A local constraint whose target concept is not among its variables.
    #[error("Local constraint does not mention its concept '{concept}'")]
    MissingConcept { concept: String },

    /// A local or simple conditional constraint with more than one prior.
    #[error("Expected exactly one prior variable, got {count}")]
    PriorCount { count: usize },

    /// A local constraint whose other variables are not parents of the concept.
    #[error("Variables [{variables}] are not parents of '{concept}'")]
    NotParents { concept: String, variables: String },

    /// A simple conditional constraint on a node without parents.
    #[error("Conditional constraint on parentless node '{node}'")]
    ParentlessConditional { node: String },

    /// Configuration out of range.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Malformed JSON configuration or constraint file.
    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl FitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FitError::NonConvergence { .. } => ErrorKind::NonConvergence,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

impl From<serde_json::Error> for FitError {
    fn from(e: serde_json::Error) -> Self {
        FitError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let nc = FitError::NonConvergence {
            iterations: 5,
            distance: 1.0,
        };
        assert_eq!(nc.kind(), ErrorKind::NonConvergence);
        assert!(nc.to_string().contains("5 iterations"));
        assert_eq!(FitError::NoConstraints.kind(), ErrorKind::InvalidArgument);
        let core: FitError = CoreError::EmptyName.into();
        assert_eq!(core.kind(), ErrorKind::InvalidArgument);
    }
}
