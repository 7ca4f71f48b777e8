//! # Network - Bayesian Networks as a Capability
//!
//! The fitting procedures never touch CPT storage directly. They talk to a
//! [`BeliefNetwork`]: query parents and states, ask for exact joint
//! probabilities, read and overwrite CPT rows, recompile. Any engine that
//! answers those questions can be revised.
//!
//! This crate also provides:
//!
//! - [`BayesNet`]: an in-memory reference network on a petgraph DAG
//! - **Closures**: loose and strict closures over the parent relation
//! - **Diffs**: belief difference and full-joint total variation between
//!   two networks
//!
//! ## Example
//!
//! ```rust
//! use ipfp_network::{sprinkler_network, strict_closure, BeliefNetwork};
//!
//! let net = sprinkler_network();
//! let vars = vec!["Cloudy".to_string(), "WetGrass".to_string()];
//! let closure = strict_closure(&net, &vars).unwrap();
//! assert_eq!(closure.updated.len(), 4);
//!
//! let p_rain = net.beliefs("Rain").unwrap();
//! assert!((p_rain[0] - 0.5).abs() < 1e-9);
//! ```

mod bayesnet;
mod closure;
mod diff;
mod error;
mod network;

pub use bayesnet::{sprinkler_network, BayesNet, NORMALIZATION_TOLERANCE};
pub use closure::{closure, is_descendant, loose_closure, strict_closure, Closure, ClosureKind};
pub use diff::{belief_difference, compare_networks, NetworkDiff};
pub use error::NetworkError;
pub use network::{BeliefNetwork, Finding};
