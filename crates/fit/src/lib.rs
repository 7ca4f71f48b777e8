//! # Fit - Revising Networks with IPFP
//!
//! Iterative proportional fitting adjusts a distribution to a list of
//! probability constraints while staying as close as possible to where it
//! started. This crate provides it at three scales:
//!
//! - **Full joint**: [`Ipfp`] and [`run_full_joint_ipfp`] fit a materialized
//!   [`JointDistribution`](ipfp_core::JointDistribution)
//! - **Decomposed**: [`DecomposedIpfp`] and [`run_decomposed_ipfp`] revise a
//!   live [`BeliefNetwork`](ipfp_network::BeliefNetwork) one closure at a
//!   time, never building its full joint
//! - **Whole network**: [`ExtendedIpfp`] goes through the full joint of a
//!   small network and writes every CPT back
//!
//! [`SimpleDecomposedIpfp`] handles single-node constraints under hard
//! evidence.
//!
//! ## Example
//!
//! ```rust
//! use ipfp_core::{ConditionalDistribution, JointDistribution, RandomVariable};
//! use ipfp_fit::{Constraint, DecomposedConfig, DecomposedIpfp};
//! use ipfp_network::{sprinkler_network, BeliefNetwork};
//!
//! let mut net = sprinkler_network();
//! let cloudy = RandomVariable::binary("Cloudy").unwrap();
//! let rain = RandomVariable::binary("Rain").unwrap();
//!
//! let constraints = vec![
//!     Constraint::local_marginal(
//!         "Cloudy",
//!         JointDistribution::from_values(vec![cloudy.clone()], vec![0.6, 0.4]).unwrap(),
//!     )
//!     .unwrap(),
//!     Constraint::local_conditional(
//!         ConditionalDistribution::from_values(vec![rain], vec![cloudy], vec![0.7, 0.3, 0.1, 0.9])
//!             .unwrap(),
//!     )
//!     .unwrap(),
//! ];
//!
//! let solver = DecomposedIpfp::new(100, 1e-9, DecomposedConfig::default()).unwrap();
//! let report = solver.run(&mut net, &constraints).unwrap();
//! assert!(report.iterations <= 3);
//! assert!((net.beliefs("Rain").unwrap()[0] - 0.46).abs() < 1e-9);
//! ```

mod config;
mod constraint;
mod decomposed;
mod error;
mod extended;
mod ipfp;
mod projection;
mod simple;
mod writeback;

pub use config::{load_constraints, ConstraintSpec, RevisionConfig, DEFAULT_MAX_LOOPS, DEFAULT_THRESHOLD};
pub use constraint::{Constraint, Scope, Target};
pub use decomposed::{
    run_decomposed_ipfp, DecomposedConfig, DecomposedIpfp, DecomposedReport, InnerConvergence,
    LocalUpdate, DEFAULT_INNER_ITERATIONS, DEFAULT_INNER_TOLERANCE,
};
pub use error::{ErrorKind, FitError};
pub use extended::ExtendedIpfp;
pub use ipfp::{run_full_joint_ipfp, Ipfp, IpfpReport};
pub use projection::{project, project_conditional, project_marginal, projected};
pub use simple::{SimpleConstraint, SimpleDecomposedIpfp, SimpleReport};
pub use writeback::{write_cpts, write_joint_to_network, WriteStats};
