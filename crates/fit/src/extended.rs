//! Extended IPFP: fit the whole network through its full joint.
//!
//! Each pass reads the full joint, applies every target once, and writes
//! every CPT back from the projected table. Only practical for small
//! networks, but it needs no closure and works for any mix of targets.

use std::time::Instant;

use ipfp_core::{total_variation, CoreError};
use ipfp_network::BeliefNetwork;
use tracing::{debug, info, info_span, warn};

use crate::constraint::Target;
use crate::error::FitError;
use crate::ipfp::{check_budget, IpfpReport};
use crate::projection::project;
use crate::writeback::write_joint_to_network;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedIpfp {
    max_loops: usize,
    threshold: f64,
}

impl ExtendedIpfp {
    pub fn new(max_loops: usize, threshold: f64) -> Result<Self, FitError> {
        check_budget(max_loops, threshold)?;
        Ok(Self {
            max_loops,
            threshold,
        })
    }

    /// Revise `net` in place.
    ///
    /// Converged when the total variation between the joint before a pass
    /// and the network's joint after write-back is within the threshold.
    /// A pass whose projection leaves no mass changes nothing and never
    /// counts as converged.
    pub fn run<N: BeliefNetwork + ?Sized>(
        &self,
        net: &mut N,
        targets: &[Target],
    ) -> Result<IpfpReport, FitError> {
        let _span = info_span!("extended_ipfp", constraints = targets.len()).entered();
        if targets.is_empty() {
            return Err(FitError::NoConstraints);
        }
        for v in targets.iter().flat_map(Target::variables) {
            if net.random_variable(v.name())? != v {
                return Err(CoreError::VariableMismatch {
                    name: v.name().to_string(),
                }
                .into());
            }
        }
        net.compile()?;

        let start = Instant::now();
        info!(nodes = net.node_names().len(), "starting extended ipfp");
        let mut distance = f64::INFINITY;
        for iteration in 1..=self.max_loops {
            let before = net.full_joint()?;
            let mut q = before.clone();
            for t in targets {
                project(&mut q, t)?;
            }
            if !q.normalize() {
                warn!(iteration, "projection left no mass, network unchanged");
                continue;
            }
            write_joint_to_network(net, &q)?;
            let after = net.joint_distribution(before.variables())?;
            distance = total_variation(&before, &after)?;
            debug!(iteration, distance, "extended pass");

            if distance <= self.threshold {
                info!(iterations = iteration, distance, "extended ipfp converged");
                return Ok(IpfpReport {
                    iterations: iteration,
                    distance,
                    elapsed: start.elapsed(),
                });
            }
        }
        Err(FitError::NonConvergence {
            iterations: self.max_loops,
            distance,
        })
    }
}
