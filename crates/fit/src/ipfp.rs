//! Full-joint IPFP: fit a materialized joint to several constraints.
//!
//! Each pass applies every constraint once, in order, to the same table
//! (Gauss–Seidel). The pass converges when the total variation between the
//! table before and after it is within the threshold. Contradictory
//! constraints drive the table to zero mass; a pass that ends with zero mass
//! never counts as converged, so such runs end in
//! [`FitError::NonConvergence`] instead of a silent all-zero result.

use std::time::{Duration, Instant};

use ipfp_core::{total_variation, JointDistribution, PROB_TOLERANCE};
use tracing::{debug, info, info_span, trace};

use crate::constraint::Target;
use crate::error::FitError;
use crate::projection::project;

/// Outcome of a converged run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IpfpReport {
    /// Passes over the constraint list.
    pub iterations: usize,
    /// Total variation of the last pass.
    pub distance: f64,
    pub elapsed: Duration,
}

/// Iteration bound and convergence threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ipfp {
    max_loops: usize,
    threshold: f64,
}

impl Ipfp {
    /// # Errors
    ///
    /// Fails if `max_loops` is zero or `threshold` is negative or not finite.
    pub fn new(max_loops: usize, threshold: f64) -> Result<Self, FitError> {
        check_budget(max_loops, threshold)?;
        Ok(Self {
            max_loops,
            threshold,
        })
    }

    pub fn max_loops(&self) -> usize {
        self.max_loops
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fit `q` in place.
    ///
    /// # Errors
    ///
    /// - InvalidArgument if `targets` is empty or a target names variables
    ///   outside `q`
    /// - [`FitError::NonConvergence`] if `max_loops` passes do not converge;
    ///   `q` holds the last iterate
    pub fn run(&self, q: &mut JointDistribution, targets: &[Target]) -> Result<IpfpReport, FitError> {
        let _span = info_span!("ipfp", constraints = targets.len()).entered();
        if targets.is_empty() {
            return Err(FitError::NoConstraints);
        }
        for t in targets {
            q.axes_of(&t.variables())?;
        }

        let start = Instant::now();
        let mut distance = f64::INFINITY;
        for iteration in 1..=self.max_loops {
            let previous = q.clone();
            for t in targets {
                project(q, t)?;
                trace!(constraint = %t.describe(), mass = q.sum(), "projected");
            }
            distance = total_variation(&previous, q)?;
            let collapsed = q.sum() <= PROB_TOLERANCE;
            debug!(iteration, distance, collapsed, "ipfp pass");

            if distance <= self.threshold && !collapsed {
                let report = IpfpReport {
                    iterations: iteration,
                    distance,
                    elapsed: start.elapsed(),
                };
                info!(iterations = iteration, distance, "ipfp converged");
                return Ok(report);
            }
        }
        Err(FitError::NonConvergence {
            iterations: self.max_loops,
            distance,
        })
    }
}

/// Fit a copy of `initial` to `targets`.
///
/// # Example
///
/// ```rust
/// use ipfp_core::{JointDistribution, RandomVariable};
/// use ipfp_fit::{run_full_joint_ipfp, Target};
///
/// let a = RandomVariable::binary("A").unwrap();
/// let b = RandomVariable::binary("B").unwrap();
/// let q = JointDistribution::uniform(vec![a.clone(), b.clone()]).unwrap();
/// let targets = vec![
///     Target::Marginal(JointDistribution::from_values(vec![a], vec![0.7, 0.3]).unwrap()),
///     Target::Marginal(JointDistribution::from_values(vec![b], vec![0.2, 0.8]).unwrap()),
/// ];
///
/// let fitted = run_full_joint_ipfp(&q, &targets, 50, 1e-9).unwrap();
/// assert!((fitted.values()[0] - 0.14).abs() < 1e-9);
/// ```
pub fn run_full_joint_ipfp(
    initial: &JointDistribution,
    targets: &[Target],
    max_loops: usize,
    threshold: f64,
) -> Result<JointDistribution, FitError> {
    let mut q = initial.clone();
    Ipfp::new(max_loops, threshold)?.run(&mut q, targets)?;
    Ok(q)
}

pub(crate) fn check_budget(max_loops: usize, threshold: f64) -> Result<(), FitError> {
    if max_loops == 0 {
        return Err(FitError::InvalidConfig {
            reason: "max_loops must be at least 1".to_string(),
        });
    }
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(FitError::InvalidConfig {
            reason: format!("threshold must be finite and non-negative, got {}", threshold),
        });
    }
    Ok(())
}
