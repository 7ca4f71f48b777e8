//! Decomposed IPFP for single-node constraints under hard evidence.
//!
//! Each constraint targets one node `V` and rescales its CPT row by row:
//!
//! ```text
//! R(V):      Q'(v | π) ∝ Q(v | π) · R(v) / Q(v | e)
//! R(V | P):  Q'(v | π) ∝ Q(v | π) · R(v | p) / Q(v | p, e)
//! ```
//!
//! where `e` is the run's evidence and `p` is the parent assignment `π`
//! restricted to `P`. Passes repeat until the node beliefs under `e` stop
//! moving within a pass. A constraint that leaves every row of its node
//! without mass keeps the pass from converging.

use std::time::{Duration, Instant};

use ipfp_core::{ConditionalDistribution, CoreError};
use ipfp_network::{belief_difference, BeliefNetwork, Finding, NetworkError};
use tracing::{debug, info, info_span, trace};

use crate::decomposed::safe_ratio;
use crate::error::FitError;
use crate::ipfp::check_budget;
use crate::writeback::{write_row, WriteStats};

/// A constraint on one node.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleConstraint {
    /// `R(V)`, indexed by state.
    Marginal { node: String, probabilities: Vec<f64> },
    /// `R(V | P₁..Pₘ)` with every `Pᵢ` a parent of `V`.
    Conditional(ConditionalDistribution),
}

impl SimpleConstraint {
    pub fn marginal(node: impl Into<String>, probabilities: Vec<f64>) -> Self {
        SimpleConstraint::Marginal {
            node: node.into(),
            probabilities,
        }
    }

    /// # Errors
    ///
    /// Fails unless `r` has exactly one prior variable.
    pub fn conditional(r: ConditionalDistribution) -> Result<Self, FitError> {
        if r.priors().len() != 1 {
            return Err(FitError::PriorCount {
                count: r.priors().len(),
            });
        }
        Ok(SimpleConstraint::Conditional(r))
    }

    /// The constrained node.
    pub fn node(&self) -> &str {
        match self {
            SimpleConstraint::Marginal { node, .. } => node,
            SimpleConstraint::Conditional(r) => r.priors()[0].name(),
        }
    }

    fn validate<N: BeliefNetwork + ?Sized>(&self, net: &N) -> Result<(), FitError> {
        let var = net.random_variable(self.node())?;
        match self {
            SimpleConstraint::Marginal { probabilities, .. } => {
                if probabilities.len() != var.num_states() {
                    return Err(CoreError::DataLengthMismatch {
                        expected: var.num_states(),
                        got: probabilities.len(),
                    }
                    .into());
                }
            }
            SimpleConstraint::Conditional(r) => {
                let parents = net.parents(self.node())?;
                if parents.is_empty() {
                    return Err(FitError::ParentlessConditional {
                        node: self.node().to_string(),
                    });
                }
                for v in r.variables() {
                    if net.random_variable(v.name())? != v {
                        return Err(CoreError::VariableMismatch {
                            name: v.name().to_string(),
                        }
                        .into());
                    }
                }
                let strangers: Vec<&str> = r
                    .conds()
                    .iter()
                    .map(|v| v.name())
                    .filter(|n| !parents.iter().any(|p| p == *n))
                    .collect();
                if !strangers.is_empty() {
                    return Err(FitError::NotParents {
                        concept: self.node().to_string(),
                        variables: strangers.join(", "),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Outcome of a converged simple run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleReport {
    pub iterations: usize,
    /// Belief difference summed over the constraint steps of the last pass.
    pub distance: f64,
    pub rows_written: usize,
    pub rows_kept: usize,
    pub elapsed: Duration,
}

/// Simple decomposed IPFP with an optional set of hard findings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDecomposedIpfp {
    max_loops: usize,
    threshold: f64,
    evidence: Vec<Finding>,
}

impl SimpleDecomposedIpfp {
    pub fn new(max_loops: usize, threshold: f64) -> Result<Self, FitError> {
        check_budget(max_loops, threshold)?;
        Ok(Self {
            max_loops,
            threshold,
            evidence: Vec::new(),
        })
    }

    pub fn with_evidence(mut self, evidence: Vec<Finding>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn evidence(&self) -> &[Finding] {
        &self.evidence
    }

    /// Revise `net` in place.
    ///
    /// # Errors
    ///
    /// - InvalidArgument for empty or ill-fitting constraints, and for
    ///   evidence that is impossible under the starting network
    /// - [`FitError::NonConvergence`] when `max_loops` passes are not enough
    pub fn run<N: BeliefNetwork + Clone>(
        &self,
        net: &mut N,
        constraints: &[SimpleConstraint],
    ) -> Result<SimpleReport, FitError> {
        let _span = info_span!("simple_decomposed_ipfp", constraints = constraints.len()).entered();
        if constraints.is_empty() {
            return Err(FitError::NoConstraints);
        }
        for c in constraints {
            c.validate(net)?;
        }
        net.compile()?;
        // Surfaces unknown, conflicting or impossible findings up front.
        net.beliefs_given(constraints[0].node(), &self.evidence)?;

        info!(evidence = self.evidence.len(), "starting simple decomposed ipfp");
        let start = Instant::now();
        let mut stats = WriteStats::default();
        let mut distance = f64::INFINITY;
        for iteration in 1..=self.max_loops {
            distance = 0.0;
            let mut collapsed = false;
            for c in constraints {
                let before = net.clone();
                let written = self.apply(net, c)?;
                stats.absorb(written);
                let moved = belief_difference(&before, &*net, &self.evidence)?;
                trace!(node = c.node(), moved, "updated");
                distance += moved;
                collapsed |= written.rows_written == 0 && written.rows_kept > 0;
            }
            debug!(iteration, distance, collapsed, "simple pass");
            if distance <= self.threshold && !collapsed {
                info!(iterations = iteration, distance, "simple decomposed ipfp converged");
                return Ok(SimpleReport {
                    iterations: iteration,
                    distance,
                    rows_written: stats.rows_written,
                    rows_kept: stats.rows_kept,
                    elapsed: start.elapsed(),
                });
            }
        }
        Err(FitError::NonConvergence {
            iterations: self.max_loops,
            distance,
        })
    }

    /// Compute every new row of the node first, then write them.
    fn apply<N: BeliefNetwork + ?Sized>(
        &self,
        net: &mut N,
        constraint: &SimpleConstraint,
    ) -> Result<WriteStats, FitError> {
        let node = constraint.node();
        let mut rows: Vec<(Vec<usize>, Vec<f64>)> = Vec::new();
        match constraint {
            SimpleConstraint::Marginal { probabilities, .. } => {
                let q = net.beliefs_given(node, &self.evidence)?;
                let ratios: Vec<f64> = probabilities
                    .iter()
                    .zip(&q)
                    .map(|(&r, &q)| safe_ratio(r, q))
                    .collect();
                for pi in net.parent_assignments(node)? {
                    let row = scaled(&net.cpt_row(node, &pi)?, &ratios);
                    rows.push((pi, row));
                }
            }
            SimpleConstraint::Conditional(r) => {
                let parents = net.parents(node)?;
                let slots: Vec<usize> = r
                    .conds()
                    .iter()
                    .filter_map(|v| parents.iter().position(|p| p == v.name()))
                    .collect();
                for pi in net.parent_assignments(node)? {
                    let p: Vec<usize> = slots.iter().map(|&j| pi[j]).collect();
                    let mut evidence = self.evidence.clone();
                    evidence.extend(
                        r.conds()
                            .iter()
                            .zip(&p)
                            .map(|(v, &s)| Finding::new(v.name(), s)),
                    );
                    let q = match net.beliefs_given(node, &evidence) {
                        Ok(q) => q,
                        // The parent row is unreachable under the evidence.
                        Err(NetworkError::ImpossibleEvidence)
                        | Err(NetworkError::ConflictingEvidence { .. }) => {
                            vec![0.0; r.row_len()]
                        }
                        Err(e) => return Err(e.into()),
                    };
                    let ratios: Vec<f64> = r
                        .row(r.row_of(&p)?)
                        .iter()
                        .zip(&q)
                        .map(|(&r, &q)| safe_ratio(r, q))
                        .collect();
                    let row = scaled(&net.cpt_row(node, &pi)?, &ratios);
                    rows.push((pi, row));
                }
            }
        }

        let mut stats = WriteStats::default();
        for (pi, row) in rows {
            stats.absorb(write_row(net, node, &pi, &row)?);
        }
        net.compile()?;
        Ok(stats)
    }
}

fn scaled(row: &[f64], ratios: &[f64]) -> Vec<f64> {
    row.iter().zip(ratios).map(|(p, k)| p * k).collect()
}
