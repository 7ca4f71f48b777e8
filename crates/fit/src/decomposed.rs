//! Decomposed IPFP: revise a network's CPTs without materializing its joint.
//!
//! For one constraint `R` over `Y` the orchestrator
//!
//! 1. computes a closure `(Y', S)` of `Y` (loose or strict),
//! 2. asks the network for the local joint `Q(Y' ∪ S)`,
//! 3. projects it onto `R`,
//! 4. writes `Q(y | parents(y))` back as the CPT of every `y ∈ Y'`,
//! 5. optionally repeats 2–4 until the local joint stops moving.
//!
//! Local constraints can skip the closure and rescale the concept's CPT
//! directly:
//!
//! ```text
//! R(C, L):  Q'(c | π) ∝ Q(c | π) · R(c, l) / Q(c, l)
//! R(C | L): Q'(c | π) ∝ Q(c | π) · R(c | l) / Q(c | l)
//! ```
//!
//! where `l` is the restriction of the parent assignment `π` to `L`.
//!
//! The outer loop repeats the whole constraint list until a pass is quiet:
//! the total variation of the relevant joint (the union of every
//! constraint's closure domain), summed over the constraint steps of the
//! pass, is within the threshold. A pass in which some constraint has no
//! support left is never quiet.
//!
//! ## Strategy
//!
//! [`DecomposedConfig`] has three independent axes:
//!
//! | Axis | Options |
//! |------|---------|
//! | `closure` | [`ClosureKind::Loose`], [`ClosureKind::Strict`] |
//! | `inner` | [`InnerConvergence::SinglePass`], [`InnerConvergence::IterateToTolerance`] |
//! | `local_update` | [`LocalUpdate::Direct`], [`LocalUpdate::ViaClosure`] |
//!
//! [`DecomposedConfig::variant`] maps the classic numbering 1–8 onto these.

use std::time::{Duration, Instant};

use ipfp_core::{total_variation, RandomVariable, Tensor};
use ipfp_network::{closure, BeliefNetwork, ClosureKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace, warn};

use crate::constraint::{Constraint, Scope, Target};
use crate::error::FitError;
use crate::ipfp::check_budget;
use crate::projection::project;
use crate::writeback::{write_cpts, write_row, WriteStats};

/// Default tolerance for the inner loop.
pub const DEFAULT_INNER_TOLERANCE: f64 = 0.005;

/// Default bound on inner iterations.
pub const DEFAULT_INNER_ITERATIONS: usize = 100;

/// Whether to repeat a single constraint's update until it settles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InnerConvergence {
    /// One extract/project/write-back round per constraint.
    SinglePass,
    /// Repeat until the total variation between the projected local joint
    /// and the network's local joint after write-back is within `tolerance`.
    ///
    /// Hitting `max_iterations` is logged, not fatal: the outer loop still
    /// decides convergence.
    IterateToTolerance {
        tolerance: f64,
        max_iterations: usize,
    },
}

impl Default for InnerConvergence {
    fn default() -> Self {
        InnerConvergence::IterateToTolerance {
            tolerance: DEFAULT_INNER_TOLERANCE,
            max_iterations: DEFAULT_INNER_ITERATIONS,
        }
    }
}

/// How local constraints are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalUpdate {
    /// Rescale the concept's CPT in place.
    #[default]
    Direct,
    /// Treat them like nonlocal constraints.
    ViaClosure,
}

/// Strategy of the decomposed orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposedConfig {
    pub closure: ClosureKind,
    pub inner: InnerConvergence,
    pub local_update: LocalUpdate,
}

impl DecomposedConfig {
    /// Classic variants 1–8.
    ///
    /// | Variant | Local update | Closure | Inner |
    /// |---------|--------------|---------|-------|
    /// | 1 | direct | loose | single pass |
    /// | 2 | direct | loose | iterate |
    /// | 3 | direct | strict | single pass |
    /// | 4 | direct | strict | iterate |
    /// | 5–8 | via closure | as 1–4 | as 1–4 |
    ///
    /// Variant 2 is the default.
    pub fn variant(n: u8) -> Result<Self, FitError> {
        if !(1..=8).contains(&n) {
            return Err(FitError::InvalidConfig {
                reason: format!("variant must be in 1..=8, got {}", n),
            });
        }
        let k = n - 1;
        Ok(Self {
            local_update: if k < 4 {
                LocalUpdate::Direct
            } else {
                LocalUpdate::ViaClosure
            },
            closure: if k % 4 < 2 {
                ClosureKind::Loose
            } else {
                ClosureKind::Strict
            },
            inner: if k % 2 == 0 {
                InnerConvergence::SinglePass
            } else {
                InnerConvergence::default()
            },
        })
    }

    pub fn with_closure(mut self, closure: ClosureKind) -> Self {
        self.closure = closure;
        self
    }

    pub fn with_inner(mut self, inner: InnerConvergence) -> Self {
        self.inner = inner;
        self
    }

    pub fn with_local_update(mut self, local_update: LocalUpdate) -> Self {
        self.local_update = local_update;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), FitError> {
        if let InnerConvergence::IterateToTolerance {
            tolerance,
            max_iterations,
        } = self.inner
        {
            if !tolerance.is_finite() || tolerance < 0.0 || max_iterations == 0 {
                return Err(FitError::InvalidConfig {
                    reason: format!(
                        "inner tolerance {} / max_iterations {} out of range",
                        tolerance, max_iterations
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Outcome of a converged decomposed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedReport {
    /// Outer passes over the constraint list.
    pub iterations: usize,
    /// Movement of the relevant joint, summed over the steps of the last pass.
    pub distance: f64,
    /// Extract/project/write-back rounds, summed over constraints and passes.
    pub constraint_steps: usize,
    pub rows_written: usize,
    /// Zero-mass rows left at their previous value.
    pub rows_kept: usize,
    pub elapsed: Duration,
}

/// Decomposed IPFP over a live network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedIpfp {
    config: DecomposedConfig,
    max_loops: usize,
    threshold: f64,
}

impl DecomposedIpfp {
    /// # Errors
    ///
    /// Fails on a zero iteration bound, a negative or non-finite threshold,
    /// or an out-of-range inner tolerance.
    pub fn new(max_loops: usize, threshold: f64, config: DecomposedConfig) -> Result<Self, FitError> {
        check_budget(max_loops, threshold)?;
        config.validate()?;
        Ok(Self {
            config,
            max_loops,
            threshold,
        })
    }

    pub fn config(&self) -> &DecomposedConfig {
        &self.config
    }

    /// Revise `net` in place until every constraint holds.
    ///
    /// # Errors
    ///
    /// - InvalidArgument if `constraints` is empty or a constraint does not
    ///   fit the network (unknown variables, non-parents in a local scope)
    /// - [`FitError::NonConvergence`] if `max_loops` passes do not converge;
    ///   the network keeps the last iterate
    pub fn run<N: BeliefNetwork + ?Sized>(
        &self,
        net: &mut N,
        constraints: &[Constraint],
    ) -> Result<DecomposedReport, FitError> {
        let _span = info_span!("decomposed_ipfp", constraints = constraints.len()).entered();
        if constraints.is_empty() {
            return Err(FitError::NoConstraints);
        }
        for c in constraints {
            c.validate(net)?;
        }
        let start = Instant::now();
        net.compile()?;

        let relevant = self.relevant_variables(net, constraints)?;
        info!(
            relevant = relevant.len(),
            closure = ?self.config.closure,
            "starting decomposed ipfp"
        );

        let mut stats = WriteStats::default();
        let mut steps = 0;
        let mut before = net.joint_distribution(&relevant)?;
        let mut distance = f64::INFINITY;
        for iteration in 1..=self.max_loops {
            distance = 0.0;
            let mut collapsed = false;
            for c in constraints {
                let step = self.apply(net, c, &mut stats)?;
                steps += step.rounds;
                collapsed |= step.collapsed;
                let after = net.joint_distribution(&relevant)?;
                distance += total_variation(&before, &after)?;
                before = after;
            }
            debug!(iteration, distance, collapsed, "decomposed pass");

            if distance <= self.threshold && !collapsed {
                info!(iterations = iteration, distance, "decomposed ipfp converged");
                return Ok(DecomposedReport {
                    iterations: iteration,
                    distance,
                    constraint_steps: steps,
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

    /// Union of every constraint's update domain, in first-seen order.
    fn relevant_variables<N: BeliefNetwork + ?Sized>(
        &self,
        net: &N,
        constraints: &[Constraint],
    ) -> Result<Vec<RandomVariable>, FitError> {
        let mut names: Vec<String> = Vec::new();
        for c in constraints {
            let domain = match (c.scope(), self.config.local_update) {
                (Scope::Local { concept }, LocalUpdate::Direct) => {
                    let mut d = vec![concept.clone()];
                    d.extend(net.parents(concept)?);
                    d
                }
                _ => closure(net, &c.target().names(), self.config.closure)?.domain(),
            };
            for n in domain {
                if !names.contains(&n) {
                    names.push(n);
                }
            }
        }
        Ok(net.random_variables(&names)?)
    }

    fn apply<N: BeliefNetwork + ?Sized>(
        &self,
        net: &mut N,
        constraint: &Constraint,
        stats: &mut WriteStats,
    ) -> Result<Step, FitError> {
        match (constraint.scope(), self.config.local_update) {
            (Scope::Local { concept }, LocalUpdate::Direct) => {
                let written = update_local(net, concept, constraint.target())?;
                stats.absorb(written);
                Ok(Step {
                    rounds: 1,
                    collapsed: written.rows_written == 0 && written.rows_kept > 0,
                })
            }
            _ => self.update_via_closure(net, constraint.target(), stats),
        }
    }

    fn update_via_closure<N: BeliefNetwork + ?Sized>(
        &self,
        net: &mut N,
        target: &Target,
        stats: &mut WriteStats,
    ) -> Result<Step, FitError> {
        let c = closure(net, &target.names(), self.config.closure)?;
        let domain = net.random_variables(&c.domain())?;
        trace!(
            constraint = %target.describe(),
            updated = ?c.updated,
            residual = ?c.residual,
            "closure"
        );

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut q = net.joint_distribution(&domain)?;
            project(&mut q, target)?;
            if !q.normalize() {
                warn!(
                    constraint = %target.describe(),
                    round = rounds,
                    "projection left no mass, network unchanged"
                );
                return Ok(Step {
                    rounds,
                    collapsed: true,
                });
            }
            stats.absorb(write_cpts(net, &q, &c.updated)?);

            let done = Step {
                rounds,
                collapsed: false,
            };
            match self.config.inner {
                InnerConvergence::SinglePass => return Ok(done),
                InnerConvergence::IterateToTolerance {
                    tolerance,
                    max_iterations,
                } => {
                    let after = net.joint_distribution(&domain)?;
                    let tv = total_variation(&q, &after)?;
                    trace!(round = rounds, tv, "inner round");
                    if tv <= tolerance {
                        return Ok(done);
                    }
                    if rounds >= max_iterations {
                        warn!(
                            constraint = %target.describe(),
                            rounds,
                            tv,
                            "inner loop hit its bound"
                        );
                        return Ok(done);
                    }
                }
            }
        }
    }
}

/// Outcome of applying one constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    rounds: usize,
    /// The constraint found no support and nothing was written.
    collapsed: bool,
}

/// Rescale the CPT of `concept` directly from a local constraint.
fn update_local<N: BeliefNetwork + ?Sized>(
    net: &mut N,
    concept: &str,
    target: &Target,
) -> Result<WriteStats, FitError> {
    let parents = net.parents(concept)?;
    let var = net.random_variable(concept)?;
    let k = var.num_states();

    // Parentless: the constraint is R(C) and the CPT becomes R(C).
    if parents.is_empty() {
        let r = match target {
            Target::Marginal(r) => r.marginalize(&[var])?,
            Target::Conditional(_) => {
                return Err(FitError::ParentlessConditional {
                    node: concept.to_string(),
                })
            }
        };
        let stats = write_row(net, concept, &[], r.values())?;
        net.compile()?;
        return Ok(stats);
    }

    // R / Q over the constraint's variables, laid out like its table.
    let (ratio_vars, r_values, q_values) = match target {
        Target::Marginal(r) => {
            let q = net.joint_distribution(r.variables())?;
            (r.variables().to_vec(), r.values().to_vec(), q.values().to_vec())
        }
        Target::Conditional(r) => {
            let vars = r.variables();
            let q = net
                .joint_distribution(&vars)?
                .conditional(r.priors(), r.conds())?;
            (vars, r.values().to_vec(), q.values().to_vec())
        }
    };
    let ratio = Tensor::from_data(
        ratio_vars.iter().map(RandomVariable::num_states).collect(),
        r_values
            .iter()
            .zip(&q_values)
            .map(|(&r, &q)| safe_ratio(r, q))
            .collect(),
    )?;

    // Position of each ratio axis among the concept's parents, `None` for
    // the concept itself.
    let slots: Vec<Option<usize>> = ratio_vars
        .iter()
        .map(|v| {
            if v.name() == concept {
                None
            } else {
                parents.iter().position(|p| p == v.name())
            }
        })
        .collect();

    let mut rows: Vec<(Vec<usize>, Vec<f64>)> = Vec::new();
    for assignment in net.parent_assignments(concept)? {
        let old = net.cpt_row(concept, &assignment)?;
        let mut idx = vec![0; slots.len()];
        let mut row = Vec::with_capacity(k);
        for (state, &p) in old.iter().enumerate() {
            for (i, slot) in slots.iter().enumerate() {
                idx[i] = match slot {
                    Some(j) => assignment[*j],
                    None => state,
                };
            }
            row.push(p * ratio.get(&idx)?);
        }
        rows.push((assignment, row));
    }

    let mut stats = WriteStats::default();
    for (assignment, row) in rows {
        stats.absorb(write_row(net, concept, &assignment, &row)?);
    }
    net.compile()?;
    Ok(stats)
}

/// `r / q`, zero when either is zero.
pub(crate) fn safe_ratio(r: f64, q: f64) -> f64 {
    if r == 0.0 || q == 0.0 {
        0.0
    } else {
        r / q
    }
}

/// Revise `net` with the default strategy (direct local updates, loose
/// closure, iterate each constraint to a tolerance of 0.005).
///
/// # Example
///
/// ```rust
/// use ipfp_core::{JointDistribution, RandomVariable};
/// use ipfp_fit::{run_decomposed_ipfp, Constraint};
/// use ipfp_network::{sprinkler_network, BeliefNetwork};
///
/// let mut net = sprinkler_network();
/// let rain = RandomVariable::binary("Rain").unwrap();
/// let r = JointDistribution::from_values(vec![rain], vec![0.7, 0.3]).unwrap();
/// let constraints = vec![Constraint::local_marginal("Rain", r).unwrap()];
///
/// run_decomposed_ipfp(&mut net, &constraints, 50, 1e-6).unwrap();
/// assert!((net.beliefs("Rain").unwrap()[0] - 0.7).abs() < 1e-4);
/// ```
pub fn run_decomposed_ipfp<N: BeliefNetwork + ?Sized>(
    net: &mut N,
    constraints: &[Constraint],
    max_loops: usize,
    threshold: f64,
) -> Result<DecomposedReport, FitError> {
    DecomposedIpfp::new(max_loops, threshold, DecomposedConfig::default())?.run(net, constraints)
}
