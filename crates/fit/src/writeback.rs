//! Writing CPTs back from a joint table.
//!
//! For each node `y` the new CPT is `Q(y | parents(y))` read off the joint,
//! every row normalized. A row whose parent assignment has zero mass in the
//! joint carries no information; the node keeps its current row there.

use ipfp_core::JointDistribution;
use ipfp_network::BeliefNetwork;
use tracing::warn;

use crate::error::FitError;

/// Rows written and rows left alone by one write-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub rows_written: usize,
    pub rows_kept: usize,
}

impl WriteStats {
    pub fn absorb(&mut self, other: WriteStats) {
        self.rows_written += other.rows_written;
        self.rows_kept += other.rows_kept;
    }
}

/// Rewrite the CPT of every node in `nodes` from `q`, then compile.
///
/// `q` must contain each node and all of its parents.
pub fn write_cpts<N: BeliefNetwork + ?Sized>(
    net: &mut N,
    q: &JointDistribution,
    nodes: &[String],
) -> Result<WriteStats, FitError> {
    let mut stats = WriteStats::default();
    for node in nodes {
        let var = net.random_variable(node)?;
        let parents = net.parent_variables(node)?;
        if parents.is_empty() {
            let marginal = q.marginalize(&[var])?;
            stats.absorb(write_row(net, node, &[], marginal.values())?);
        } else {
            let cpd = q.conditional(&[var], &parents)?;
            for (row, assignment) in cpd.cond_assignments().enumerate() {
                stats.absorb(write_row(net, node, &assignment, cpd.row(row))?);
            }
        }
    }
    net.compile()?;
    Ok(stats)
}

/// Rewrite every CPT of the network from a joint over all of its nodes.
///
/// # Example
///
/// ```rust
/// use ipfp_fit::write_joint_to_network;
/// use ipfp_network::{sprinkler_network, BeliefNetwork};
///
/// let source = sprinkler_network();
/// let joint = source.full_joint().unwrap();
///
/// let mut net = sprinkler_network();
/// net.set_cpt_row("Cloudy", &[], &[0.9, 0.1]).unwrap();
/// write_joint_to_network(&mut net, &joint).unwrap();
/// assert!((net.cpt_row("Cloudy", &[]).unwrap()[0] - 0.5).abs() < 1e-9);
/// ```
pub fn write_joint_to_network<N: BeliefNetwork + ?Sized>(
    net: &mut N,
    joint: &JointDistribution,
) -> Result<WriteStats, FitError> {
    let nodes = net.node_names();
    write_cpts(net, joint, &nodes)
}

/// Normalize `row` and write it; keep the current row if it has no mass.
pub(crate) fn write_row<N: BeliefNetwork + ?Sized>(
    net: &mut N,
    node: &str,
    parent_states: &[usize],
    row: &[f64],
) -> Result<WriteStats, FitError> {
    let total: f64 = row.iter().sum();
    if total > 0.0 && total.is_finite() {
        let normalized: Vec<f64> = row.iter().map(|v| v / total).collect();
        net.set_cpt_row(node, parent_states, &normalized)?;
        Ok(WriteStats {
            rows_written: 1,
            rows_kept: 0,
        })
    } else {
        warn!(node, ?parent_states, "zero-mass CPT row, keeping current row");
        Ok(WriteStats {
            rows_written: 0,
            rows_kept: 1,
        })
    }
}
