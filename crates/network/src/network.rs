//! The capability surface a Bayesian-network engine exposes to the fitting
//! procedures.
//!
//! Six required methods cover everything: structure (`node_names`,
//! `parents`, `states`), exact joint queries (`joint_belief`), and CPT access
//! (`cpt_row`, `set_cpt_row`, `compile`). Everything else, including
//! materializing joint tables and beliefs under hard evidence, is derived from
//! those and can be overridden when an engine has a faster path.

use ipfp_core::{CoreError, Indices, JointDistribution, RandomVariable};
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// A hard-evidence finding: `node` is observed in state `state`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub node: String,
    pub state: usize,
}

impl Finding {
    pub fn new(node: impl Into<String>, state: usize) -> Self {
        Self {
            node: node.into(),
            state,
        }
    }
}

/// A discrete Bayesian network that can be queried and revised in place.
///
/// Implementations must answer `joint_belief` against the CPTs as they stand
/// after the last `set_cpt_row` once `compile` has been called. Callers
/// serialize access: a network is revised by one procedure at a time.
pub trait BeliefNetwork {
    /// Every node, in a stable order.
    fn node_names(&self) -> Vec<String>;

    /// Parents of `node`, in CPT row order.
    fn parents(&self, node: &str) -> Result<Vec<String>, NetworkError>;

    /// State labels of `node`.
    fn states(&self, node: &str) -> Result<Vec<String>, NetworkError>;

    /// `P(nodes[0] = states[0], ..., nodes[k] = states[k])`.
    fn joint_belief(&self, nodes: &[&str], states: &[usize]) -> Result<f64, NetworkError>;

    /// `P(node | parents = parent_states)`. Parentless nodes take `&[]`.
    fn cpt_row(&self, node: &str, parent_states: &[usize]) -> Result<Vec<f64>, NetworkError>;

    /// Overwrite one CPT row. Parentless nodes take `&[]`.
    fn set_cpt_row(
        &mut self,
        node: &str,
        parent_states: &[usize],
        probs: &[f64],
    ) -> Result<(), NetworkError>;

    /// Recompute beliefs after CPT changes.
    fn compile(&mut self) -> Result<(), NetworkError>;

    // ------------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------------

    fn random_variable(&self, node: &str) -> Result<RandomVariable, NetworkError> {
        Ok(RandomVariable::new(node, self.states(node)?)?)
    }

    fn random_variables(&self, nodes: &[String]) -> Result<Vec<RandomVariable>, NetworkError> {
        nodes.iter().map(|n| self.random_variable(n)).collect()
    }

    /// Parents of `node` as random variables, in CPT row order.
    fn parent_variables(&self, node: &str) -> Result<Vec<RandomVariable>, NetworkError> {
        self.random_variables(&self.parents(node)?)
    }

    /// Every parent assignment of `node`, in CPT row order.
    ///
    /// A parentless node has exactly one (empty) assignment.
    fn parent_assignments(&self, node: &str) -> Result<Indices, NetworkError> {
        let cards: Vec<usize> = self
            .parent_variables(node)?
            .iter()
            .map(RandomVariable::num_states)
            .collect();
        Ok(Indices::over(&cards))
    }

    /// Joint table over `vars`, one `joint_belief` query per entry.
    fn joint_distribution(&self, vars: &[RandomVariable]) -> Result<JointDistribution, NetworkError> {
        check_against_network(self, vars)?;
        let mut joint = JointDistribution::new(vars.to_vec())?;
        let names: Vec<&str> = vars.iter().map(RandomVariable::name).collect();
        let assignments = joint.table().indices();
        for (offset, idx) in assignments.enumerate() {
            joint.values_mut()[offset] = self.joint_belief(&names, &idx)?;
        }
        Ok(joint)
    }

    /// Joint table over every node, in `node_names` order.
    fn full_joint(&self) -> Result<JointDistribution, NetworkError> {
        let vars = self.random_variables(&self.node_names())?;
        self.joint_distribution(&vars)
    }

    /// Marginal beliefs of `node`.
    fn beliefs(&self, node: &str) -> Result<Vec<f64>, NetworkError> {
        self.beliefs_given(node, &[])
    }

    /// Beliefs of `node` given hard evidence.
    ///
    /// # Errors
    ///
    /// Fails on unknown nodes or states, on two findings for the same node
    /// with different states, and with [`NetworkError::ImpossibleEvidence`]
    /// when the evidence has probability zero.
    fn beliefs_given(&self, node: &str, evidence: &[Finding]) -> Result<Vec<f64>, NetworkError> {
        let n = self.random_variable(node)?.num_states();
        let (mut names, mut states) = evidence_assignment(self, evidence)?;

        let p_evidence = if names.is_empty() {
            1.0
        } else {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            self.joint_belief(&refs, &states)?
        };
        if p_evidence <= 0.0 {
            return Err(NetworkError::ImpossibleEvidence);
        }

        if let Some(pos) = names.iter().position(|x| x == node) {
            let mut point = vec![0.0; n];
            point[states[pos]] = 1.0;
            return Ok(point);
        }

        names.push(node.to_string());
        states.push(0);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let last = states.len() - 1;
        (0..n)
            .map(|s| {
                states[last] = s;
                Ok(self.joint_belief(&refs, &states)? / p_evidence)
            })
            .collect()
    }

    /// All CPT rows of `node`, in parent-assignment order.
    fn cpt(&self, node: &str) -> Result<Vec<Vec<f64>>, NetworkError> {
        self.parent_assignments(node)?
            .map(|parents| self.cpt_row(node, &parents))
            .collect()
    }

    /// Overwrite every CPT row of `node`.
    fn set_cpt(&mut self, node: &str, rows: &[Vec<f64>]) -> Result<(), NetworkError> {
        let assignments: Vec<Vec<usize>> = self.parent_assignments(node)?.collect();
        if assignments.len() != rows.len() {
            return Err(NetworkError::CptShape {
                node: node.to_string(),
                expected: assignments.len(),
                got: rows.len(),
            });
        }
        for (parents, row) in assignments.iter().zip(rows) {
            self.set_cpt_row(node, parents, row)?;
        }
        Ok(())
    }
}

/// Every variable must exist in the network with the same states.
pub(crate) fn check_against_network<N: BeliefNetwork + ?Sized>(
    net: &N,
    vars: &[RandomVariable],
) -> Result<(), NetworkError> {
    for v in vars {
        if net.random_variable(v.name())? != *v {
            return Err(CoreError::VariableMismatch {
                name: v.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Validated, de-duplicated node names and states of a set of findings.
pub(crate) fn evidence_assignment<N: BeliefNetwork + ?Sized>(
    net: &N,
    evidence: &[Finding],
) -> Result<(Vec<String>, Vec<usize>), NetworkError> {
    let mut names: Vec<String> = Vec::new();
    let mut states: Vec<usize> = Vec::new();
    for f in evidence {
        let var = net.random_variable(&f.node)?;
        if f.state >= var.num_states() {
            return Err(CoreError::IndexOutOfBounds {
                axis: 0,
                index: f.state,
                size: var.num_states(),
            }
            .into());
        }
        match names.iter().position(|n| n == &f.node) {
            Some(i) if states[i] != f.state => {
                return Err(NetworkError::ConflictingEvidence {
                    node: f.node.clone(),
                })
            }
            Some(_) => {}
            None => {
                names.push(f.node.clone());
                states.push(f.state);
            }
        }
    }
    Ok((names, states))
}
