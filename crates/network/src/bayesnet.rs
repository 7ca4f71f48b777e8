//! In-memory Bayesian network over a petgraph DAG.
//!
//! Nodes are added parents-first, so every edge points from an older node to
//! a newer one and the graph is acyclic by construction. Node indices are
//! therefore already a topological order.
//!
//! Queries are exact: a joint query enumerates the ancestral set of the
//! queried nodes (nothing else can affect their marginal) and multiplies CPT
//! entries along each assignment.

use std::collections::{BTreeSet, HashMap};

use ipfp_core::{JointDistribution, RandomVariable};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::error::NetworkError;
use crate::network::{check_against_network, BeliefNetwork};

/// Rows must sum to one within this tolerance when added or compiled.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct NetNode {
    variable: RandomVariable,
    parents: Vec<NodeIndex>,
    /// Row-major: parent assignment, then node state.
    cpt: Vec<f64>,
}

/// A discrete Bayesian network with explicit CPTs.
///
/// # Example
///
/// ```rust
/// use ipfp_core::RandomVariable;
/// use ipfp_network::{BayesNet, BeliefNetwork};
///
/// let mut net = BayesNet::new();
/// net.add_prior(RandomVariable::binary("Cloudy").unwrap(), vec![0.5, 0.5]).unwrap();
/// net.add_conditional(
///     RandomVariable::binary("Rain").unwrap(),
///     &["Cloudy"],
///     vec![vec![0.8, 0.2], vec![0.2, 0.8]],
/// ).unwrap();
///
/// let rain = net.beliefs("Rain").unwrap();
/// assert!((rain[0] - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BayesNet {
    graph: DiGraph<NetNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl BayesNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Add a root node with distribution `probs`.
    pub fn add_prior(&mut self, variable: RandomVariable, probs: Vec<f64>) -> Result<(), NetworkError> {
        self.add_conditional(variable, &[], vec![probs])
    }

    /// Add `P(variable | parents)`, one row per parent assignment in
    /// row-major order (last parent fastest).
    ///
    /// # Errors
    ///
    /// Fails if the name is taken, a parent is unknown or repeated, the table
    /// has the wrong shape, or a row is not a probability vector.
    pub fn add_conditional(
        &mut self,
        variable: RandomVariable,
        parents: &[&str],
        rows: Vec<Vec<f64>>,
    ) -> Result<(), NetworkError> {
        let name = variable.name().to_string();
        if self.index.contains_key(&name) {
            return Err(NetworkError::DuplicateNode { name });
        }

        let mut parent_ids = Vec::with_capacity(parents.len());
        for &p in parents {
            let id = self.node(p)?;
            if parent_ids.contains(&id) {
                return Err(NetworkError::DuplicateParent {
                    node: name,
                    parent: p.to_string(),
                });
            }
            parent_ids.push(id);
        }

        let n_rows: usize = parent_ids
            .iter()
            .map(|&p| self.graph[p].variable.num_states())
            .product();
        if rows.len() != n_rows {
            return Err(NetworkError::CptShape {
                node: name,
                expected: n_rows,
                got: rows.len(),
            });
        }
        let k = variable.num_states();
        let mut cpt = Vec::with_capacity(n_rows * k);
        for (r, row) in rows.iter().enumerate() {
            check_row(&name, r, row, k)?;
            check_normalized(&name, r, row)?;
            cpt.extend_from_slice(row);
        }

        let id = self.graph.add_node(NetNode {
            variable,
            parents: parent_ids.clone(),
            cpt,
        });
        for p in parent_ids {
            self.graph.add_edge(p, id, ());
        }
        self.index.insert(name, id);
        Ok(())
    }

    fn node(&self, name: &str) -> Result<NodeIndex, NetworkError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode {
                name: name.to_string(),
            })
    }

    /// Child nodes of `name`.
    pub fn children(&self, name: &str) -> Result<Vec<String>, NetworkError> {
        let id = self.node(name)?;
        let mut kids: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        kids.sort();
        Ok(kids
            .into_iter()
            .map(|k| self.graph[k].variable.name().to_string())
            .collect())
    }

    fn row_index(&self, id: NodeIndex, parent_states: &[usize]) -> Result<usize, NetworkError> {
        let node = &self.graph[id];
        let bad = || NetworkError::ParentAssignment {
            node: node.variable.name().to_string(),
            states: parent_states.to_vec(),
        };
        if parent_states.len() != node.parents.len() {
            return Err(bad());
        }
        let mut row = 0;
        for (&p, &s) in node.parents.iter().zip(parent_states) {
            let card = self.graph[p].variable.num_states();
            if s >= card {
                return Err(bad());
            }
            row = row * card + s;
        }
        Ok(row)
    }

    /// Exact joint over the ancestral closure of `targets`.
    fn ancestral_joint(&self, targets: &[NodeIndex]) -> Result<JointDistribution, NetworkError> {
        let mut ancestors: BTreeSet<NodeIndex> = BTreeSet::new();
        let mut stack: Vec<NodeIndex> = targets.to_vec();
        while let Some(id) = stack.pop() {
            if ancestors.insert(id) {
                stack.extend(self.graph.neighbors_directed(id, Direction::Incoming));
            }
        }

        let order: Vec<NodeIndex> = ancestors.into_iter().collect();
        let position: HashMap<NodeIndex, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let vars: Vec<RandomVariable> = order
            .iter()
            .map(|&id| self.graph[id].variable.clone())
            .collect();

        let mut joint = JointDistribution::new(vars)?;
        let assignments = joint.table().indices();
        for (offset, idx) in assignments.enumerate() {
            let mut p = 1.0;
            for (k, &id) in order.iter().enumerate() {
                let node = &self.graph[id];
                let row = node.parents.iter().fold(0, |acc, par| {
                    acc * self.graph[*par].variable.num_states() + idx[position[par]]
                });
                p *= node.cpt[row * node.variable.num_states() + idx[k]];
                if p == 0.0 {
                    break;
                }
            }
            joint.values_mut()[offset] = p;
        }
        Ok(joint)
    }
}

impl BeliefNetwork for BayesNet {
    fn node_names(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|id| self.graph[id].variable.name().to_string())
            .collect()
    }

    fn parents(&self, node: &str) -> Result<Vec<String>, NetworkError> {
        let id = self.node(node)?;
        Ok(self.graph[id]
            .parents
            .iter()
            .map(|&p| self.graph[p].variable.name().to_string())
            .collect())
    }

    fn states(&self, node: &str) -> Result<Vec<String>, NetworkError> {
        let id = self.node(node)?;
        Ok(self.graph[id].variable.states().to_vec())
    }

    fn random_variable(&self, node: &str) -> Result<RandomVariable, NetworkError> {
        let id = self.node(node)?;
        Ok(self.graph[id].variable.clone())
    }

    fn joint_belief(&self, nodes: &[&str], states: &[usize]) -> Result<f64, NetworkError> {
        let ids = nodes
            .iter()
            .map(|n| self.node(n))
            .collect::<Result<Vec<_>, _>>()?;
        let vars: Vec<RandomVariable> = ids
            .iter()
            .map(|&id| self.graph[id].variable.clone())
            .collect();
        let marginal = self.ancestral_joint(&ids)?.marginalize(&vars)?;
        Ok(marginal.get(states)?)
    }

    fn joint_distribution(&self, vars: &[RandomVariable]) -> Result<JointDistribution, NetworkError> {
        check_against_network(self, vars)?;
        let ids = vars
            .iter()
            .map(|v| self.node(v.name()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.ancestral_joint(&ids)?.marginalize(vars)?)
    }

    fn cpt_row(&self, node: &str, parent_states: &[usize]) -> Result<Vec<f64>, NetworkError> {
        let id = self.node(node)?;
        let row = self.row_index(id, parent_states)?;
        let n = &self.graph[id];
        let k = n.variable.num_states();
        Ok(n.cpt[row * k..(row + 1) * k].to_vec())
    }

    fn set_cpt_row(
        &mut self,
        node: &str,
        parent_states: &[usize],
        probs: &[f64],
    ) -> Result<(), NetworkError> {
        let id = self.node(node)?;
        let row = self.row_index(id, parent_states)?;
        let n = &mut self.graph[id];
        let k = n.variable.num_states();
        check_row(node, row, probs, k)?;
        n.cpt[row * k..(row + 1) * k].copy_from_slice(probs);
        Ok(())
    }

    fn compile(&mut self) -> Result<(), NetworkError> {
        for id in self.graph.node_indices() {
            let n = &self.graph[id];
            let k = n.variable.num_states();
            for (r, row) in n.cpt.chunks(k).enumerate() {
                check_normalized(n.variable.name(), r, row)?;
            }
        }
        debug!(nodes = self.graph.node_count(), "compiled network");
        Ok(())
    }
}

fn check_row(node: &str, row: usize, probs: &[f64], k: usize) -> Result<(), NetworkError> {
    if probs.len() != k {
        return Err(NetworkError::CptShape {
            node: node.to_string(),
            expected: k,
            got: probs.len(),
        });
    }
    if let Some(&value) = probs.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(NetworkError::InvalidEntry {
            node: node.to_string(),
            row,
            value,
        });
    }
    Ok(())
}

fn check_normalized(node: &str, row: usize, probs: &[f64]) -> Result<(), NetworkError> {
    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
        return Err(NetworkError::RowNotNormalized {
            node: node.to_string(),
            row,
            sum,
        });
    }
    Ok(())
}

/// The classic sprinkler network.
///
/// ```text
///         Cloudy
///        /      \
///   Sprinkler   Rain
///        \      /
///        WetGrass
/// ```
///
/// All variables are binary with states `True`, `False`.
pub fn sprinkler_network() -> BayesNet {
    let mut net = BayesNet::new();

    // P(Cloudy)
    net.add_prior(RandomVariable::binary("Cloudy").unwrap(), vec![0.5, 0.5])
        .unwrap();

    // P(Sprinkler | Cloudy)
    net.add_conditional(
        RandomVariable::binary("Sprinkler").unwrap(),
        &["Cloudy"],
        vec![
            vec![0.1, 0.9], // Cloudy: 10% sprinkler
            vec![0.5, 0.5], // Clear: 50% sprinkler
        ],
    )
    .unwrap();

    // P(Rain | Cloudy)
    net.add_conditional(
        RandomVariable::binary("Rain").unwrap(),
        &["Cloudy"],
        vec![
            vec![0.8, 0.2], // Cloudy: 80% rain
            vec![0.2, 0.8], // Clear: 20% rain
        ],
    )
    .unwrap();

    // P(WetGrass | Sprinkler, Rain)
    // Rows: (S,R) = (T,T), (T,F), (F,T), (F,F)
    net.add_conditional(
        RandomVariable::binary("WetGrass").unwrap(),
        &["Sprinkler", "Rain"],
        vec![
            vec![0.99, 0.01],
            vec![0.9, 0.1],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
        ],
    )
    .unwrap();

    net
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Finding;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_structure() {
        let net = sprinkler_network();
        assert_eq!(net.len(), 4);
        assert_eq!(
            net.node_names(),
            vec!["Cloudy", "Sprinkler", "Rain", "WetGrass"]
        );
        assert_eq!(net.parents("WetGrass").unwrap(), vec!["Sprinkler", "Rain"]);
        assert!(net.parents("Cloudy").unwrap().is_empty());
        assert_eq!(net.children("Cloudy").unwrap(), vec!["Sprinkler", "Rain"]);
        assert!(matches!(
            net.parents("Fog"),
            Err(NetworkError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_add_errors() {
        let mut net = sprinkler_network();
        let v = RandomVariable::binary("X").unwrap();
        assert!(matches!(
            net.add_prior(RandomVariable::binary("Rain").unwrap(), vec![0.5, 0.5]),
            Err(NetworkError::DuplicateNode { .. })
        ));
        assert!(matches!(
            net.add_conditional(v.clone(), &["Fog"], vec![vec![0.5, 0.5]]),
            Err(NetworkError::UnknownNode { .. })
        ));
        assert!(matches!(
            net.add_conditional(v.clone(), &["Rain"], vec![vec![0.5, 0.5]]),
            Err(NetworkError::CptShape { .. })
        ));
        assert!(matches!(
            net.add_conditional(v.clone(), &["Rain", "Rain"], vec![vec![0.5, 0.5]; 4]),
            Err(NetworkError::DuplicateParent { .. })
        ));
        assert!(matches!(
            net.add_prior(v.clone(), vec![0.5, 0.6]),
            Err(NetworkError::RowNotNormalized { .. })
        ));
        assert!(matches!(
            net.add_prior(v, vec![1.5, -0.5]),
            Err(NetworkError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_marginal_beliefs() {
        let net = sprinkler_network();
        // P(Rain=T) = 0.5*0.8 + 0.5*0.2
        assert!(approx_eq(net.beliefs("Rain").unwrap()[0], 0.5));
        // P(Sprinkler=T) = 0.5*0.1 + 0.5*0.5
        assert!(approx_eq(net.beliefs("Sprinkler").unwrap()[0], 0.3));
    }

    #[test]
    fn test_full_joint_is_valid() {
        let net = sprinkler_network();
        let joint = net.full_joint().unwrap();
        assert_eq!(joint.values().len(), 16);
        assert!(approx_eq(joint.sum(), 1.0));
        // P(C=T, S=F, R=T, W=T) = 0.5 * 0.9 * 0.8 * 0.9
        assert!(approx_eq(joint.get(&[0, 1, 0, 0]).unwrap(), 0.324));
    }

    #[test]
    fn test_joint_belief_matches_full_joint() {
        let net = sprinkler_network();
        let joint = net.full_joint().unwrap();
        let vars = vec![
            net.random_variable("WetGrass").unwrap(),
            net.random_variable("Cloudy").unwrap(),
        ];
        let expected = joint.marginalize(&vars).unwrap();
        for idx in expected.table().indices() {
            let got = net.joint_belief(&["WetGrass", "Cloudy"], &idx).unwrap();
            assert!(approx_eq(got, expected.get(&idx).unwrap()));
        }
    }

    #[test]
    fn test_beliefs_given_evidence() {
        let net = sprinkler_network();
        let evidence = [Finding::new("WetGrass", 0)];
        let rain = net.beliefs_given("Rain", &evidence).unwrap();
        let joint = net.full_joint().unwrap();
        let rw = joint
            .marginalize(&[
                net.random_variable("Rain").unwrap(),
                net.random_variable("WetGrass").unwrap(),
            ])
            .unwrap();
        let p_w = rw.get(&[0, 0]).unwrap() + rw.get(&[1, 0]).unwrap();
        assert!(approx_eq(rain[0], rw.get(&[0, 0]).unwrap() / p_w));
        assert!(approx_eq(rain[0] + rain[1], 1.0));

        let observed = net.beliefs_given("WetGrass", &evidence).unwrap();
        assert_eq!(observed, vec![1.0, 0.0]);
    }

    #[test]
    fn test_evidence_errors() {
        let net = sprinkler_network();
        // Sprinkler=F, Rain=F makes WetGrass=T impossible.
        let impossible = [
            Finding::new("Sprinkler", 1),
            Finding::new("Rain", 1),
            Finding::new("WetGrass", 0),
        ];
        assert_eq!(
            net.beliefs_given("Cloudy", &impossible),
            Err(NetworkError::ImpossibleEvidence)
        );
        let conflicting = [Finding::new("Rain", 0), Finding::new("Rain", 1)];
        assert!(matches!(
            net.beliefs_given("Cloudy", &conflicting),
            Err(NetworkError::ConflictingEvidence { .. })
        ));
    }

    #[test]
    fn test_cpt_rows_roundtrip() {
        let mut net = sprinkler_network();
        assert_eq!(net.cpt_row("WetGrass", &[1, 0]).unwrap(), vec![0.9, 0.1]);
        net.set_cpt_row("WetGrass", &[1, 0], &[0.7, 0.3]).unwrap();
        assert_eq!(net.cpt_row("WetGrass", &[1, 0]).unwrap(), vec![0.7, 0.3]);
        assert_eq!(net.cpt("Cloudy").unwrap(), vec![vec![0.5, 0.5]]);
        assert!(net.compile().is_ok());
        assert!(matches!(
            net.cpt_row("WetGrass", &[2, 0]),
            Err(NetworkError::ParentAssignment { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_unnormalized_rows() {
        let mut net = sprinkler_network();
        net.set_cpt_row("Rain", &[0], &[0.5, 0.6]).unwrap();
        assert!(matches!(
            net.compile(),
            Err(NetworkError::RowNotNormalized { .. })
        ));
    }

    #[test]
    fn test_set_cpt_shape() {
        let mut net = sprinkler_network();
        assert!(matches!(
            net.set_cpt("Rain", &[vec![0.5, 0.5]]),
            Err(NetworkError::CptShape { .. })
        ));
        net.set_cpt("Rain", &[vec![0.6, 0.4], vec![0.3, 0.7]]).unwrap();
        assert_eq!(net.cpt("Rain").unwrap()[1], vec![0.3, 0.7]);
    }
}
