//! Closures of a variable set over the parent relation.
//!
//! A closure bounds the local joint needed to recompute the CPTs of a set of
//! nodes `Y`. The joint over `Y ∪ S` contains every node of `Y` and all of
//! its parents, so each `P(y | parents(y))` can be read off it.
//!
//! - **Loose**: `S = parents(Y) \ Y`, one level up, nothing else.
//! - **Strict**: any `s ∈ S` that descends from a member of `Y` is promoted
//!   into `Y` and replaced in `S` by its own parents outside `Y`, until no
//!   member of `S` descends from `Y`. Ignoring such an `s` would let the
//!   update of `Y` leak into `S` through a path the local joint cannot see.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::NetworkError;
use crate::network::BeliefNetwork;

/// Which closure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureKind {
    #[default]
    Loose,
    Strict,
}

/// Result of a closure computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    /// `Y'`: the input variables plus any promoted closure members.
    pub updated: Vec<String>,
    /// `S`: parents of `Y'` outside `Y'`.
    pub residual: Vec<String>,
}

impl Closure {
    /// `Y'` followed by `S`.
    pub fn domain(&self) -> Vec<String> {
        self.updated
            .iter()
            .chain(&self.residual)
            .cloned()
            .collect()
    }
}

/// Dispatch on `kind`.
pub fn closure<N: BeliefNetwork + ?Sized>(
    net: &N,
    vars: &[String],
    kind: ClosureKind,
) -> Result<Closure, NetworkError> {
    match kind {
        ClosureKind::Loose => loose_closure(net, vars),
        ClosureKind::Strict => strict_closure(net, vars),
    }
}

/// `parents(Y) \ Y`, in order of first appearance.
pub fn loose_closure<N: BeliefNetwork + ?Sized>(
    net: &N,
    vars: &[String],
) -> Result<Closure, NetworkError> {
    let updated = dedup(vars)?;
    let mut residual: Vec<String> = Vec::new();
    for y in &updated {
        for p in net.parents(y)? {
            if !updated.contains(&p) && !residual.contains(&p) {
                residual.push(p);
            }
        }
    }
    Ok(Closure { updated, residual })
}

/// Loose closure, then promote residual members that descend from `Y'`.
///
/// Terminates on any acyclic network: each round either promotes a node
/// (which can happen at most once per node) or stops.
pub fn strict_closure<N: BeliefNetwork + ?Sized>(
    net: &N,
    vars: &[String],
) -> Result<Closure, NetworkError> {
    let Closure {
        mut updated,
        mut residual,
    } = loose_closure(net, vars)?;

    loop {
        let mut promoted = false;
        let mut next: Vec<String> = Vec::new();
        for s in std::mem::take(&mut residual) {
            if updated.contains(&s) {
                continue;
            }
            let mut descends = false;
            for y in &updated {
                if is_descendant(net, &s, y)? {
                    descends = true;
                    break;
                }
            }
            if descends {
                trace!(node = %s, "promoting closure member");
                for p in net.parents(&s)? {
                    if p != s && !updated.contains(&p) && !next.contains(&p) {
                        next.push(p);
                    }
                }
                updated.push(s);
                promoted = true;
            } else if !next.contains(&s) {
                next.push(s);
            }
        }
        next.retain(|n| !updated.contains(n));
        residual = next;
        if !promoted {
            break;
        }
    }
    Ok(Closure { updated, residual })
}

/// True if `node` is a proper descendant of `ancestor`: some parent path
/// leads from `node` up to `ancestor`.
pub fn is_descendant<N: BeliefNetwork + ?Sized>(
    net: &N,
    node: &str,
    ancestor: &str,
) -> Result<bool, NetworkError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = net.parents(node)?;
    while let Some(p) = stack.pop() {
        if p == ancestor {
            return Ok(true);
        }
        if visited.insert(p.clone()) {
            stack.extend(net.parents(&p)?);
        }
    }
    Ok(false)
}

fn dedup(vars: &[String]) -> Result<Vec<String>, NetworkError> {
    if vars.is_empty() {
        return Err(NetworkError::EmptyClosure);
    }
    let mut out: Vec<String> = Vec::with_capacity(vars.len());
    for v in vars {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayesnet::{sprinkler_network, BayesNet};
    use ipfp_core::RandomVariable;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    /// A → B → C, A → C, D → C
    fn diamond() -> BayesNet {
        let mut net = BayesNet::new();
        let bin = |n: &str| RandomVariable::binary(n).unwrap();
        net.add_prior(bin("A"), vec![0.5, 0.5]).unwrap();
        net.add_prior(bin("D"), vec![0.5, 0.5]).unwrap();
        net.add_conditional(bin("B"), &["A"], vec![vec![0.5, 0.5]; 2])
            .unwrap();
        net.add_conditional(bin("C"), &["A", "B", "D"], vec![vec![0.5, 0.5]; 8])
            .unwrap();
        net
    }

    #[test]
    fn test_loose_closure() {
        let net = sprinkler_network();
        let c = loose_closure(&net, &names(&["WetGrass"])).unwrap();
        assert_eq!(c.updated, names(&["WetGrass"]));
        assert_eq!(c.residual, names(&["Sprinkler", "Rain"]));

        let c = loose_closure(&net, &names(&["WetGrass", "Rain"])).unwrap();
        assert_eq!(c.residual, names(&["Sprinkler", "Cloudy"]));
        assert_eq!(c.domain(), names(&["WetGrass", "Rain", "Sprinkler", "Cloudy"]));
    }

    #[test]
    fn test_loose_closure_of_root_is_empty() {
        let net = sprinkler_network();
        let c = loose_closure(&net, &names(&["Cloudy"])).unwrap();
        assert!(c.residual.is_empty());
    }

    #[test]
    fn test_strict_closure_promotes_descendants() {
        let net = diamond();
        // Loose closure of {A, C} is {B, D}; B descends from A.
        let c = strict_closure(&net, &names(&["A", "C"])).unwrap();
        assert_eq!(c.updated, names(&["A", "C", "B"]));
        assert_eq!(c.residual, names(&["D"]));
    }

    #[test]
    fn test_strict_closure_sprinkler() {
        let net = sprinkler_network();
        // S and R both descend from Cloudy.
        let c = strict_closure(&net, &names(&["Cloudy", "WetGrass"])).unwrap();
        assert_eq!(c.updated, names(&["Cloudy", "WetGrass", "Sprinkler", "Rain"]));
        assert!(c.residual.is_empty());
    }

    #[test]
    fn test_strict_equals_loose_without_descendants() {
        let net = sprinkler_network();
        let vars = names(&["WetGrass"]);
        assert_eq!(
            strict_closure(&net, &vars).unwrap(),
            loose_closure(&net, &vars).unwrap()
        );
    }

    #[test]
    fn test_is_descendant() {
        let net = diamond();
        assert!(is_descendant(&net, "C", "A").unwrap());
        assert!(is_descendant(&net, "B", "A").unwrap());
        assert!(!is_descendant(&net, "A", "C").unwrap());
        assert!(!is_descendant(&net, "A", "A").unwrap());
        assert!(!is_descendant(&net, "B", "D").unwrap());
    }

    #[test]
    fn test_errors() {
        let net = sprinkler_network();
        assert_eq!(
            loose_closure(&net, &[]),
            Err(NetworkError::EmptyClosure)
        );
        assert!(matches!(
            strict_closure(&net, &names(&["Fog"])),
            Err(NetworkError::UnknownNode { .. })
        ));
        assert_eq!(
            closure(&net, &names(&["Rain"]), ClosureKind::Strict).unwrap(),
            closure(&net, &names(&["Rain"]), ClosureKind::Loose).unwrap()
        );
    }
}
