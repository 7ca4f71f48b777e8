//! Closure properties over randomly generated DAGs.

use ipfp_core::RandomVariable;
use ipfp_network::{is_descendant, loose_closure, strict_closure, BayesNet, BeliefNetwork};
use proptest::prelude::*;

/// Build a network of `n` binary nodes where node `i` may take any earlier
/// node as a parent; `edges[i][j]` selects parent `j < i`.
fn random_dag(n: usize, edges: &[Vec<bool>]) -> BayesNet {
    let mut net = BayesNet::new();
    for i in 0..n {
        let parents: Vec<String> = (0..i)
            .filter(|&j| edges[i][j])
            .map(|j| format!("N{}", j))
            .collect();
        let refs: Vec<&str> = parents.iter().map(String::as_str).collect();
        let rows = 1usize << parents.len();
        net.add_conditional(
            RandomVariable::binary(format!("N{}", i)).unwrap(),
            &refs,
            vec![vec![0.5, 0.5]; rows],
        )
        .unwrap();
    }
    net
}

fn dag_strategy() -> impl Strategy<Value = (BayesNet, Vec<String>)> {
    (2usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.35), n), n),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(move |(edges, pick)| {
                let net = random_dag(n, &edges);
                let mut vars: Vec<String> = (0..n)
                    .filter(|&i| pick[i])
                    .map(|i| format!("N{}", i))
                    .collect();
                if vars.is_empty() {
                    vars.push(format!("N{}", n - 1));
                }
                (net, vars)
            })
    })
}

proptest! {
    #[test]
    fn strict_closure_is_superset_and_disjoint((net, vars) in dag_strategy()) {
        let c = strict_closure(&net, &vars).unwrap();
        for v in &vars {
            prop_assert!(c.updated.contains(v));
        }
        for s in &c.residual {
            prop_assert!(!c.updated.contains(s));
        }
    }

    #[test]
    fn strict_closure_covers_every_parent((net, vars) in dag_strategy()) {
        let c = strict_closure(&net, &vars).unwrap();
        let domain = c.domain();
        for y in &c.updated {
            for p in net.parents(y).unwrap() {
                prop_assert!(domain.contains(&p));
            }
        }
    }

    #[test]
    fn strict_residual_never_descends_from_updated((net, vars) in dag_strategy()) {
        let c = strict_closure(&net, &vars).unwrap();
        for s in &c.residual {
            for y in &c.updated {
                prop_assert!(!is_descendant(&net, s, y).unwrap());
            }
        }
    }

    #[test]
    fn loose_closure_is_parents_minus_vars((net, vars) in dag_strategy()) {
        let c = loose_closure(&net, &vars).unwrap();
        for s in &c.residual {
            prop_assert!(!vars.contains(s));
            prop_assert!(vars.iter().any(|y| net.parents(y).unwrap().contains(s)));
        }
    }
}
