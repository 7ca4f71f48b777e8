//! Property-based tests for the distribution algebra.
//!
//! - Every offset round-trips through its index vector
//! - Marginalization preserves total mass
//! - Conditioning is consistent with Bayes' rule
//! - Total variation is symmetric

use ipfp_core::{total_variation, JointDistribution, RandomVariable, Tensor};
use proptest::prelude::*;

fn variables(cards: &[usize]) -> Vec<RandomVariable> {
    cards
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            RandomVariable::new(format!("V{}", i), (0..n).map(|s| format!("s{}", s))).unwrap()
        })
        .collect()
}

/// Cardinalities plus a normalized joint over them.
fn joint_strategy() -> impl Strategy<Value = JointDistribution> {
    prop::collection::vec(1usize..4, 1..5).prop_flat_map(|cards| {
        let len: usize = cards.iter().product();
        prop::collection::vec(0.0f64..1.0, len).prop_map(move |mut values| {
            let total: f64 = values.iter().sum();
            if total > 0.0 {
                values.iter_mut().for_each(|v| *v /= total);
            }
            JointDistribution::from_values(variables(&cards), values).unwrap()
        })
    })
}

// ============================================================================
// Tensor Indexing
// ============================================================================

proptest! {
    #[test]
    fn offset_index_bijection(dims in prop::collection::vec(1usize..5, 1..5)) {
        let t = Tensor::zeros(dims).unwrap();
        for offset in 0..t.len() {
            let idx = t.index_of(offset).unwrap();
            prop_assert_eq!(t.offset_of(&idx).unwrap(), offset);
        }
        for (offset, idx) in t.indices().enumerate() {
            prop_assert_eq!(t.index_of(offset).unwrap(), idx);
        }
    }
}

// ============================================================================
// Distribution Algebra
// ============================================================================

proptest! {
    #[test]
    fn marginalization_preserves_mass(q in joint_strategy(), mask in any::<u8>()) {
        let vars: Vec<RandomVariable> = q
            .variables()
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, v)| v.clone())
            .rev()
            .collect();
        prop_assume!(!vars.is_empty());
        let m = q.marginalize(&vars).unwrap();
        prop_assert!((m.sum() - q.sum()).abs() < 1e-9);
    }

    #[test]
    fn conditioning_matches_bayes_rule(q in joint_strategy()) {
        prop_assume!(q.variables().len() >= 2);
        let vars = q.variables();
        let conds = vec![vars[0].clone()];
        let priors: Vec<RandomVariable> = vars[1..].to_vec();

        let cpd = q.conditional(&priors, &conds).unwrap();
        let both: Vec<RandomVariable> = conds.iter().chain(&priors).cloned().collect();
        let joint = q.marginalize(&both).unwrap();
        let denom = q.marginalize(&conds).unwrap();

        for idx in joint.table().indices() {
            let d = denom.get(&idx[..1]).unwrap();
            if d > 0.0 {
                let rebuilt = cpd.get(&idx[1..], &idx[..1]).unwrap() * d;
                prop_assert!((rebuilt - joint.get(&idx).unwrap()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn total_variation_is_symmetric(p in joint_strategy(), seed in prop::collection::vec(0.0f64..1.0, 64)) {
        let values: Vec<f64> = (0..p.values().len()).map(|i| seed[i % seed.len()]).collect();
        let q = JointDistribution::from_values(p.variables().to_vec(), values).unwrap();
        let pq = total_variation(&p, &q).unwrap();
        let qp = total_variation(&q, &p).unwrap();
        prop_assert!((pq - qp).abs() < 1e-12);
        prop_assert!(pq >= 0.0);
    }
}
