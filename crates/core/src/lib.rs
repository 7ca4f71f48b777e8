//! # Core - Discrete Distribution Algebra
//!
//! This crate provides the value types every fitting procedure is built on:
//!
//! - **Tensors**: row-major tables with an index ↔ offset bijection
//! - **Random variables**: named discrete variables with ordered states
//! - **Joint distributions**: marginalization onto any sub-list of variables
//! - **Conditional distributions**: `P(priors | conds)` with zero-fill
//! - **Divergences**: total variation and KL divergence (cross entropy)
//!
//! ## Example
//!
//! ```rust
//! use ipfp_core::{JointDistribution, RandomVariable, total_variation};
//!
//! let a = RandomVariable::binary("A").unwrap();
//! let b = RandomVariable::binary("B").unwrap();
//! let q = JointDistribution::uniform(vec![a.clone(), b.clone()]).unwrap();
//!
//! // P(B | A) from the joint
//! let cpd = q.conditional(&[b], &[a.clone()]).unwrap();
//! assert_eq!(cpd.row(0), &[0.5, 0.5]);
//!
//! let qa = q.marginalize(&[a]).unwrap();
//! assert!(total_variation(&qa, &qa).unwrap() < 1e-12);
//! ```
//!
//! Values are copied rather than aliased: every operation returns a fresh
//! distribution so that an earlier snapshot stays intact for comparison.

mod conditional;
mod divergence;
mod error;
mod joint;
mod tensor;
mod variable;

pub use conditional::ConditionalDistribution;
pub use divergence::{cross_entropy, total_variation, Divergence};
pub use error::CoreError;
pub use joint::JointDistribution;
pub use tensor::{Indices, Tensor};
pub use variable::RandomVariable;

/// Tolerance for probability comparisons.
pub const PROB_TOLERANCE: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < PROB_TOLERANCE
    }

    #[test]
    fn test_bayes_consistency_on_three_variables() {
        let a = RandomVariable::binary("A").unwrap();
        let b = RandomVariable::binary("B").unwrap();
        let c = RandomVariable::binary("C").unwrap();
        let q = JointDistribution::from_values(
            vec![a.clone(), b.clone(), c.clone()],
            vec![0.05, 0.1, 0.15, 0.2, 0.0, 0.0, 0.3, 0.2],
        )
        .unwrap();

        let cpd = q.conditional(&[c.clone()], &[a.clone(), b.clone()]).unwrap();
        let joint = q.marginalize(&[a.clone(), b.clone(), c]).unwrap();
        let cond = q.marginalize(&[a, b]).unwrap();

        for idx in joint.table().indices() {
            let denom = cond.get(&idx[..2]).unwrap();
            let lhs = joint.get(&idx).unwrap();
            let rhs = cpd.get(&idx[2..], &idx[..2]).unwrap() * denom;
            assert!(approx_eq(lhs, rhs));
        }
    }
}
