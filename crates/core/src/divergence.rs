//! Distances between joint distributions over the same variables.
//!
//! Both metrics require the two distributions to share the exact same
//! variable list (names, states and order); anything else is a
//! [`CoreError::ScopeMismatch`].

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;
use crate::joint::JointDistribution;

/// Total variation `Σₓ |P(x) − Q(x)|`.
///
/// There is no `½` factor: two disjoint point masses are at distance 2.
/// Symmetric in its arguments.
///
/// # Example
///
/// ```rust
/// use ipfp_core::{total_variation, JointDistribution, RandomVariable};
///
/// let a = RandomVariable::binary("A").unwrap();
/// let p = JointDistribution::from_values(vec![a.clone()], vec![0.7, 0.3]).unwrap();
/// let q = JointDistribution::from_values(vec![a], vec![0.5, 0.5]).unwrap();
/// assert!((total_variation(&p, &q).unwrap() - 0.4).abs() < 1e-12);
/// ```
pub fn total_variation(p: &JointDistribution, q: &JointDistribution) -> Result<f64, CoreError> {
    p.check_same_scope(q)?;
    Ok(p.values()
        .iter()
        .zip(q.values())
        .map(|(a, b)| (a - b).abs())
        .sum())
}

/// Outcome of a cross-entropy computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Divergence {
    /// `P` is absolutely continuous w.r.t. `Q`; the divergence in bits.
    Finite(f64),
    /// Some `x` has `P(x) > 0` but `Q(x) = 0`.
    Undefined,
}

impl Divergence {
    /// The numeric value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Divergence::Finite(v) => Some(v),
            Divergence::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Divergence::Finite(_))
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Finite(v) => write!(f, "{:.6} bits", v),
            Divergence::Undefined => write!(f, "undefined"),
        }
    }
}

/// KL divergence `Σₓ P(x) · log₂(P(x) / Q(x))` over entries with `P(x) > 0`.
///
/// Returns [`Divergence::Undefined`] instead of an infinite value when `P`
/// puts mass where `Q` has none.
pub fn cross_entropy(p: &JointDistribution, q: &JointDistribution) -> Result<Divergence, CoreError> {
    p.check_same_scope(q)?;
    let mut total = 0.0;
    for (&pv, &qv) in p.values().iter().zip(q.values()) {
        if pv <= 0.0 {
            continue;
        }
        if qv <= 0.0 {
            return Ok(Divergence::Undefined);
        }
        total += pv * (pv / qv).log2();
    }
    Ok(Divergence::Finite(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RandomVariable;

    fn over_a(values: Vec<f64>) -> JointDistribution {
        JointDistribution::from_values(vec![RandomVariable::binary("A").unwrap()], values).unwrap()
    }

    #[test]
    fn test_tv_disjoint_masses() {
        let p = over_a(vec![1.0, 0.0]);
        let q = over_a(vec![0.0, 1.0]);
        assert!((total_variation(&p, &q).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(total_variation(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn test_tv_scope_mismatch() {
        let p = over_a(vec![0.5, 0.5]);
        let q = JointDistribution::uniform(vec![RandomVariable::binary("B").unwrap()]).unwrap();
        assert!(matches!(
            total_variation(&p, &q),
            Err(CoreError::ScopeMismatch { .. })
        ));
    }

    #[test]
    fn test_cross_entropy_values() {
        let p = over_a(vec![0.5, 0.5]);
        let q = over_a(vec![0.25, 0.75]);
        let expected = 0.5 * (2.0f64).log2() + 0.5 * (0.5f64 / 0.75).log2();
        let d = cross_entropy(&p, &q).unwrap();
        assert!((d.value().unwrap() - expected).abs() < 1e-12);
        assert_eq!(cross_entropy(&p, &p).unwrap(), Divergence::Finite(0.0));
    }

    #[test]
    fn test_cross_entropy_undefined() {
        let p = over_a(vec![0.5, 0.5]);
        let q = over_a(vec![1.0, 0.0]);
        let d = cross_entropy(&p, &q).unwrap();
        assert!(!d.is_defined());
        assert_eq!(d.value(), None);
        // Zero entries of P are skipped, so the other direction is defined.
        assert!(cross_entropy(&q, &p).unwrap().is_defined());
    }
}
