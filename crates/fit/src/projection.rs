//! Single-constraint I-projections.
//!
//! Both projections rescale `Q(X)` so that one constraint holds, changing
//! each entry by a factor that depends only on the constrained coordinates:
//!
//! ```text
//! marginal     R(S):    Q'(x) = Q(x) · R(s) / Q(s)
//! conditional  R(S|L):  Q'(x) = Q(x) · R(s|l) / Q(s|l)
//! ```
//!
//! A zero denominator gives a zero factor, so the entry is lost. That is
//! the fixed-point behaviour of IPFP on zero support, not an error. The
//! conditional form leaves `Q(L)` untouched.

use ipfp_core::{ConditionalDistribution, JointDistribution, RandomVariable};

use crate::constraint::Target;
use crate::error::FitError;

/// Apply one projection step in place.
pub fn project(q: &mut JointDistribution, target: &Target) -> Result<(), FitError> {
    match target {
        Target::Marginal(r) => project_marginal(q, r),
        Target::Conditional(r) => project_conditional(q, r),
    }
}

/// A projected copy of `q`.
pub fn projected(q: &JointDistribution, target: &Target) -> Result<JointDistribution, FitError> {
    let mut out = q.clone();
    project(&mut out, target)?;
    Ok(out)
}

/// `Q'(x) = Q(x) · R(s) / Q(s)`, factor zero where `Q(s) = 0`.
///
/// # Example
///
/// ```rust
/// use ipfp_core::{JointDistribution, RandomVariable};
/// use ipfp_fit::project_marginal;
///
/// let a = RandomVariable::binary("A").unwrap();
/// let b = RandomVariable::binary("B").unwrap();
/// let mut q = JointDistribution::uniform(vec![a.clone(), b]).unwrap();
/// let r = JointDistribution::from_values(vec![a.clone()], vec![0.7, 0.3]).unwrap();
///
/// project_marginal(&mut q, &r).unwrap();
/// let qa = q.marginalize(&[a]).unwrap();
/// assert!((qa.values()[0] - 0.7).abs() < 1e-12);
/// ```
pub fn project_marginal(q: &mut JointDistribution, r: &JointDistribution) -> Result<(), FitError> {
    let qs = q.marginalize(r.variables())?;
    let ratios: Vec<f64> = r
        .values()
        .iter()
        .zip(qs.values())
        .map(|(&rv, &qv)| if qv > 0.0 { rv / qv } else { 0.0 })
        .collect();
    rescale(q, r.variables(), &ratios)
}

/// `Q'(x) = Q(x) · R(s|l) / Q(s|l)`, factor zero where `Q(s|l) = 0`.
pub fn project_conditional(
    q: &mut JointDistribution,
    r: &ConditionalDistribution,
) -> Result<(), FitError> {
    // Same axis order as r's table: conditions, then priors.
    let vars = r.variables();
    let q_ls = q.marginalize(&vars)?;
    let q_l = q.marginalize(r.conds())?;
    let row_len = r.row_len();

    let ratios: Vec<f64> = r
        .values()
        .iter()
        .zip(q_ls.values())
        .enumerate()
        .map(|(offset, (&rv, &joint))| {
            let denom = q_l.values()[offset / row_len];
            let q_cond = if denom > 0.0 { joint / denom } else { 0.0 };
            if q_cond > 0.0 {
                rv / q_cond
            } else {
                0.0
            }
        })
        .collect();
    rescale(q, &vars, &ratios)
}

fn rescale(
    q: &mut JointDistribution,
    vars: &[RandomVariable],
    ratios: &[f64],
) -> Result<(), FitError> {
    let restriction = q.offsets_onto(vars)?;
    for (value, s) in q.values_mut().iter_mut().zip(restriction) {
        *value *= ratios[s];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipfp_core::total_variation;

    fn vars() -> (RandomVariable, RandomVariable, RandomVariable) {
        (
            RandomVariable::binary("A").unwrap(),
            RandomVariable::binary("B").unwrap(),
            RandomVariable::new("C", ["lo", "mid", "hi"]).unwrap(),
        )
    }

    fn skewed() -> JointDistribution {
        let (a, b, c) = vars();
        let values: Vec<f64> = (1..=12).map(|i| i as f64 / 78.0).collect();
        JointDistribution::from_values(vec![a, b, c], values).unwrap()
    }

    #[test]
    fn test_marginal_projection_hits_target() {
        let (a, _, c) = vars();
        let mut q = skewed();
        let r = JointDistribution::from_values(
            vec![c.clone(), a.clone()],
            vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.1],
        )
        .unwrap();
        project_marginal(&mut q, &r).unwrap();
        let got = q.marginalize(&[c, a]).unwrap();
        for (x, y) in got.values().iter().zip(r.values()) {
            assert!((x - y).abs() < 1e-12);
        }
        assert!((q.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_conditional_projection_hits_target_and_keeps_conditions() {
        let (a, b, c) = vars();
        let mut q = skewed();
        let before_l = q.marginalize(&[a.clone()]).unwrap();

        let r = ConditionalDistribution::from_values(
            vec![c.clone(), b.clone()],
            vec![a.clone()],
            vec![0.1, 0.2, 0.1, 0.2, 0.2, 0.2, 0.3, 0.3, 0.1, 0.1, 0.1, 0.1],
        )
        .unwrap();
        project_conditional(&mut q, &r).unwrap();

        let got = q.conditional(&[c, b], &[a.clone()]).unwrap();
        for (x, y) in got.values().iter().zip(r.values()) {
            assert!((x - y).abs() < 1e-12);
        }
        let after_l = q.marginalize(&[a]).unwrap();
        assert!(total_variation(&before_l, &after_l).unwrap() < 1e-12);
    }

    #[test]
    fn test_zero_support_is_lost() {
        let (a, b, _) = vars();
        let mut q =
            JointDistribution::from_values(vec![a.clone(), b], vec![0.5, 0.5, 0.0, 0.0]).unwrap();
        let r = JointDistribution::from_values(vec![a], vec![0.4, 0.6]).unwrap();
        project_marginal(&mut q, &r).unwrap();
        // Q(A=F) = 0 cannot be scaled up; that mass is simply missing.
        assert!((q.values()[0] - 0.2).abs() < 1e-12);
        assert_eq!(q.values()[2], 0.0);
        assert!((q.sum() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let mut q = skewed();
        let d = RandomVariable::binary("D").unwrap();
        let r = JointDistribution::uniform(vec![d]).unwrap();
        assert!(matches!(
            project(&mut q, &Target::Marginal(r)),
            Err(FitError::Core(_))
        ));
    }

    #[test]
    fn test_projected_leaves_input_alone() {
        let (a, _, _) = vars();
        let q = skewed();
        let r = JointDistribution::from_values(vec![a], vec![0.9, 0.1]).unwrap();
        let p = projected(&q, &Target::Marginal(r)).unwrap();
        assert_ne!(p, q);
        assert_eq!(q, skewed());
    }
}
