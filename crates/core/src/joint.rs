//! Joint distributions over ordered lists of random variables.
//!
//! A [`JointDistribution`] pairs variables `v₁..vₙ` with a [`Tensor`] whose
//! axis `i` has `vᵢ.num_states()` entries. Validity (entries in `[0,1]`,
//! total mass ≈ 1) is a checkable property, not an enforced invariant:
//! projections leave tables unnormalized in between steps.
//!
//! ## Marginalization
//!
//! `marginalize(Y)` sums out every variable not in `Y`. The result follows
//! the order of `Y`, not the order of the source distribution, so callers can
//! align a marginal with a constraint table by passing the constraint's own
//! variable list.
//!
//! ## Conditioning
//!
//! `conditional(priors, conds)` computes `P(priors | conds)` as
//! `P(priors, conds) / P(conds)`. Where `P(conds) = 0` the entry is `0`.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::conditional::ConditionalDistribution;
use crate::error::CoreError;
use crate::tensor::Tensor;
use crate::variable::RandomVariable;

/// A joint probability table over an ordered list of variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointDistribution {
    variables: Vec<RandomVariable>,
    table: Tensor,
}

impl JointDistribution {
    /// Zero-filled table over `variables`.
    ///
    /// # Errors
    ///
    /// Fails if `variables` is empty or names a variable twice.
    pub fn new(variables: Vec<RandomVariable>) -> Result<Self, CoreError> {
        check_distinct(&variables, "joint distribution")?;
        let table = Tensor::zeros(variables.iter().map(RandomVariable::num_states).collect())?;
        Ok(Self { variables, table })
    }

    /// Table over `variables` with row-major `values`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ipfp_core::{JointDistribution, RandomVariable};
    ///
    /// let a = RandomVariable::binary("A").unwrap();
    /// let b = RandomVariable::binary("B").unwrap();
    /// let q = JointDistribution::from_values(
    ///     vec![a.clone(), b],
    ///     vec![0.1, 0.2, 0.3, 0.4],
    /// ).unwrap();
    ///
    /// let qa = q.marginalize(&[a]).unwrap();
    /// assert!((qa.values()[0] - 0.3).abs() < 1e-12);
    /// ```
    pub fn from_values(variables: Vec<RandomVariable>, values: Vec<f64>) -> Result<Self, CoreError> {
        check_distinct(&variables, "joint distribution")?;
        let table = Tensor::from_data(
            variables.iter().map(RandomVariable::num_states).collect(),
            values,
        )?;
        Ok(Self { variables, table })
    }

    /// Uniform distribution over `variables`.
    pub fn uniform(variables: Vec<RandomVariable>) -> Result<Self, CoreError> {
        let mut joint = Self::new(variables)?;
        let p = 1.0 / joint.table.len() as f64;
        joint.table.data_mut().iter_mut().for_each(|v| *v = p);
        Ok(joint)
    }

    pub fn variables(&self) -> &[RandomVariable] {
        &self.variables
    }

    pub fn table(&self) -> &Tensor {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Tensor {
        &mut self.table
    }

    /// Entries in offset order.
    pub fn values(&self) -> &[f64] {
        self.table.data()
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        self.table.data_mut()
    }

    /// Axis of the variable called `name`.
    pub fn dimension_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dimension_of(name).is_some()
    }

    /// Variable names, in axis order.
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(RandomVariable::name).collect()
    }

    pub fn get(&self, index: &[usize]) -> Result<f64, CoreError> {
        self.table.get(index)
    }

    pub fn set(&mut self, index: &[usize], value: f64) -> Result<(), CoreError> {
        self.table.set(index, value)
    }

    /// Total mass.
    pub fn sum(&self) -> f64 {
        self.table.sum()
    }

    /// Every entry in `[0, 1]` and total mass within `0.01` of one.
    pub fn is_valid(&self) -> bool {
        self.values().iter().all(|&v| (0.0..=1.0).contains(&v)) && (self.sum() - 1.0).abs() <= 0.01
    }

    /// Rescale to unit mass. Returns `false`, leaving the table untouched,
    /// when the mass is zero.
    pub fn normalize(&mut self) -> bool {
        let total = self.sum();
        if total <= 0.0 {
            return false;
        }
        self.table.scale(1.0 / total);
        true
    }

    /// Axes of `vars` inside this distribution.
    ///
    /// # Errors
    ///
    /// Fails if `vars` is empty, repeats a variable, names an unknown
    /// variable, or names a known variable with different states.
    pub fn axes_of(&self, vars: &[RandomVariable]) -> Result<Vec<usize>, CoreError> {
        check_distinct(vars, "variable selection")?;
        vars.iter()
            .map(|v| {
                let axis = self
                    .dimension_of(v.name())
                    .ok_or_else(|| CoreError::UnknownVariable {
                        name: v.name().to_string(),
                    })?;
                if &self.variables[axis] != v {
                    return Err(CoreError::VariableMismatch {
                        name: v.name().to_string(),
                    });
                }
                Ok(axis)
            })
            .collect()
    }

    /// For each entry of this table, its offset in the marginal over `vars`.
    ///
    /// This is the restriction map `x ↦ s(x)` that projections use to look up
    /// a constraint entry for every full assignment.
    pub fn offsets_onto(&self, vars: &[RandomVariable]) -> Result<Vec<usize>, CoreError> {
        let axes = self.axes_of(vars)?;
        Ok(self.restriction(&axes))
    }

    fn restriction(&self, axes: &[usize]) -> Vec<usize> {
        let dims = self.table.dims();
        let factors = self.table.factors();
        let mut out_factors = vec![1usize; axes.len()];
        for j in (0..axes.len().saturating_sub(1)).rev() {
            out_factors[j] = out_factors[j + 1] * dims[axes[j + 1]];
        }
        (0..self.table.len())
            .map(|offset| {
                axes.iter()
                    .zip(&out_factors)
                    .map(|(&a, &f)| ((offset / factors[a]) % dims[a]) * f)
                    .sum()
            })
            .collect()
    }

    /// Marginal over `vars`, in the order given.
    pub fn marginalize(&self, vars: &[RandomVariable]) -> Result<JointDistribution, CoreError> {
        let axes = self.axes_of(vars)?;
        let mut marginal = JointDistribution::new(vars.to_vec())?;
        let out = marginal.table.data_mut();
        for (offset, target) in self.restriction(&axes).into_iter().enumerate() {
            out[target] += self.table.data()[offset];
        }
        Ok(marginal)
    }

    /// `P(priors | conds)`, zero wherever `P(conds) = 0`.
    ///
    /// # Errors
    ///
    /// Fails if either list is empty, the lists overlap, or either names a
    /// variable outside this distribution.
    pub fn conditional(
        &self,
        priors: &[RandomVariable],
        conds: &[RandomVariable],
    ) -> Result<ConditionalDistribution, CoreError> {
        check_distinct(priors, "conditional priors")?;
        check_distinct(conds, "conditional conditions")?;
        if let Some(v) = priors.iter().find(|p| conds.iter().any(|c| c.name() == p.name())) {
            return Err(CoreError::OverlappingVariables {
                name: v.name().to_string(),
            });
        }

        let both: Vec<RandomVariable> = conds.iter().chain(priors).cloned().collect();
        let numerator = self.marginalize(&both)?;
        let denominator = self.marginalize(conds)?;

        let mut cpd = ConditionalDistribution::new(priors.to_vec(), conds.to_vec())?;
        let row_len = cpd.row_len();
        for (row, &d) in denominator.values().iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            let num = &numerator.values()[row * row_len..(row + 1) * row_len];
            for (slot, &n) in cpd.row_mut(row).iter_mut().zip(num) {
                *slot = n / d;
            }
        }
        Ok(cpd)
    }

    /// Check that `other` is over exactly the same variables in the same order.
    pub fn check_same_scope(&self, other: &JointDistribution) -> Result<(), CoreError> {
        if self.variables != other.variables {
            return Err(CoreError::ScopeMismatch {
                left: self.names().join(", "),
                right: other.names().join(", "),
            });
        }
        Ok(())
    }
}

impl fmt::Display for JointDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "P({})", self.names().join(", "))?;
        for idx in self.table.indices() {
            let assignment: Vec<&str> = idx
                .iter()
                .zip(&self.variables)
                .map(|(&i, v)| v.states()[i].as_str())
                .collect();
            let value = self.table.get(&idx).map_err(|_| fmt::Error)?;
            writeln!(f, "  [{}] {:.6}", assignment.join(", "), value)?;
        }
        Ok(())
    }
}

/// Non-empty, no repeated names.
pub(crate) fn check_distinct(
    vars: &[RandomVariable],
    context: &'static str,
) -> Result<(), CoreError> {
    if vars.is_empty() {
        return Err(CoreError::EmptyVariables { context });
    }
    let mut seen = HashSet::new();
    for v in vars {
        if !seen.insert(v.name()) {
            return Err(CoreError::DuplicateVariable {
                name: v.name().to_string(),
            });
        }
    }
    Ok(())
}
