//! Conditional distributions `P(priors | conds)`.
//!
//! The table's axes are the condition variables followed by the prior
//! variables, so each condition assignment owns one contiguous row of
//! `∏ |prior states|` entries.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;
use crate::joint::check_distinct;
use crate::tensor::{Indices, Tensor};
use crate::variable::RandomVariable;

/// A conditional probability table over disjoint prior and condition lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalDistribution {
    priors: Vec<RandomVariable>,
    conds: Vec<RandomVariable>,
    table: Tensor,
}

impl ConditionalDistribution {
    /// Zero-filled table.
    ///
    /// # Errors
    ///
    /// Fails if either list is empty, repeats a variable, or the lists share
    /// a variable.
    pub fn new(priors: Vec<RandomVariable>, conds: Vec<RandomVariable>) -> Result<Self, CoreError> {
        let dims = check_lists(&priors, &conds)?;
        Ok(Self {
            table: Tensor::zeros(dims)?,
            priors,
            conds,
        })
    }

    /// Table with row-major values, conditions first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ipfp_core::{ConditionalDistribution, RandomVariable};
    ///
    /// let rain = RandomVariable::binary("Rain").unwrap();
    /// let cloudy = RandomVariable::binary("Cloudy").unwrap();
    ///
    /// // P(Rain | Cloudy): one row per Cloudy state
    /// let cpd = ConditionalDistribution::from_values(
    ///     vec![rain],
    ///     vec![cloudy],
    ///     vec![0.8, 0.2, 0.2, 0.8],
    /// ).unwrap();
    /// assert_eq!(cpd.row(1), &[0.2, 0.8]);
    /// ```
    pub fn from_values(
        priors: Vec<RandomVariable>,
        conds: Vec<RandomVariable>,
        values: Vec<f64>,
    ) -> Result<Self, CoreError> {
        let dims = check_lists(&priors, &conds)?;
        Ok(Self {
            table: Tensor::from_data(dims, values)?,
            priors,
            conds,
        })
    }

    pub fn priors(&self) -> &[RandomVariable] {
        &self.priors
    }

    pub fn conds(&self) -> &[RandomVariable] {
        &self.conds
    }

    /// Conditions followed by priors, matching the table's axes.
    pub fn variables(&self) -> Vec<RandomVariable> {
        self.conds.iter().chain(&self.priors).cloned().collect()
    }

    pub fn table(&self) -> &Tensor {
        &self.table
    }

    pub fn values(&self) -> &[f64] {
        self.table.data()
    }

    /// Number of condition assignments.
    pub fn num_rows(&self) -> usize {
        self.table.len() / self.row_len()
    }

    /// Number of prior assignments.
    pub fn row_len(&self) -> usize {
        self.priors.iter().map(RandomVariable::num_states).product()
    }

    /// Row for the condition assignment at `row` (offset order over `conds`).
    ///
    /// # Panics
    ///
    /// Panics if `row >= num_rows()`.
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.row_len();
        &self.table.data()[row * n..(row + 1) * n]
    }

    /// Mutable row, see [`row`](Self::row).
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let n = self.row_len();
        &mut self.table.data_mut()[row * n..(row + 1) * n]
    }

    /// Row index of a condition assignment given as state indices.
    pub fn row_of(&self, cond_states: &[usize]) -> Result<usize, CoreError> {
        let dims: Vec<usize> = self.conds.iter().map(RandomVariable::num_states).collect();
        Tensor::zeros(dims)?.offset_of(cond_states)
    }

    /// Every condition assignment, in row order.
    pub fn cond_assignments(&self) -> Indices {
        let dims: Vec<usize> = self.conds.iter().map(RandomVariable::num_states).collect();
        Indices::over(&dims)
    }

    /// `P(prior_states | cond_states)`.
    pub fn get(&self, prior_states: &[usize], cond_states: &[usize]) -> Result<f64, CoreError> {
        let idx: Vec<usize> = cond_states.iter().chain(prior_states).copied().collect();
        self.table.get(&idx)
    }

    /// Every entry in `[0, 1]` and every row sums to one within `0.01`.
    pub fn is_valid(&self) -> bool {
        self.values().iter().all(|&v| (0.0..=1.0).contains(&v))
            && (0..self.num_rows()).all(|r| (self.row(r).iter().sum::<f64>() - 1.0).abs() <= 0.01)
    }

    /// Normalize every row to unit mass. Rows with zero mass stay zero; their
    /// indices are returned.
    pub fn normalize_rows(&mut self) -> Vec<usize> {
        let mut empty = Vec::new();
        for r in 0..self.num_rows() {
            let row = self.row_mut(r);
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|v| *v /= total);
            } else {
                empty.push(r);
            }
        }
        empty
    }
}

impl fmt::Display for ConditionalDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |vs: &[RandomVariable]| {
            vs.iter()
                .map(RandomVariable::name)
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "P({} | {})", names(&self.priors), names(&self.conds))?;
        for (r, cond) in self.cond_assignments().enumerate() {
            let labels: Vec<&str> = cond
                .iter()
                .zip(&self.conds)
                .map(|(&i, v)| v.states()[i].as_str())
                .collect();
            let row: Vec<String> = self.row(r).iter().map(|p| format!("{:.6}", p)).collect();
            writeln!(f, "  [{}] {}", labels.join(", "), row.join(" "))?;
        }
        Ok(())
    }
}

fn check_lists(priors: &[RandomVariable], conds: &[RandomVariable]) -> Result<Vec<usize>, CoreError> {
    check_distinct(priors, "conditional priors")?;
    check_distinct(conds, "conditional conditions")?;
    if let Some(v) = priors.iter().find(|p| conds.iter().any(|c| c.name() == p.name())) {
        return Err(CoreError::OverlappingVariables {
            name: v.name().to_string(),
        });
    }
    Ok(conds
        .iter()
        .chain(priors)
        .map(RandomVariable::num_states)
        .collect())
}
