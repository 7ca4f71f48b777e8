//! # Tensors - Multi-dimensional Probability Tables
//!
//! A [`Tensor`] stores `∏ dᵢ` doubles in row-major order. Axis `i` has
//! stride `factorᵢ = ∏_{k>i} d_k`, so an index vector maps to the flat offset
//! `Σ idxᵢ · factorᵢ`. The mapping is a bijection between the index space and
//! `[0, ∏ dᵢ)`; [`Tensor::offset_of`] and [`Tensor::index_of`] are inverses.
//!
//! ```rust
//! use ipfp_core::Tensor;
//!
//! let mut t = Tensor::zeros(vec![2, 3]).unwrap();
//! t.set(&[1, 2], 0.5).unwrap();
//! assert_eq!(t.offset_of(&[1, 2]).unwrap(), 5);
//! assert_eq!(t.index_of(5).unwrap(), vec![1, 2]);
//! assert_eq!(t.get(&[1, 2]).unwrap(), 0.5);
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

/// Row-major table of doubles over a fixed list of dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tensor {
    dims: Vec<usize>,
    factors: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a tensor of zeros.
    ///
    /// # Errors
    ///
    /// Fails when `dims` is empty or any dimension is zero.
    pub fn zeros(dims: Vec<usize>) -> Result<Self, CoreError> {
        let factors = strides(&dims)?;
        let len = dims.iter().product();
        Ok(Self {
            dims,
            factors,
            data: vec![0.0; len],
        })
    }

    /// Create a tensor over existing row-major data.
    ///
    /// # Errors
    ///
    /// Fails on invalid dimensions or when `data.len() != ∏ dims`.
    pub fn from_data(dims: Vec<usize>, data: Vec<f64>) -> Result<Self, CoreError> {
        let factors = strides(&dims)?;
        let expected: usize = dims.iter().product();
        if data.len() != expected {
            return Err(CoreError::DataLengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            dims,
            factors,
            data,
        })
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Stride of each axis.
    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a tensor has at least one entry.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat data in offset order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat data in offset order.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the tensor, returning its flat data.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Flat offset of an index vector.
    pub fn offset_of(&self, index: &[usize]) -> Result<usize, CoreError> {
        if index.len() != self.dims.len() {
            return Err(CoreError::RankMismatch {
                expected: self.dims.len(),
                got: index.len(),
            });
        }
        let mut offset = 0;
        for (axis, (&i, &d)) in index.iter().zip(&self.dims).enumerate() {
            if i >= d {
                return Err(CoreError::IndexOutOfBounds {
                    axis,
                    index: i,
                    size: d,
                });
            }
            offset += i * self.factors[axis];
        }
        Ok(offset)
    }

    /// Index vector of a flat offset.
    pub fn index_of(&self, offset: usize) -> Result<Vec<usize>, CoreError> {
        if offset >= self.data.len() {
            return Err(CoreError::OffsetOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        let mut rest = offset;
        Ok(self
            .factors
            .iter()
            .map(|&f| {
                let i = rest / f;
                rest %= f;
                i
            })
            .collect())
    }

    /// Entry at an index vector.
    pub fn get(&self, index: &[usize]) -> Result<f64, CoreError> {
        Ok(self.data[self.offset_of(index)?])
    }

    /// Overwrite the entry at an index vector.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<(), CoreError> {
        let offset = self.offset_of(index)?;
        self.data[offset] = value;
        Ok(())
    }

    /// Entry at a flat offset.
    pub fn get_at(&self, offset: usize) -> Result<f64, CoreError> {
        self.data
            .get(offset)
            .copied()
            .ok_or(CoreError::OffsetOutOfBounds {
                offset,
                len: self.data.len(),
            })
    }

    /// Overwrite the entry at a flat offset.
    pub fn set_at(&mut self, offset: usize, value: f64) -> Result<(), CoreError> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(offset)
            .ok_or(CoreError::OffsetOutOfBounds { offset, len })?;
        *slot = value;
        Ok(())
    }

    /// Every index vector, in offset order.
    pub fn indices(&self) -> Indices {
        Indices {
            dims: self.dims.clone(),
            next: Some(vec![0; self.dims.len()]),
        }
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of the entries consistent with a partial assignment.
    ///
    /// `fixed` holds `(axis, index)` pairs; unmentioned axes are summed over.
    pub fn conditional_sum(&self, fixed: &[(usize, usize)]) -> Result<f64, CoreError> {
        for &(axis, index) in fixed {
            let size = *self.dims.get(axis).ok_or(CoreError::RankMismatch {
                expected: self.dims.len(),
                got: axis + 1,
            })?;
            if index >= size {
                return Err(CoreError::IndexOutOfBounds { axis, index, size });
            }
        }
        let total = self
            .data
            .iter()
            .enumerate()
            .filter(|(offset, _)| {
                fixed
                    .iter()
                    .all(|&(axis, index)| (offset / self.factors[axis]) % self.dims[axis] == index)
            })
            .map(|(_, v)| v)
            .sum();
        Ok(total)
    }

    /// Multiply every entry by `k`.
    pub fn scale(&mut self, k: f64) {
        self.data.iter_mut().for_each(|v| *v *= k);
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        write!(f, "Tensor[{}](", dims)?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", v)?;
        }
        write!(f, ")")
    }
}

fn strides(dims: &[usize]) -> Result<Vec<usize>, CoreError> {
    if dims.is_empty() {
        return Err(CoreError::NoDimensions);
    }
    if let Some(axis) = dims.iter().position(|&d| d == 0) {
        return Err(CoreError::ZeroDimension { axis });
    }
    let mut factors = vec![1; dims.len()];
    for i in (0..dims.len() - 1).rev() {
        factors[i] = factors[i + 1] * dims[i + 1];
    }
    Ok(factors)
}

// ============================================================================
// Index Enumeration
// ============================================================================

/// Odometer over the index vectors of a tensor, last axis fastest.
#[derive(Debug, Clone)]
pub struct Indices {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Indices {
    /// Enumerate every assignment of the given dimension sizes.
    ///
    /// An empty `dims` yields exactly one empty assignment. A zero-size
    /// dimension yields nothing.
    pub fn over(dims: &[usize]) -> Self {
        let next = if dims.iter().any(|&d| d == 0) {
            None
        } else {
            Some(vec![0; dims.len()])
        };
        Self {
            dims: dims.to_vec(),
            next,
        }
    }
}

impl Iterator for Indices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        let mut axis = self.dims.len();
        while axis > 0 {
            axis -= 1;
            succ[axis] += 1;
            if succ[axis] < self.dims[axis] {
                self.next = Some(succ);
                return Some(current);
            }
            succ[axis] = 0;
        }
        Some(current)
    }
}
