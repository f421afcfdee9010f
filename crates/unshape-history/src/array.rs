//! Dense row-major `f32` arrays carried by samples.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ArrayError;

/// An n-dimensional array of `f32` values stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Array {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Array {
    /// Creates an array, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ArrayError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ArrayError::ShapeMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates an array filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Creates an array whose values are computed from their flat index.
    pub fn from_fn(shape: Vec<usize>, f: impl FnMut(usize) -> f32) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: (0..len).map(f).collect(),
        }
    }

    /// Returns the array shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the elements in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the smallest and largest element, or `None` when empty.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let first = *self.data.first()?;
        Some(
            self.data
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Reverses the order of elements along `axis`.
    pub fn flip(&self, axis: usize) -> Result<Self, ArrayError> {
        self.check_axis(axis)?;
        let dim = self.shape[axis];
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();

        let mut data = Vec::with_capacity(self.data.len());
        for o in 0..outer {
            for i in (0..dim).rev() {
                let start = (o * dim + i) * inner;
                data.extend_from_slice(&self.data[start..start + inner]);
            }
        }

        Ok(Self {
            shape: self.shape.clone(),
            data,
        })
    }

    /// Flips along every axis in `axes`.
    pub fn flip_axes(&self, axes: &[usize]) -> Result<Self, ArrayError> {
        axes.iter()
            .try_fold(self.clone(), |array, &axis| array.flip(axis))
    }

    /// Inserts an axis of length 1 at `axis`.
    pub fn insert_axis(mut self, axis: usize) -> Result<Self, ArrayError> {
        if axis > self.shape.len() {
            return Err(ArrayError::AxisOutOfBounds {
                axis,
                ndim: self.shape.len(),
            });
        }
        self.shape.insert(axis, 1);
        Ok(self)
    }

    fn check_axis(&self, axis: usize) -> Result<(), ArrayError> {
        if axis >= self.shape.len() {
            return Err(ArrayError::AxisOutOfBounds {
                axis,
                ndim: self.shape.len(),
            });
        }
        Ok(())
    }
}
