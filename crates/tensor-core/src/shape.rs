// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Row-major shape descriptors.

use std::fmt;

/// Dimensions of a row-major [`crate::Tensor`]; the last axis is contiguous.
///
/// A layer works with three families of shapes: batched inputs `[N, ...]`
/// that fold to `[N, features]`, matrices for the dense kernels, and the
/// rank-3 parameter `[d1, d2, out]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Rank 0; holds one element.
    pub fn scalar() -> Self {
        Self::new(Vec::new())
    }

    pub fn vector(len: usize) -> Self {
        Self::new(vec![len])
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self::new(vec![rows, cols])
    }

    pub fn tensor3(d0: usize, d1: usize, d2: usize) -> Self {
        Self::new(vec![d0, d1, d2])
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Product of all dimensions (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Size of axis `index`, or `None` past the last axis.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Bytes occupied by an `f32` buffer of this shape.
    pub fn size_bytes(&self) -> usize {
        self.num_elements() * std::mem::size_of::<f32>()
    }

    /// `(rows, cols)` for a rank-2 shape.
    pub fn as_matrix(&self) -> Option<(usize, usize)> {
        match self.dims[..] {
            [rows, cols] => Some((rows, cols)),
            _ => None,
        }
    }

    /// Splits off the leading (batch) dimension and folds the rest.
    ///
    /// A batch of images `[N, C, H, W]` becomes `(N, C * H * W)`. Returns
    /// `None` for a scalar shape.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![4, 3, 2, 2]);
    /// assert_eq!(s.batch_flattened(), Some((4, 12)));
    /// ```
    pub fn batch_flattened(&self) -> Option<(usize, usize)> {
        let (&batch, rest) = self.dims.split_first()?;
        Some((batch, rest.iter().product()))
    }

    /// Row-major element strides.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.dims.len()];
        for i in (1..self.dims.len()).rev() {
            strides[i - 1] = strides[i] * self.dims[i];
        }
        strides
    }

    /// Flat buffer offset of a multi-index, or `None` if the index has the
    /// wrong rank or is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let w = Shape::tensor3(3, 2, 4);
    /// assert_eq!(w.offset(&[1, 1, 2]), Some(14));
    /// assert_eq!(w.offset(&[3, 0, 0]), None);
    /// ```
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() || index.iter().zip(&self.dims).any(|(i, d)| i >= d) {
            return None;
        }
        Some(index.iter().zip(self.strides()).map(|(i, s)| i * s).sum())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.num_elements(), 1);
        assert_eq!(s.offset(&[]), Some(0));
        assert_eq!(s.as_matrix(), None);
    }

    #[test]
    fn test_parameter_shape_strides() {
        let w = Shape::tensor3(3, 2, 4);
        assert_eq!(w.strides(), vec![8, 4, 1]);
        assert_eq!(w.size_bytes(), 96);
        // W[j, k, :] starts at (j * d2 + k) * out.
        for j in 0..3 {
            for k in 0..2 {
                assert_eq!(w.offset(&[j, k, 0]), Some((j * 2 + k) * 4));
            }
        }
    }

    #[test]
    fn test_offset_rejects_bad_index() {
        let s = Shape::matrix(2, 3);
        assert_eq!(s.offset(&[1, 2]), Some(5));
        assert_eq!(s.offset(&[2, 0]), None);
        assert_eq!(s.offset(&[1]), None);
    }

    #[test]
    fn test_as_matrix() {
        assert_eq!(Shape::matrix(3, 4).as_matrix(), Some((3, 4)));
        assert_eq!(Shape::vector(3).as_matrix(), None);
        assert_eq!(Shape::tensor3(1, 2, 3).as_matrix(), None);
    }

    #[test]
    fn test_batch_flattened() {
        assert_eq!(Shape::matrix(5, 7).batch_flattened(), Some((5, 7)));
        assert_eq!(Shape::vector(5).batch_flattened(), Some((5, 1)));
        assert_eq!(Shape::tensor3(2, 3, 4).batch_flattened(), Some((2, 12)));
        assert_eq!(Shape::new(vec![0, 3, 2]).batch_flattened(), Some((0, 6)));
        assert_eq!(Shape::scalar().batch_flattened(), None);
    }

    #[test]
    fn test_display_and_dim() {
        let s: Shape = vec![2, 3, 4].into();
        assert_eq!(format!("{s}"), "[2, 3, 4]");
        assert_eq!(s.dim(1), Some(3));
        assert_eq!(s.dim(3), None);
    }
}
