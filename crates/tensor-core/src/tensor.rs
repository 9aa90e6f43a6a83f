// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{Shape, TensorError};

/// An owned, n-dimensional `f32` tensor stored in contiguous memory.
///
/// `Tensor` is the data carrier for layer parameters, gradients, and
/// activations. It owns its buffer and exposes immutable views via
/// [`TensorView`].
///
/// # Memory Layout
/// Data is stored in row-major (C) order. The last dimension is contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::matrix(2, 3));
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.num_elements();
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    /// Takes ownership of `data` as the buffer of a tensor with `shape`.
    ///
    /// Returns an error if `data.len()` differs from `shape.num_elements()`.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a tensor by copying a slice of `f32` values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_f32_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_vec(shape, values.to_vec())
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape.clone(),
            data: &self.data,
        }
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.data.len()
    }

    /// Returns the memory footprint of this tensor's buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes()
    }

    /// Returns the buffer as a flat slice.
    pub fn as_f32_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the buffer as a flat mutable slice.
    pub fn as_f32_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Fills the tensor with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Reinterprets the buffer under a new shape with the same element count.
    pub fn reshape(self, shape: Shape) -> Result<Self, TensorError> {
        if shape.num_elements() != self.shape.num_elements() {
            return Err(TensorError::InvalidReshape {
                from: self.shape,
                to: shape,
            });
        }
        Ok(Self {
            shape,
            data: self.data,
        })
    }

    /// Element-wise `self += other`. Shapes must match exactly.
    pub fn add_assign(&mut self, other: &TensorView<'_>) -> Result<(), TensorError> {
        if &self.shape != other.shape() {
            return Err(TensorError::ShapeMismatch {
                op: "add_assign",
                lhs: self.shape.clone(),
                rhs: other.shape().clone(),
            });
        }
        self.data
            .iter_mut()
            .zip(other.as_f32_slice())
            .for_each(|(a, b)| *a += b);
        Ok(())
    }
}

/// A borrowed, read-only view over a [`Tensor`]'s data.
///
/// Views are zero-copy and tied to the lifetime of the source buffer,
/// enforced by the borrow checker. A view may carry a different shape than
/// its source as long as the element count agrees (see [`TensorView::reshape`]).
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    shape: Shape,
    data: &'a [f32],
}

impl<'a> TensorView<'a> {
    /// Returns the shape of the view.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the viewed data as a flat slice.
    pub fn as_f32_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns a view of the same data under a new shape.
    pub fn reshape(&self, shape: Shape) -> Result<TensorView<'a>, TensorError> {
        if shape.num_elements() != self.shape.num_elements() {
            return Err(TensorError::InvalidReshape {
                from: self.shape.clone(),
                to: shape,
            });
        }
        Ok(TensorView {
            shape,
            data: self.data,
        })
    }

    /// Views a batched tensor `[N, ...]` as the matrix `[N, prod(...)]`.
    pub fn flatten_batch(&self) -> Result<TensorView<'a>, TensorError> {
        let (batch, features) =
            self.shape
                .batch_flattened()
                .ok_or_else(|| TensorError::RankMismatch {
                    op: "flatten_batch",
                    expected: 1,
                    shape: self.shape.clone(),
                })?;
        self.reshape(Shape::matrix(batch, features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3));
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert!(t.as_f32_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_f32() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_f32(Shape::matrix(2, 3), &data).unwrap();
        assert_eq!(t.as_f32_slice(), &data);
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = Tensor::from_vec(Shape::matrix(2, 3), vec![0.0; 5]);
        assert_eq!(
            result.unwrap_err(),
            TensorError::BufferSizeMismatch {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_view_lifetime() {
        let t = Tensor::from_f32(Shape::vector(4), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let v = t.view();
        assert_eq!(v.shape(), &Shape::vector(4));
        assert_eq!(v.as_f32_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fill() {
        let mut t = Tensor::zeros(Shape::vector(5));
        t.fill(3.5);
        assert!(t.as_f32_slice().iter().all(|&x| x == 3.5));
    }

    #[test]
    fn test_as_f32_mut() {
        let mut t = Tensor::zeros(Shape::vector(3));
        let slice = t.as_f32_slice_mut();
        slice[0] = 10.0;
        slice[1] = 20.0;
        slice[2] = 30.0;
        assert_eq!(t.as_f32_slice(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_reshape_preserves_data() {
        let t = Tensor::from_f32(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let r = t.reshape(Shape::tensor3(3, 2, 1)).unwrap();
        assert_eq!(r.shape(), &Shape::tensor3(3, 2, 1));
        assert_eq!(r.as_f32_slice()[5], 6.0);
    }

    #[test]
    fn test_reshape_rejects_count_change() {
        let t = Tensor::zeros(Shape::matrix(2, 3));
        assert!(matches!(
            t.reshape(Shape::matrix(2, 2)),
            Err(TensorError::InvalidReshape { .. })
        ));
    }

    #[test]
    fn test_flatten_batch_of_images() {
        let t = Tensor::zeros(Shape::new(vec![2, 3, 4, 5]));
        let v = t.view();
        let m = v.flatten_batch().unwrap();
        assert_eq!(m.shape(), &Shape::matrix(2, 60));
        assert_eq!(m.as_f32_slice().len(), 120);
    }

    #[test]
    fn test_flatten_batch_scalar_fails() {
        let t = Tensor::zeros(Shape::scalar());
        assert!(matches!(
            t.view().flatten_batch(),
            Err(TensorError::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_add_assign() {
        let mut a = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
        let b = Tensor::from_f32(Shape::vector(3), &[0.5, 0.5, 0.5]).unwrap();
        a.add_assign(&b.view()).unwrap();
        assert_eq!(a.as_f32_slice(), &[1.5, 2.5, 3.5]);

        let c = Tensor::zeros(Shape::vector(4));
        assert!(a.add_assign(&c.view()).is_err());
        assert_eq!(a.as_f32_slice(), &[1.5, 2.5, 3.5]);
    }
}
