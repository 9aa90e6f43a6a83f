// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Row broadcasting and its adjoint, the column sum.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Adds `row` (`[M]`) to every row of `out` (`[N, M]`).
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] unless `out` is a matrix whose
/// row length equals `row`'s length.
pub fn add_row_broadcast(out: &mut Tensor, row: &TensorView<'_>) -> Result<(), TensorError> {
    let m = broadcast_dims(out.shape(), row.shape())?;
    let r = row.as_f32_slice();
    if m == 0 {
        return Ok(());
    }
    for out_row in out.as_f32_slice_mut().chunks_mut(m) {
        for (o, &b) in out_row.iter_mut().zip(r) {
            *o += b;
        }
    }
    Ok(())
}

/// Validates shapes for [`add_row_broadcast`]; returns the row length.
pub fn broadcast_dims(out: &Shape, row: &Shape) -> Result<usize, TensorError> {
    match out.as_matrix() {
        Some((_, m)) if row == &Shape::vector(m) => Ok(m),
        _ => Err(TensorError::ShapeMismatch {
            op: "add_row_broadcast",
            lhs: out.clone(),
            rhs: row.clone(),
        }),
    }
}

/// Column sum: `out[l] = Σ_n x[n, l] + beta * out[l]`.
///
/// `x` is `[N, M]`, `out` must be `[M]`.
pub fn sum_rows(x: &TensorView<'_>, beta: f32, out: &mut Tensor) -> Result<(), TensorError> {
    let m = broadcast_dims(x.shape(), out.shape()).map_err(|_| TensorError::ShapeMismatch {
        op: "sum_rows",
        lhs: x.shape().clone(),
        rhs: out.shape().clone(),
    })?;
    let o = out.as_f32_slice_mut();
    if beta == 0.0 {
        o.iter_mut().for_each(|v| *v = 0.0);
    } else if beta != 1.0 {
        o.iter_mut().for_each(|v| *v *= beta);
    }
    if m == 0 {
        return Ok(());
    }
    for x_row in x.as_f32_slice().chunks(m) {
        for (acc, &v) in o.iter_mut().zip(x_row) {
            *acc += v;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_row_broadcast() {
        let mut y = Tensor::from_f32(Shape::matrix(2, 3), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = Tensor::from_f32(Shape::vector(3), &[10.0, 20.0, 30.0]).unwrap();

        add_row_broadcast(&mut y, &b.view()).unwrap();

        assert_eq!(y.as_f32_slice(), &[10.0, 21.0, 32.0, 13.0, 24.0, 35.0]);
    }

    #[test]
    fn test_add_row_broadcast_length_mismatch() {
        let mut y = Tensor::zeros(Shape::matrix(2, 3));
        let b = Tensor::zeros(Shape::vector(2));
        assert!(add_row_broadcast(&mut y, &b.view()).is_err());
    }

    #[test]
    fn test_sum_rows() {
        let x = Tensor::from_f32(Shape::matrix(3, 2), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut out = Tensor::from_f32(Shape::vector(2), &[100.0, 100.0]).unwrap();

        sum_rows(&x.view(), 0.0, &mut out).unwrap();
        assert_eq!(out.as_f32_slice(), &[9.0, 12.0]);

        sum_rows(&x.view(), 1.0, &mut out).unwrap();
        assert_eq!(out.as_f32_slice(), &[18.0, 24.0]);
    }

    #[test]
    fn test_sum_rows_shape_mismatch() {
        let x = Tensor::zeros(Shape::matrix(3, 2));
        let mut out = Tensor::zeros(Shape::vector(3));
        assert!(matches!(
            sum_rows(&x.view(), 0.0, &mut out),
            Err(TensorError::ShapeMismatch { op: "sum_rows", .. })
        ));
    }
}
