// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix multiplication operations.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Whether an operand of [`gemm`] is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    /// Use the operand as stored.
    No,
    /// Use the transpose of the operand.
    Yes,
}

/// Problem size of a `[M, K] x [K, N]` product after transposes are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmDims {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

/// Validates operand shapes for [`gemm`] and returns the problem size.
///
/// Both operands and the output must be 2-D. After applying the transpose
/// flags `lhs` is `[M, K]`, `rhs` is `[K, N]`, and `out` must be `[M, N]`.
pub fn gemm_dims(
    lhs: &Shape,
    lhs_t: Transpose,
    rhs: &Shape,
    rhs_t: Transpose,
    out: &Shape,
) -> Result<GemmDims, TensorError> {
    let (m, k) = oriented("gemm (lhs)", lhs, lhs_t)?;
    let (k_rhs, n) = oriented("gemm (rhs)", rhs, rhs_t)?;
    if k != k_rhs {
        return Err(TensorError::ShapeMismatch {
            op: "gemm",
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        });
    }
    let expected = Shape::matrix(m, n);
    if out != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "gemm (output)",
            lhs: expected,
            rhs: out.clone(),
        });
    }
    Ok(GemmDims { m, k, n })
}

fn oriented(op: &'static str, shape: &Shape, t: Transpose) -> Result<(usize, usize), TensorError> {
    let (rows, cols) = shape.as_matrix().ok_or_else(|| TensorError::RankMismatch {
        op,
        expected: 2,
        shape: shape.clone(),
    })?;
    Ok(match t {
        Transpose::No => (rows, cols),
        Transpose::Yes => (cols, rows),
    })
}

/// General matrix multiply: `out = op(lhs) @ op(rhs) + beta * out`.
///
/// With `beta == 0.0` the previous contents of `out` are ignored (NaNs in
/// `out` do not propagate). With `beta == 1.0` the product is accumulated.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] or [`TensorError::RankMismatch`]
/// if the operands are incompatible. `out` is untouched on error.
pub fn gemm(
    lhs: &TensorView<'_>,
    lhs_t: Transpose,
    rhs: &TensorView<'_>,
    rhs_t: Transpose,
    beta: f32,
    out: &mut Tensor,
) -> Result<(), TensorError> {
    let dims = gemm_dims(lhs.shape(), lhs_t, rhs.shape(), rhs_t, out.shape())?;
    let a = lhs.as_f32_slice();
    let b = rhs.as_f32_slice();
    let c = out.as_f32_slice_mut();
    if dims.n == 0 {
        return Ok(());
    }
    for (i, c_row) in c.chunks_mut(dims.n).enumerate() {
        gemm_row(a, lhs_t, b, rhs_t, dims, i, beta, c_row);
    }
    Ok(())
}

/// Performs matrix multiplication: `output = lhs @ rhs`.
///
/// `lhs` is `[M, K]`, `rhs` is `[K, N]`, and `output` must be `[M, N]`.
pub fn matmul(
    lhs: &TensorView<'_>,
    rhs: &TensorView<'_>,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    gemm(lhs, Transpose::No, rhs, Transpose::No, 0.0, output)
}

/// Computes row `i` of a [`gemm`] into `c_row` (length `dims.n`).
///
/// Exposed so that parallel backends can split the output by rows and share
/// the same arithmetic as the serial path. Callers must have validated the
/// operands with [`gemm_dims`].
#[allow(clippy::too_many_arguments)]
pub fn gemm_row(
    a: &[f32],
    lhs_t: Transpose,
    b: &[f32],
    rhs_t: Transpose,
    dims: GemmDims,
    i: usize,
    beta: f32,
    c_row: &mut [f32],
) {
    let GemmDims { m, k, n } = dims;
    if beta == 0.0 {
        c_row.iter_mut().for_each(|x| *x = 0.0);
    } else if beta != 1.0 {
        c_row.iter_mut().for_each(|x| *x *= beta);
    }

    let a_at = |p: usize| match lhs_t {
        Transpose::No => a[i * k + p],
        Transpose::Yes => a[p * m + i],
    };

    match rhs_t {
        // ikj: the inner loop is a saxpy over a contiguous row of B.
        Transpose::No => {
            for p in 0..k {
                let a_ip = a_at(p);
                let b_row = &b[p * n..(p + 1) * n];
                for (c, &bv) in c_row.iter_mut().zip(b_row) {
                    *c += a_ip * bv;
                }
            }
        }
        // B^T row j is a contiguous row of B, so each output is a dot product.
        Transpose::Yes => {
            for (j, c) in c_row.iter_mut().enumerate() {
                let b_row = &b[j * k..(j + 1) * k];
                let mut acc = 0.0f32;
                for (p, &bv) in b_row.iter().enumerate() {
                    acc += a_at(p) * bv;
                }
                *c += acc;
            }
        }
    }
}
