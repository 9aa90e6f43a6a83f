// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Row-wise outer products and their contractions.
//!
//! For a batch of vector pairs `a[n] (len p)` and `b[n] (len q)`, the
//! row-wise outer product lays `a[n] ⊗ b[n]` out as one flat row of length
//! `p * q` with index `j * q + k`. This turns a 3-index contraction against
//! a `[p, q, m]` tensor into an ordinary `[N, p*q] x [p*q, m]` matrix
//! multiply. [`row_contract`] is the adjoint step: it folds a `[N, p, q]`
//! block back onto one factor.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Which factor of a pair survives a [`row_contract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairAxis {
    /// Keep `j` (length `p`), sum over `k` against a `[N, q]` factor.
    First,
    /// Keep `k` (length `q`), sum over `j` against a `[N, p]` factor.
    Second,
}

/// Validates shapes for [`row_outer_product`]; returns `(N, p, q)`.
pub fn outer_dims(a: &Shape, b: &Shape, out: &Shape) -> Result<(usize, usize, usize), TensorError> {
    let (n, p) = matrix_dims("row_outer_product (lhs)", a)?;
    let (n_b, q) = matrix_dims("row_outer_product (rhs)", b)?;
    if n != n_b {
        return Err(TensorError::ShapeMismatch {
            op: "row_outer_product",
            lhs: a.clone(),
            rhs: b.clone(),
        });
    }
    let expected = Shape::matrix(n, p * q);
    if out != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "row_outer_product (output)",
            lhs: expected,
            rhs: out.clone(),
        });
    }
    Ok((n, p, q))
}

/// Computes `out[n, j*q + k] = a[n, j] * b[n, k]`.
///
/// `a` is `[N, p]`, `b` is `[N, q]`, `out` must be `[N, p*q]`.
///
/// # Examples
/// ```
/// use tensor_core::{row_outer_product, Shape, Tensor};
/// let a = Tensor::from_f32(Shape::matrix(1, 2), &[1.0, 2.0]).unwrap();
/// let b = Tensor::from_f32(Shape::matrix(1, 3), &[1.0, 10.0, 100.0]).unwrap();
/// let mut out = Tensor::zeros(Shape::matrix(1, 6));
/// row_outer_product(&a.view(), &b.view(), &mut out).unwrap();
/// assert_eq!(out.as_f32_slice(), &[1.0, 10.0, 100.0, 2.0, 20.0, 200.0]);
/// ```
pub fn row_outer_product(
    a: &TensorView<'_>,
    b: &TensorView<'_>,
    out: &mut Tensor,
) -> Result<(), TensorError> {
    let (_, p, q) = outer_dims(a.shape(), b.shape(), out.shape())?;
    let a = a.as_f32_slice();
    let b = b.as_f32_slice();
    if p * q == 0 {
        return Ok(());
    }
    for (n, row) in out.as_f32_slice_mut().chunks_mut(p * q).enumerate() {
        outer_row(&a[n * p..(n + 1) * p], &b[n * q..(n + 1) * q], row);
    }
    Ok(())
}

/// Writes the flattened outer product of one sample into `out_row`.
pub fn outer_row(a_row: &[f32], b_row: &[f32], out_row: &mut [f32]) {
    let q = b_row.len();
    for (j, &av) in a_row.iter().enumerate() {
        let dst = &mut out_row[j * q..(j + 1) * q];
        for (o, &bv) in dst.iter_mut().zip(b_row) {
            *o = av * bv;
        }
    }
}

/// Validates shapes for [`row_contract`]; returns `(N, p, q)`.
pub fn contract_dims(
    pairs: &Shape,
    factor: &Shape,
    keep: PairAxis,
    out: &Shape,
) -> Result<(usize, usize, usize), TensorError> {
    let (n, p, q) = match pairs.dims() {
        &[n, p, q] => (n, p, q),
        _ => {
            return Err(TensorError::RankMismatch {
                op: "row_contract",
                expected: 3,
                shape: pairs.clone(),
            })
        }
    };
    let (summed, kept) = match keep {
        PairAxis::First => (q, p),
        PairAxis::Second => (p, q),
    };
    if factor != &Shape::matrix(n, summed) {
        return Err(TensorError::ShapeMismatch {
            op: "row_contract (factor)",
            lhs: pairs.clone(),
            rhs: factor.clone(),
        });
    }
    let expected = Shape::matrix(n, kept);
    if out != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "row_contract (output)",
            lhs: expected,
            rhs: out.clone(),
        });
    }
    Ok((n, p, q))
}

/// Folds a `[N, p, q]` block onto one factor, accumulating into `out`.
///
/// - `PairAxis::First`: `out[n, j] += Σ_k pairs[n, j, k] * factor[n, k]`
/// - `PairAxis::Second`: `out[n, k] += Σ_j pairs[n, j, k] * factor[n, j]`
///
/// With `beta == 0.0` the previous contents of `out` are discarded first.
pub fn row_contract(
    pairs: &TensorView<'_>,
    factor: &TensorView<'_>,
    keep: PairAxis,
    beta: f32,
    out: &mut Tensor,
) -> Result<(), TensorError> {
    let (n, p, q) = contract_dims(pairs.shape(), factor.shape(), keep, out.shape())?;
    let t = pairs.as_f32_slice();
    let f = factor.as_f32_slice();
    let (f_len, o_len) = match keep {
        PairAxis::First => (q, p),
        PairAxis::Second => (p, q),
    };
    let o = out.as_f32_slice_mut();
    for s in 0..n {
        contract_row(
            &t[s * p * q..(s + 1) * p * q],
            &f[s * f_len..(s + 1) * f_len],
            keep,
            p,
            q,
            beta,
            &mut o[s * o_len..(s + 1) * o_len],
        );
    }
    Ok(())
}

/// Contracts one sample's `[p, q]` block against its factor row.
pub fn contract_row(
    pair_row: &[f32],
    factor_row: &[f32],
    keep: PairAxis,
    p: usize,
    q: usize,
    beta: f32,
    out_row: &mut [f32],
) {
    if beta == 0.0 {
        out_row.iter_mut().for_each(|x| *x = 0.0);
    } else if beta != 1.0 {
        out_row.iter_mut().for_each(|x| *x *= beta);
    }
    match keep {
        PairAxis::First => {
            for (j, o) in out_row.iter_mut().enumerate().take(p) {
                let block = &pair_row[j * q..(j + 1) * q];
                *o += block.iter().zip(factor_row).map(|(t, f)| t * f).sum::<f32>();
            }
        }
        PairAxis::Second => {
            for (j, &fj) in factor_row.iter().enumerate().take(p) {
                let block = &pair_row[j * q..(j + 1) * q];
                for (o, &t) in out_row.iter_mut().zip(block) {
                    *o += fj * t;
                }
            }
        }
    }
}

fn matrix_dims(op: &'static str, shape: &Shape) -> Result<(usize, usize), TensorError> {
    shape.as_matrix().ok_or_else(|| TensorError::RankMismatch {
        op,
        expected: 2,
        shape: shape.clone(),
    })
}
