// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Forward evaluation of the bilinear contraction.
//!
//! ```text
//! y[n, l] = Σ_j Σ_k e1[n, j] · e2[n, k] · W[j, k, l]
//!         + Σ_j e1[n, j] · V1[j, l] + Σ_k e2[n, k] · V2[k, l] + b[l]   (with bias)
//! ```
//!
//! Both functions here take the already-flattened `[N, d1]` / `[N, d2]`
//! input matrices and return a freshly allocated `[N, out]` output.

use crate::device::DeviceRuntime;
use crate::{type_check, NetworkError, ParameterStore, ShapeError};
use tensor_core::{Shape, Tensor, TensorView, Transpose};

/// Checks `e1`/`e2` against the store's dimensions and returns `N`.
pub(crate) fn check_operands(
    params: &ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
) -> Result<usize, ShapeError> {
    let (d1, d2, _) = params.dims();
    type_check::check_forward([d1, d2], &[e1.shape(), e2.shape()])
}

/// Nested-loop contraction on the calling thread.
///
/// The innermost loop runs over the contiguous `out` axis of `W`, `V1`,
/// `V2`, and `y`.
pub fn reference(
    params: &ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
) -> Result<Tensor, ShapeError> {
    let n = check_operands(params, e1, e2)?;
    let (d1, d2, out) = params.dims();
    let (e1, e2) = (e1.as_f32_slice(), e2.as_f32_slice());
    let w = params.w().as_f32_slice();

    let mut y = Tensor::zeros(Shape::matrix(n, out));
    for (s, y_row) in y.as_f32_slice_mut().chunks_mut(out).enumerate() {
        let e1_row = &e1[s * d1..(s + 1) * d1];
        let e2_row = &e2[s * d2..(s + 1) * d2];

        for (j, &a) in e1_row.iter().enumerate() {
            for (k, &b) in e2_row.iter().enumerate() {
                let coef = a * b;
                let w_jk = &w[(j * d2 + k) * out..(j * d2 + k + 1) * out];
                for (y, &wv) in y_row.iter_mut().zip(w_jk) {
                    *y += coef * wv;
                }
            }
        }

        if let Some(bias) = params.bias() {
            axpy_rows(e1_row, bias.v1.as_f32_slice(), y_row);
            axpy_rows(e2_row, bias.v2.as_f32_slice(), y_row);
            for (y, &bv) in y_row.iter_mut().zip(bias.b.as_f32_slice()) {
                *y += bv;
            }
        }
    }
    Ok(y)
}

/// `y_row += Σ_i x[i] · m[i, :]` for a row-major `m` with `y_row.len()` columns.
fn axpy_rows(x: &[f32], m: &[f32], y_row: &mut [f32]) {
    let cols = y_row.len();
    for (i, &xv) in x.iter().enumerate() {
        for (y, &mv) in y_row.iter_mut().zip(&m[i * cols..(i + 1) * cols]) {
            *y += xv * mv;
        }
    }
}

/// Outer-product + matmul decomposition on `device`.
///
/// 1. `P = row_outer_product(e1, e2)`, `[N, d1*d2]`
/// 2. `y = P @ W_mat` with `W_mat = W` viewed as `[d1*d2, out]`
/// 3. `y += e1 @ V1 + e2 @ V2`, then `y += b` per row (with bias)
///
/// Nothing is returned unless every stage succeeds.
pub fn on_device(
    device: &dyn DeviceRuntime,
    params: &ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
) -> Result<Tensor, NetworkError> {
    let n = check_operands(params, e1, e2)?;
    let (d1, d2, out) = params.dims();

    let mut pairs = Tensor::zeros(Shape::matrix(n, d1 * d2));
    device.row_outer_product(e1, e2, &mut pairs)?;

    let mut y = Tensor::zeros(Shape::matrix(n, out));
    device.gemm(
        &pairs.view(),
        Transpose::No,
        &params.w_matrix()?,
        Transpose::No,
        0.0,
        &mut y,
    )?;

    if let Some(bias) = params.bias() {
        device.gemm(e1, Transpose::No, &bias.v1.view(), Transpose::No, 1.0, &mut y)?;
        device.gemm(e2, Transpose::No, &bias.v2.view(), Transpose::No, 1.0, &mut y)?;
        device.add_row_broadcast(&mut y, &bias.b.view())?;
    }
    Ok(y)
}
