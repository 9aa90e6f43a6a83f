// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reverse-mode gradients of the bilinear contraction.
//!
//! ```text
//! gW[j, k, l] += Σ_n e1[n, j] · e2[n, k] · gy[n, l]
//! gV1[j, l]   += Σ_n e1[n, j] · gy[n, l]                          (with bias)
//! gV2[k, l]   += Σ_n e2[n, k] · gy[n, l]                          (with bias)
//! gb[l]       += Σ_n gy[n, l]                                     (with bias)
//! ge1[n, j]    = Σ_k Σ_l e2[n, k] · W[j, k, l] · gy[n, l]  (+ Σ_l gy[n, l] · V1[j, l])
//! ge2[n, k]    = Σ_j Σ_l e1[n, j] · W[j, k, l] · gy[n, l]  (+ Σ_l gy[n, l] · V2[k, l])
//! ```
//!
//! Parameter gradients are added into the store's accumulators. Input
//! gradients are returned fresh as `([N, d1], [N, d2])`.

use crate::device::DeviceRuntime;
use crate::forward::check_operands;
use crate::params::GradientDelta;
use crate::{type_check, BiasTerms, NetworkError, ParameterStore, ShapeError};
use tensor_core::{PairAxis, Shape, Tensor, TensorView, Transpose};

/// Validates all three operands; returns `N`. Runs before any accumulator is touched.
fn check_all(
    params: &ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
    gy: &TensorView<'_>,
) -> Result<usize, ShapeError> {
    let n = check_operands(params, e1, e2)?;
    let (_, _, out) = params.dims();
    type_check::check_backward(n, out, gy.shape())?;
    Ok(n)
}

/// Nested-loop gradients on the calling thread, accumulated in place.
///
/// For each `(n, j, k)` the dot product `W[j, k, :] · gy[n, :]` is formed
/// once and shared by both input gradients; the `gW` update runs over the
/// same contiguous fiber.
pub fn reference(
    params: &mut ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
    gy: &TensorView<'_>,
) -> Result<(Tensor, Tensor), ShapeError> {
    let n = check_all(params, e1, e2, gy)?;
    let (d1, d2, out) = params.dims();
    let (e1, e2, gy) = (e1.as_f32_slice(), e2.as_f32_slice(), gy.as_f32_slice());

    let mut ge1 = Tensor::zeros(Shape::matrix(n, d1));
    let mut ge2 = Tensor::zeros(Shape::matrix(n, d2));
    let (w, bias, gw, mut bias_grads) = params.split_for_backward();
    let w = w.as_f32_slice();
    let gw = gw.as_f32_slice_mut();
    let ge1_all = ge1.as_f32_slice_mut();
    let ge2_all = ge2.as_f32_slice_mut();

    for s in 0..n {
        let e1_row = &e1[s * d1..(s + 1) * d1];
        let e2_row = &e2[s * d2..(s + 1) * d2];
        let gy_row = &gy[s * out..(s + 1) * out];
        let ge1_row = &mut ge1_all[s * d1..(s + 1) * d1];
        let ge2_row = &mut ge2_all[s * d2..(s + 1) * d2];

        for (j, &a) in e1_row.iter().enumerate() {
            for (k, &b) in e2_row.iter().enumerate() {
                let fiber = (j * d2 + k) * out..(j * d2 + k + 1) * out;
                let coef = a * b;
                let mut t = 0.0f32;
                for ((g, &wv), &gv) in gw[fiber.clone()].iter_mut().zip(&w[fiber]).zip(gy_row) {
                    *g += coef * gv;
                    t += wv * gv;
                }
                ge1_row[j] += b * t;
                ge2_row[k] += a * t;
            }
        }

        if let (Some(terms), Some(grads)) = (bias, bias_grads.as_deref_mut()) {
            linear_backward(e1_row, gy_row, &terms.v1, &mut grads.v1, ge1_row);
            linear_backward(e2_row, gy_row, &terms.v2, &mut grads.v2, ge2_row);
            for (g, &gv) in grads.b.as_f32_slice_mut().iter_mut().zip(gy_row) {
                *g += gv;
            }
        }
    }

    Ok((ge1, ge2))
}

/// One sample of `y += x · V`: `gV[i, :] += x[i] · gy`, `gx[i] += V[i, :] · gy`.
fn linear_backward(x: &[f32], gy: &[f32], v: &Tensor, gv: &mut Tensor, gx: &mut [f32]) {
    let out = gy.len();
    let v = v.as_f32_slice();
    let gv = gv.as_f32_slice_mut();
    for (i, (&xv, g)) in x.iter().zip(gx.iter_mut()).enumerate() {
        let row = i * out..(i + 1) * out;
        let mut dot = 0.0f32;
        for ((gvv, &vv), &gyv) in gv[row.clone()].iter_mut().zip(&v[row]).zip(gy) {
            *gvv += xv * gyv;
            dot += vv * gyv;
        }
        *g += dot;
    }
}

/// Outer-product + matmul decomposition of the backward pass on `device`.
///
/// 1. `P = row_outer_product(e1, e2)`, then `dW = Pᵀ @ gy`
/// 2. `T = gy @ W_matᵀ`, viewed as `[N, d1, d2]`
/// 3. `ge1 = contract(T, e2)`, `ge2 = contract(T, e1)`
/// 4. with bias: `dV1 = e1ᵀ @ gy`, `dV2 = e2ᵀ @ gy`, `db = Σ_n gy`,
///    `ge1 += gy @ V1ᵀ`, `ge2 += gy @ V2ᵀ`
///
/// Every delta is computed into a fresh buffer and committed to the
/// accumulators only after the last kernel succeeded, so a device failure
/// leaves the store exactly as it was.
pub fn on_device(
    device: &dyn DeviceRuntime,
    params: &mut ParameterStore,
    e1: &TensorView<'_>,
    e2: &TensorView<'_>,
    gy: &TensorView<'_>,
) -> Result<(Tensor, Tensor), NetworkError> {
    let n = check_all(params, e1, e2, gy)?;
    let (d1, d2, out) = params.dims();

    let mut pairs = Tensor::zeros(Shape::matrix(n, d1 * d2));
    device.row_outer_product(e1, e2, &mut pairs)?;

    let mut dw = Tensor::zeros(Shape::matrix(d1 * d2, out));
    device.gemm(&pairs.view(), Transpose::Yes, gy, Transpose::No, 0.0, &mut dw)?;

    // `pairs` is no longer needed; reuse the buffer for T.
    device.gemm(
        gy,
        Transpose::No,
        &params.w_matrix()?,
        Transpose::Yes,
        0.0,
        &mut pairs,
    )?;
    let t = pairs.view().reshape(Shape::tensor3(n, d1, d2)).map_err(ShapeError::from)?;

    let mut ge1 = Tensor::zeros(Shape::matrix(n, d1));
    let mut ge2 = Tensor::zeros(Shape::matrix(n, d2));
    device.row_contract(&t, e2, PairAxis::First, 0.0, &mut ge1)?;
    device.row_contract(&t, e1, PairAxis::Second, 0.0, &mut ge2)?;

    let bias_delta = match params.bias() {
        Some(terms) => {
            let mut delta = BiasTerms::zeros(d1, d2, out);
            device.gemm(e1, Transpose::Yes, gy, Transpose::No, 0.0, &mut delta.v1)?;
            device.gemm(e2, Transpose::Yes, gy, Transpose::No, 0.0, &mut delta.v2)?;
            device.sum_rows(gy, 0.0, &mut delta.b)?;
            device.gemm(gy, Transpose::No, &terms.v1.view(), Transpose::Yes, 1.0, &mut ge1)?;
            device.gemm(gy, Transpose::No, &terms.v2.view(), Transpose::Yes, 1.0, &mut ge2)?;
            Some(delta)
        }
        None => None,
    };

    let delta = GradientDelta {
        w: dw.reshape(Shape::tensor3(d1, d2, out)).map_err(ShapeError::from)?,
        bias: bias_delta,
    };
    params.accumulate(&delta)?;
    Ok((ge1, ge2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;
    use crate::{BiasMode, Initializer, LayerConfig};

    fn mat(rows: usize, cols: usize, v: &[f32]) -> Tensor {
        Tensor::from_f32(Shape::matrix(rows, cols), v).unwrap()
    }

    fn store(bias: BiasMode) -> ParameterStore {
        let w: Vec<f32> = (0..12).map(|i| i as f32 + 1.0).collect();
        let config = LayerConfig {
            bias,
            ..LayerConfig::new(3, 2, 2)
        };
        let mut store = ParameterStore::initialize(
            &config,
            Initializer {
                w: Some(Tensor::from_vec(Shape::tensor3(3, 2, 2), w).unwrap()),
                bias: None,
            },
        )
        .unwrap();
        if bias == BiasMode::Enabled {
            for (name, scale) in [("V1", 0.5f32), ("V2", -0.25), ("b", 2.0)] {
                for (i, v) in store.parameter_mut(name).unwrap().iter_mut().enumerate() {
                    *v = scale * (i as f32 + 1.0);
                }
            }
        }
        store
    }

    #[test]
    fn test_unit_gradient_hits_single_w_entry() {
        let mut params = store(BiasMode::Disabled);
        let e1 = mat(1, 3, &[1.0, 0.0, 0.0]);
        let e2 = mat(1, 2, &[1.0, 0.0]);
        let gy = mat(1, 2, &[1.0, 0.0]);

        let (ge1, ge2) = reference(&mut params, &e1.view(), &e2.view(), &gy.view()).unwrap();

        let gw = params.gw().as_f32_slice();
        assert_eq!(gw[0], 1.0);
        assert!(gw[1..].iter().all(|&x| x == 0.0));
        // [W[0,0,0], W[1,0,0], W[2,0,0]]
        assert_eq!(ge1.as_f32_slice(), &[1.0, 5.0, 9.0]);
        // [W[0,0,0], W[0,1,0]]
        assert_eq!(ge2.as_f32_slice(), &[1.0, 3.0]);
    }

    #[test]
    fn test_grad_output_shape_rejected_before_mutation() {
        let mut params = store(BiasMode::Enabled);
        let e1 = mat(1, 3, &[1.0, 2.0, 3.0]);
        let e2 = mat(1, 2, &[1.0, 2.0]);
        let gy = mat(1, 3, &[1.0, 0.0, 0.0]);

        let err = reference(&mut params, &e1.view(), &e2.view(), &gy.view()).unwrap_err();
        assert!(matches!(err, ShapeError::GradOutput { .. }));
        let err = on_device(&HostDevice::new(), &mut params, &e1.view(), &e2.view(), &gy.view())
            .unwrap_err();
        assert!(matches!(err, NetworkError::Shape(ShapeError::GradOutput { .. })));
        for name in params.gradient_names() {
            assert!(params.gradient(name).unwrap().as_f32_slice().iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_device_matches_reference() {
        for mode in [BiasMode::Enabled, BiasMode::Disabled] {
            let mut ref_params = store(mode);
            let mut dev_params = store(mode);
            let e1 = mat(2, 3, &[0.5, -1.0, 2.0, 1.5, 0.25, -0.75]);
            let e2 = mat(2, 2, &[1.0, -2.0, 0.5, 3.0]);
            let gy = mat(2, 2, &[0.3, -0.7, 1.1, 0.2]);

            let (r1, r2) =
                reference(&mut ref_params, &e1.view(), &e2.view(), &gy.view()).unwrap();
            let (d1, d2) = on_device(
                &HostDevice::new(),
                &mut dev_params,
                &e1.view(),
                &e2.view(),
                &gy.view(),
            )
            .unwrap();

            let close = |a: &[f32], b: &[f32]| {
                a.iter()
                    .zip(b)
                    .all(|(x, y)| (x - y).abs() <= 1e-4 * (1.0 + x.abs()))
            };
            assert!(close(r1.as_f32_slice(), d1.as_f32_slice()));
            assert!(close(r2.as_f32_slice(), d2.as_f32_slice()));
            for name in ref_params.gradient_names() {
                assert!(
                    close(
                        ref_params.gradient(name).unwrap().as_f32_slice(),
                        dev_params.gradient(name).unwrap().as_f32_slice()
                    ),
                    "{name} differs ({mode:?})"
                );
            }
        }
    }

    #[test]
    fn test_bias_gradients() {
        let mut params = store(BiasMode::Enabled);
        let e1 = mat(2, 3, &[1.0, 0.0, 2.0, 0.0, 1.0, 0.0]);
        let e2 = mat(2, 2, &[0.0, 1.0, 3.0, 0.0]);
        let gy = mat(2, 2, &[1.0, 2.0, -1.0, 4.0]);

        reference(&mut params, &e1.view(), &e2.view(), &gy.view()).unwrap();

        assert_eq!(params.gradient("gb").unwrap().as_f32_slice(), &[0.0, 6.0]);
        // gV1 = e1ᵀ gy
        assert_eq!(
            params.gradient("gV1").unwrap().as_f32_slice(),
            &[1.0, 2.0, -1.0, 4.0, 2.0, 4.0]
        );
        // gV2 = e2ᵀ gy
        assert_eq!(
            params.gradient("gV2").unwrap().as_f32_slice(),
            &[-3.0, 12.0, 1.0, 2.0]
        );
    }
}
