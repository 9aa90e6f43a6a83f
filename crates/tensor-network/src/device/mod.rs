// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device runtimes: the dense primitives the decomposed contraction runs on.
//!
//! A [`DeviceRuntime`] supplies five kernels. The layer's device paths issue
//! them in sequence; each call returns only after its output buffer is fully
//! written, so a later stage always observes the complete result of an
//! earlier one. Work items inside one kernel are independent.
//!
//! | Kernel              | Work item        | Used for                         |
//! |---------------------|------------------|----------------------------------|
//! | `row_outer_product` | output row       | `e1 ⊗ e2` per sample             |
//! | `gemm`              | output row       | `W`, `V1`, `V2` contractions     |
//! | `row_contract`      | output row       | input gradients                  |
//! | `add_row_broadcast` | output row       | `+ b`                            |
//! | `sum_rows`          | output column    | `gb`                             |

mod host;
mod parallel;

pub use host::HostDevice;
pub use parallel::ParallelDevice;

use crate::DeviceError;
use tensor_core::{PairAxis, Tensor, TensorError, TensorView, Transpose};

/// Dense kernels used by the device-parallel forward and backward paths.
///
/// Implementations must validate every launch before writing: on `Err` the
/// output buffer is left unchanged.
pub trait DeviceRuntime: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// `out[n, j*q + k] = a[n, j] * b[n, k]`.
    fn row_outer_product(
        &self,
        a: &TensorView<'_>,
        b: &TensorView<'_>,
        out: &mut Tensor,
    ) -> Result<(), DeviceError>;

    /// `out = op(lhs) @ op(rhs) + beta * out`.
    fn gemm(
        &self,
        lhs: &TensorView<'_>,
        lhs_t: Transpose,
        rhs: &TensorView<'_>,
        rhs_t: Transpose,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError>;

    /// Folds a `[N, p, q]` block onto one factor (see [`tensor_core::row_contract`]).
    fn row_contract(
        &self,
        pairs: &TensorView<'_>,
        factor: &TensorView<'_>,
        keep: PairAxis,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError>;

    /// `out[n, l] += row[l]`.
    fn add_row_broadcast(&self, out: &mut Tensor, row: &TensorView<'_>) -> Result<(), DeviceError>;

    /// `out[l] = Σ_n x[n, l] + beta * out[l]`.
    fn sum_rows(&self, x: &TensorView<'_>, beta: f32, out: &mut Tensor) -> Result<(), DeviceError>;
}

pub(crate) fn kernel_error(
    device: &'static str,
    kernel: &'static str,
) -> impl FnOnce(TensorError) -> DeviceError {
    move |source| DeviceError::Kernel {
        device,
        kernel,
        source,
    }
}
