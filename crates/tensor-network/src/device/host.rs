// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Serial device backed by the `tensor-core` kernels.

use super::{kernel_error, DeviceRuntime};
use crate::DeviceError;
use tensor_core::{ops, PairAxis, Tensor, TensorView, Transpose};

const NAME: &str = "host";

/// Runs every kernel on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDevice;

impl HostDevice {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceRuntime for HostDevice {
    fn name(&self) -> &'static str {
        NAME
    }

    fn row_outer_product(
        &self,
        a: &TensorView<'_>,
        b: &TensorView<'_>,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        ops::row_outer_product(a, b, out).map_err(kernel_error(NAME, "row_outer_product"))
    }

    fn gemm(
        &self,
        lhs: &TensorView<'_>,
        lhs_t: Transpose,
        rhs: &TensorView<'_>,
        rhs_t: Transpose,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        ops::gemm(lhs, lhs_t, rhs, rhs_t, beta, out).map_err(kernel_error(NAME, "gemm"))
    }

    fn row_contract(
        &self,
        pairs: &TensorView<'_>,
        factor: &TensorView<'_>,
        keep: PairAxis,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        ops::row_contract(pairs, factor, keep, beta, out).map_err(kernel_error(NAME, "row_contract"))
    }

    fn add_row_broadcast(&self, out: &mut Tensor, row: &TensorView<'_>) -> Result<(), DeviceError> {
        ops::add_row_broadcast(out, row).map_err(kernel_error(NAME, "add_row_broadcast"))
    }

    fn sum_rows(&self, x: &TensorView<'_>, beta: f32, out: &mut Tensor) -> Result<(), DeviceError> {
        ops::sum_rows(x, beta, out).map_err(kernel_error(NAME, "sum_rows"))
    }
}
