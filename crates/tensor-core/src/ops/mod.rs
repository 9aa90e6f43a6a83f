// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense host kernels.
//!
//! Each operation validates shapes up front and writes into a
//! caller-provided output buffer, so a failed call leaves the output
//! untouched. The per-row helpers (`gemm_row`, `outer_row`, `contract_row`)
//! are public so that parallel backends can split work by output row while
//! sharing the arithmetic of the serial kernels.

mod broadcast_op;
mod matmul_op;
mod outer_op;

pub use broadcast_op::{add_row_broadcast, broadcast_dims, sum_rows};
pub use matmul_op::{gemm, gemm_dims, gemm_row, matmul, GemmDims, Transpose};
pub use outer_op::{
    contract_dims, contract_row, outer_dims, outer_row, row_contract, row_outer_product, PairAxis,
};
