// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Lightweight `f32` tensors and the dense kernels a tensor network layer
//! decomposes into.
//!
//! This crate provides:
//! - [`Tensor`]: an owned, row-major n-dimensional `f32` tensor.
//! - [`TensorView`]: a borrowed view that can be reshaped without copying.
//! - [`Shape`]: runtime shape descriptors.
//! - Kernels: general matrix multiply with transpose flags ([`gemm`]),
//!   row-wise outer product and its contraction, row broadcast, column sum.
//!
//! # Design Goals
//! - Zero-copy reshapes of batched inputs (`[N, C, H, W]` → `[N, C*H*W]`).
//! - Operations write into pre-allocated buffers and validate before writing.
//! - Clean error types via `thiserror`.

mod error;
pub mod ops;
mod shape;
mod tensor;

pub use error::TensorError;
pub use ops::{
    add_row_broadcast, gemm, matmul, row_contract, row_outer_product, sum_rows, PairAxis,
    Transpose,
};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView};
