// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the tensor network layer.

use tensor_core::{Shape, TensorError};

/// An input, initializer, or gradient violates the configured layer shape.
///
/// Always raised before any parameter or gradient buffer is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// An explicitly supplied parameter has the wrong shape.
    #[error("initializer for '{param}' has shape {actual}, expected {expected}")]
    Initializer {
        param: &'static str,
        expected: Shape,
        actual: Shape,
    },

    /// The layer consumes exactly two inputs.
    #[error("expected 2 inputs, got {actual}")]
    InputCount { actual: usize },

    /// Inputs must carry a batch axis plus at least one feature axis.
    #[error("input {index} must have rank >= 2, got {shape}")]
    InputRank { index: usize, shape: Shape },

    /// The two inputs disagree on the batch size.
    #[error("batch size mismatch: input 0 has {lhs} samples, input 1 has {rhs}")]
    BatchMismatch { lhs: usize, rhs: usize },

    /// The flattened per-sample size of an input differs from d1 or d2.
    #[error("input {index} flattens to {actual} features per sample, expected {expected}")]
    FeatureMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// The upstream gradient does not match the forward output shape.
    #[error("output gradient has shape {actual}, expected {expected}")]
    GradOutput { expected: Shape, actual: Shape },

    /// A tensor-level shape failure while preparing operands.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// A device kernel or linear-algebra call failed.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// A kernel rejected its launch configuration.
    #[error("kernel '{kernel}' failed on device '{device}': {source}")]
    Kernel {
        device: &'static str,
        kernel: &'static str,
        #[source]
        source: TensorError,
    },

    /// The device's worker pool could not be created.
    #[error("failed to start device worker pool: {0}")]
    ThreadPool(String),
}

/// Errors surfaced by the layer's public operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Shape violation; nothing was computed or mutated.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Device computation failed; no output was produced and no gradient
    /// accumulator was updated.
    #[error("device compute error: {0}")]
    DeviceCompute(#[from] DeviceError),

    /// Invalid layer configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
