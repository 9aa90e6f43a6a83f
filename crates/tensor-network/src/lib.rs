// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-network
//!
//! A bilinear tensor-contraction layer: two batched inputs `x0`, `x1` are
//! flattened per sample to `e1` (`[N, d1]`) and `e2` (`[N, d2]`) and mapped to
//! `y` (`[N, out]`) through a learned 3-way tensor `W`, two optional linear
//! terms `V1`, `V2`, and an optional bias `b`.
//!
//! # Execution paths
//! - **Reference** ([`forward::reference`], [`backward::reference`]): nested
//!   loops on the calling thread.
//! - **Device** ([`forward::on_device`], [`backward::on_device`]): the same
//!   contraction decomposed into a row-wise outer product and dense matrix
//!   multiplies, run on a [`DeviceRuntime`] ([`HostDevice`] or the
//!   thread-pooled [`ParallelDevice`]).
//!
//! Both paths agree within floating-point tolerance. Parameter gradients
//! accumulate in the [`ParameterStore`] until reset; input gradients are
//! returned fresh per call.
//!
//! # Errors
//! Shape violations are reported as [`ShapeError`] before anything is
//! computed or mutated. Device failures surface as
//! [`NetworkError::DeviceCompute`] with no output and no accumulator change.

mod config;
pub mod device;
mod error;
mod layer;
mod params;

pub mod backward;
pub mod forward;
pub mod gradcheck;
pub mod type_check;

pub use config::{BiasMode, DeviceKind, LayerConfig};
pub use device::{DeviceRuntime, HostDevice, ParallelDevice};
pub use error::{DeviceError, NetworkError, ShapeError};
pub use gradcheck::{check_gradients, GradCheckConfig, GradCheckReport, TensorCheck};
pub use layer::{Function, TensorNetwork};
pub use params::{BiasTerms, Initializer, ParameterStore};
