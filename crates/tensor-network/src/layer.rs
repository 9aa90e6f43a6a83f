// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The layer object and the node seam an autodiff engine drives it through.
//!
//! ```text
//! LayerConfig ──► TensorNetwork::new ──► ParameterStore + Option<device>
//!                        │
//!          forward(x0, x1) ─► y            backward(x0, x1, gy) ─► (gx0, gx1)
//!                        │                         │
//!             reference or device path    accumulates gW, gV1, gV2, gb
//! ```

use crate::device::DeviceRuntime;
use crate::{backward, forward, type_check};
use crate::{Initializer, LayerConfig, NetworkError, ParameterStore, ShapeError};
use std::sync::Arc;
use tensor_core::{Tensor, TensorView};

// ── Node seam ──────────────────────────────────────────────────

/// A differentiable node with learned parameters, as seen by an external
/// execution engine.
///
/// The engine calls [`forward`](Function::forward), later
/// [`backward`](Function::backward) with the same inputs, and decides when
/// to call [`zero_grads`](Function::zero_grads) and step an optimizer over
/// [`parameter_names`](Function::parameter_names).
pub trait Function {
    /// Computes the node's outputs.
    fn forward(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, NetworkError>;

    /// Accumulates parameter gradients and returns one gradient per input,
    /// shaped like that input.
    fn backward(
        &mut self,
        inputs: &[&Tensor],
        grad_outputs: &[&Tensor],
    ) -> Result<Vec<Tensor>, NetworkError>;

    /// Names of the populated parameters.
    fn parameter_names(&self) -> &'static [&'static str];

    /// Names of the populated gradient accumulators.
    fn gradient_names(&self) -> &'static [&'static str];

    /// Zeroes every gradient accumulator.
    fn zero_grads(&mut self);
}

// ── Layer ──────────────────────────────────────────────────────

/// A bilinear tensor-network layer.
///
/// `forward` and `backward` always take the reference path; `forward_on`
/// and `backward_on` take an explicit device. Through [`Function`] the layer
/// dispatches to its attached device when one is set.
///
/// # Example
/// ```
/// use tensor_core::{Shape, Tensor};
/// use tensor_network::{LayerConfig, TensorNetwork};
///
/// let config = LayerConfig { seed: Some(1), ..LayerConfig::new(3, 2, 4) };
/// let mut layer = TensorNetwork::new(config).unwrap();
///
/// let x0 = Tensor::zeros(Shape::matrix(5, 3));
/// let x1 = Tensor::zeros(Shape::matrix(5, 2));
/// let y = layer.forward(&x0, &x1).unwrap();
/// assert_eq!(y.shape(), &Shape::matrix(5, 4));
///
/// let gy = Tensor::zeros(Shape::matrix(5, 4));
/// let (g0, g1) = layer.backward(&x0, &x1, &gy).unwrap();
/// assert_eq!(g0.shape(), &Shape::matrix(5, 3));
/// assert_eq!(g1.shape(), &Shape::matrix(5, 2));
/// ```
#[derive(Debug, Clone)]
pub struct TensorNetwork {
    config: LayerConfig,
    params: ParameterStore,
    device: Option<Arc<dyn DeviceRuntime>>,
}

impl TensorNetwork {
    /// Builds a layer with randomly initialised `W`, zero bias terms (when
    /// enabled), and the device named in `config`.
    pub fn new(config: LayerConfig) -> Result<Self, NetworkError> {
        Self::with_initializer(config, Initializer::default())
    }

    /// Builds a layer adopting the explicit values in `init`.
    ///
    /// Explicit bias terms enable bias even on a bias-free config; the stored
    /// config is updated to match the parameter store.
    pub fn with_initializer(
        mut config: LayerConfig,
        init: Initializer,
    ) -> Result<Self, NetworkError> {
        let params = ParameterStore::initialize(&config, init)?;
        config.bias = params.bias_mode();
        let device: Option<Arc<dyn DeviceRuntime>> = config.create_device()?.map(Arc::from);
        let (d1, d2, out) = params.dims();
        tracing::info!(
            d1,
            d2,
            out,
            bias = ?params.bias_mode(),
            device = device.as_deref().map_or("reference", |d| d.name()),
            "tensor network layer created"
        );
        Ok(Self {
            config,
            params,
            device,
        })
    }

    /// Attaches `device` as the layer's default execution path.
    pub fn with_device(mut self, device: Arc<dyn DeviceRuntime>) -> Self {
        tracing::info!(device = device.name(), "device attached");
        self.device = Some(device);
        self
    }

    /// Drops any attached device; dispatch falls back to the reference path.
    pub fn without_device(mut self) -> Self {
        self.device = None;
        self
    }

    /// The attached device, if any.
    pub fn device(&self) -> Option<&dyn DeviceRuntime> {
        self.device.as_deref()
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    pub fn parameter_names(&self) -> &'static [&'static str] {
        self.params.parameter_names()
    }

    pub fn gradient_names(&self) -> &'static [&'static str] {
        self.params.gradient_names()
    }

    pub fn zero_grads(&mut self) {
        self.params.reset_gradients();
    }

    /// Validates `x0`/`x1` and views them as `[N, d1]` / `[N, d2]`.
    fn flatten<'a>(
        &self,
        x0: &'a Tensor,
        x1: &'a Tensor,
    ) -> Result<(usize, TensorView<'a>, TensorView<'a>), ShapeError> {
        let (d1, d2, _) = self.params.dims();
        let n = type_check::check_forward([d1, d2], &[x0.shape(), x1.shape()])?;
        Ok((n, x0.view().flatten_batch()?, x1.view().flatten_batch()?))
    }

    /// Reference forward pass. Returns `[N, out]`.
    pub fn forward(&self, x0: &Tensor, x1: &Tensor) -> Result<Tensor, NetworkError> {
        let (n, e1, e2) = self.flatten(x0, x1)?;
        tracing::debug!(batch = n, path = "reference", "forward");
        Ok(forward::reference(&self.params, &e1, &e2)?)
    }

    /// Forward pass on `device`.
    pub fn forward_on(
        &self,
        device: &dyn DeviceRuntime,
        x0: &Tensor,
        x1: &Tensor,
    ) -> Result<Tensor, NetworkError> {
        let (n, e1, e2) = self.flatten(x0, x1)?;
        tracing::debug!(batch = n, path = device.name(), "forward");
        forward::on_device(device, &self.params, &e1, &e2)
    }

    /// Reference backward pass.
    ///
    /// Adds the parameter gradients into the accumulators and returns the
    /// input gradients as `([N, d1], [N, d2])`.
    pub fn backward(
        &mut self,
        x0: &Tensor,
        x1: &Tensor,
        grad_y: &Tensor,
    ) -> Result<(Tensor, Tensor), NetworkError> {
        let (n, e1, e2) = self.flatten(x0, x1)?;
        tracing::debug!(batch = n, path = "reference", "backward");
        Ok(backward::reference(&mut self.params, &e1, &e2, &grad_y.view())?)
    }

    /// Backward pass on `device`. On error no accumulator has changed.
    pub fn backward_on(
        &mut self,
        device: &dyn DeviceRuntime,
        x0: &Tensor,
        x1: &Tensor,
        grad_y: &Tensor,
    ) -> Result<(Tensor, Tensor), NetworkError> {
        let (n, e1, e2) = self.flatten(x0, x1)?;
        tracing::debug!(batch = n, path = device.name(), "backward");
        backward::on_device(device, &mut self.params, &e1, &e2, &grad_y.view())
    }
}

impl Function for TensorNetwork {
    fn forward(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, NetworkError> {
        let [x0, x1] = two_inputs(inputs)?;
        let y = match self.device.as_deref() {
            Some(device) => self.forward_on(device, x0, x1)?,
            None => TensorNetwork::forward(self, x0, x1)?,
        };
        Ok(vec![y])
    }

    fn backward(
        &mut self,
        inputs: &[&Tensor],
        grad_outputs: &[&Tensor],
    ) -> Result<Vec<Tensor>, NetworkError> {
        let [x0, x1] = two_inputs(inputs)?;
        let grad_y = match grad_outputs {
            [g] => *g,
            _ => {
                return Err(NetworkError::Config(format!(
                    "expected 1 output gradient, got {}",
                    grad_outputs.len()
                )))
            }
        };
        let (g0, g1) = match self.device.clone() {
            Some(device) => self.backward_on(device.as_ref(), x0, x1, grad_y)?,
            None => TensorNetwork::backward(self, x0, x1, grad_y)?,
        };
        let g0 = g0.reshape(x0.shape().clone()).map_err(ShapeError::from)?;
        let g1 = g1.reshape(x1.shape().clone()).map_err(ShapeError::from)?;
        Ok(vec![g0, g1])
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        self.params.parameter_names()
    }

    fn gradient_names(&self) -> &'static [&'static str] {
        self.params.gradient_names()
    }

    fn zero_grads(&mut self) {
        self.params.reset_gradients();
    }
}

fn two_inputs<'a>(inputs: &[&'a Tensor]) -> Result<[&'a Tensor; 2], ShapeError> {
    match inputs {
        [x0, x1] => Ok([*x0, *x1]),
        _ => Err(ShapeError::InputCount {
            actual: inputs.len(),
        }),
    }
}
