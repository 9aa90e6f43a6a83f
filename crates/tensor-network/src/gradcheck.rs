// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Finite-difference verification of the analytic gradients.
//!
//! The scalar objective is `L = Σ y ⊙ c` for a fixed random cotangent `c`, so
//! `∂L/∂y = c`. Analytic gradients come from one backward call (through
//! the layer's default dispatch) on a clone of the layer; numeric gradients
//! come from central differences of the reference forward pass.

use crate::layer::{Function, TensorNetwork};
use crate::NetworkError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tensor_core::{Shape, Tensor};

/// Step size and tolerances for [`check_gradients`].
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheckConfig {
    /// Central-difference step.
    pub eps: f32,
    /// Relative tolerance against the numeric gradient.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Upper bound on checked entries per tensor; entries are spread evenly.
    pub max_entries: Option<usize>,
    /// Seed for the cotangent direction.
    pub seed: u64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            eps: 1e-2,
            rtol: 1e-2,
            atol: 1e-3,
            max_entries: None,
            seed: 0,
        }
    }
}

/// Comparison result for one parameter or input.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TensorCheck {
    pub name: String,
    pub checked: usize,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    pub passed: bool,
}

/// Results for every parameter followed by both inputs.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GradCheckReport {
    pub tensors: Vec<TensorCheck>,
    pub passed: bool,
}

impl GradCheckReport {
    /// Checks whose tolerance was exceeded.
    pub fn failures(&self) -> impl Iterator<Item = &TensorCheck> {
        self.tensors.iter().filter(|t| !t.passed)
    }
}

/// Compares analytic and central-difference gradients of `layer` at
/// `(x0, x1)` for every populated parameter and both inputs.
///
/// `layer` itself is not modified.
pub fn check_gradients(
    layer: &TensorNetwork,
    x0: &Tensor,
    x1: &Tensor,
    config: &GradCheckConfig,
) -> Result<GradCheckReport, NetworkError> {
    let y = layer.forward(x0, x1)?;
    let cotangent = cotangent_like(y.shape(), config.seed)?;
    let objective = |l: &TensorNetwork, a: &Tensor, b: &Tensor| -> Result<f64, NetworkError> {
        let y = l.forward(a, b)?;
        Ok(y.as_f32_slice()
            .iter()
            .zip(cotangent.as_f32_slice())
            .map(|(&y, &p)| f64::from(y) * f64::from(p))
            .sum())
    };

    let mut analytic = layer.clone();
    analytic.zero_grads();
    let input_grads = Function::backward(&mut analytic, &[x0, x1], &[&cotangent])?;

    let mut tensors = Vec::new();
    let mut perturbed = layer.clone();
    for &name in layer.parameter_names() {
        let grad_name = format!("g{name}");
        let grad = analytic
            .params()
            .gradient(&grad_name)
            .ok_or_else(|| NetworkError::Config(format!("no gradient '{grad_name}' for '{name}'")))?;
        let source = layer
            .params()
            .parameter(name)
            .map_or(&[][..], |t| t.as_f32_slice());
        let check = check_tensor(name, grad.as_f32_slice(), config, |i, offset| {
            set_entry(&mut perturbed, name, i, source[i] + offset)?;
            let result = objective(&perturbed, x0, x1);
            set_entry(&mut perturbed, name, i, source[i])?;
            result
        })?;
        tensors.push(check);
    }

    let mut input = x0.clone();
    tensors.push(check_tensor("x0", input_grads[0].as_f32_slice(), config, |i, offset| {
        let original = x0.as_f32_slice()[i];
        input.as_f32_slice_mut()[i] = original + offset;
        let result = objective(layer, &input, x1);
        input.as_f32_slice_mut()[i] = original;
        result
    })?);

    let mut input = x1.clone();
    tensors.push(check_tensor("x1", input_grads[1].as_f32_slice(), config, |i, offset| {
        let original = x1.as_f32_slice()[i];
        input.as_f32_slice_mut()[i] = original + offset;
        let result = objective(layer, x0, &input);
        input.as_f32_slice_mut()[i] = original;
        result
    })?);

    let passed = tensors.iter().all(|t| t.passed);
    tracing::info!(passed, tensors = tensors.len(), "gradient check finished");
    Ok(GradCheckReport { tensors, passed })
}

fn set_entry(
    layer: &mut TensorNetwork,
    name: &str,
    i: usize,
    value: f32,
) -> Result<(), NetworkError> {
    let values = layer
        .params_mut()
        .parameter_mut(name)
        .ok_or_else(|| NetworkError::Config(format!("unknown parameter '{name}'")))?;
    values[i] = value;
    Ok(())
}

fn check_tensor(
    name: &str,
    analytic: &[f32],
    config: &GradCheckConfig,
    mut eval: impl FnMut(usize, f32) -> Result<f64, NetworkError>,
) -> Result<TensorCheck, NetworkError> {
    let stride = match config.max_entries {
        Some(cap) if analytic.len() > cap => analytic.len().div_ceil(cap.max(1)),
        _ => 1,
    };
    let mut check = TensorCheck {
        name: name.to_string(),
        checked: 0,
        max_abs_error: 0.0,
        max_rel_error: 0.0,
        passed: true,
    };

    for i in (0..analytic.len()).step_by(stride) {
        let plus = eval(i, config.eps)?;
        let minus = eval(i, -config.eps)?;
        let numeric = (plus - minus) / (2.0 * f64::from(config.eps));
        let exact = f64::from(analytic[i]);
        let abs = (exact - numeric).abs();
        let rel = abs / exact.abs().max(numeric.abs()).max(f64::EPSILON);

        check.checked += 1;
        check.max_abs_error = check.max_abs_error.max(abs);
        check.max_rel_error = check.max_rel_error.max(rel);
        if abs > config.atol + config.rtol * numeric.abs() {
            check.passed = false;
        }
    }

    tracing::debug!(
        tensor = name,
        checked = check.checked,
        max_abs = check.max_abs_error,
        passed = check.passed,
        "gradient check"
    );
    Ok(check)
}

fn cotangent_like(shape: &Shape, seed: u64) -> Result<Tensor, NetworkError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..shape.num_elements())
        .map(|_| rng.gen_range(-1.0f32..1.0))
        .collect();
    Tensor::from_vec(shape.clone(), data).map_err(|e| NetworkError::Shape(e.into()))
}
