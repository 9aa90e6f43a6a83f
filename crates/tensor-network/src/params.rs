// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Learned parameters and their gradient accumulators.
//!
//! The store owns `W` (`[d1, d2, out]`), the optional bias group
//! `V1` (`[d1, out]`), `V2` (`[d2, out]`), `b` (`[out]`), and one
//! accumulator per parameter. Bias terms live in a single [`BiasTerms`]
//! value so that the three are present or absent together; whether the
//! layer *has* them is recorded separately as a [`BiasMode`].

use crate::{BiasMode, LayerConfig, NetworkError, ShapeError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tensor_core::{Shape, Tensor, TensorView};

const NAMES_NOBIAS: &[&str] = &["W"];
const NAMES_BIAS: &[&str] = &["W", "V1", "V2", "b"];
const GRAD_NAMES_NOBIAS: &[&str] = &["gW"];
const GRAD_NAMES_BIAS: &[&str] = &["gW", "gV1", "gV2", "gb"];

/// The linear terms and bias: `V1` (`[d1, out]`), `V2` (`[d2, out]`), `b` (`[out]`).
#[derive(Debug, Clone, PartialEq)]
pub struct BiasTerms {
    pub v1: Tensor,
    pub v2: Tensor,
    pub b: Tensor,
}

impl BiasTerms {
    /// Zero-filled bias terms for the given layer dimensions.
    pub fn zeros(d1: usize, d2: usize, out: usize) -> Self {
        Self {
            v1: Tensor::zeros(Shape::matrix(d1, out)),
            v2: Tensor::zeros(Shape::matrix(d2, out)),
            b: Tensor::zeros(Shape::vector(out)),
        }
    }

    /// Checks every member against the layer dimensions.
    pub fn check_shapes(&self, d1: usize, d2: usize, out: usize) -> Result<(), ShapeError> {
        expect_shape("V1", &self.v1, Shape::matrix(d1, out))?;
        expect_shape("V2", &self.v2, Shape::matrix(d2, out))?;
        expect_shape("b", &self.b, Shape::vector(out))
    }

    fn fill(&mut self, value: f32) {
        self.v1.fill(value);
        self.v2.fill(value);
        self.b.fill(value);
    }
}

/// Optional explicit starting values for a [`ParameterStore`].
#[derive(Debug, Clone, Default)]
pub struct Initializer {
    /// Explicit `W`; sampled from `N(0, 1/(d1·d2))` when absent.
    pub w: Option<Tensor>,
    /// Explicit `(V1, V2, b)`; zero-filled (or absent) when not given.
    pub bias: Option<BiasTerms>,
}

/// A fully computed set of parameter gradients, not yet committed.
#[derive(Debug, Clone)]
pub(crate) struct GradientDelta {
    pub(crate) w: Tensor,
    pub(crate) bias: Option<BiasTerms>,
}

/// Owner of the layer's parameters and gradient accumulators.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    d1: usize,
    d2: usize,
    out: usize,
    mode: BiasMode,
    w: Tensor,
    gw: Tensor,
    bias: Option<BiasTerms>,
    bias_grads: Option<BiasTerms>,
}

impl ParameterStore {
    /// Allocates parameters for `config`, adopting any explicit values in
    /// `init`, and zero-fills every gradient accumulator.
    ///
    /// An explicit bias triple is adopted even when `config.bias` is
    /// [`BiasMode::Disabled`]; the store then resolves to
    /// [`BiasMode::Enabled`].
    ///
    /// # Errors
    /// [`NetworkError::Config`] for an invalid config,
    /// [`NetworkError::Shape`] when an explicit initializer has the wrong shape.
    pub fn initialize(config: &LayerConfig, init: Initializer) -> Result<Self, NetworkError> {
        config.validate()?;
        let (d1, d2, out) = (config.d1(), config.d2(), config.out_size);

        let w = match init.w {
            Some(w) => {
                expect_shape("W", &w, Shape::tensor3(d1, d2, out))?;
                w
            }
            None => sample_w(d1, d2, out, config.seed)?,
        };

        let bias = match init.bias {
            Some(terms) => {
                terms.check_shapes(d1, d2, out)?;
                if !config.has_bias() {
                    tracing::warn!("explicit bias terms supplied to a bias-free config; enabling bias");
                }
                Some(terms)
            }
            None if config.has_bias() => Some(BiasTerms::zeros(d1, d2, out)),
            None => None,
        };
        let mode = if bias.is_some() {
            BiasMode::Enabled
        } else {
            BiasMode::Disabled
        };

        tracing::debug!(d1, d2, out, ?mode, "parameter store initialised");

        Ok(Self {
            d1,
            d2,
            out,
            mode,
            gw: Tensor::zeros(w.shape().clone()),
            w,
            bias_grads: bias.as_ref().map(|_| BiasTerms::zeros(d1, d2, out)),
            bias,
        })
    }

    /// Sets every gradient accumulator to zero.
    pub fn reset_gradients(&mut self) {
        self.gw.fill(0.0);
        if let Some(g) = self.bias_grads.as_mut() {
            g.fill(0.0);
        }
    }

    /// Names of the populated parameters: `W`, or `W, V1, V2, b`.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self.mode {
            BiasMode::Enabled => NAMES_BIAS,
            BiasMode::Disabled => NAMES_NOBIAS,
        }
    }

    /// Names of the populated gradients: `gW`, or `gW, gV1, gV2, gb`.
    pub fn gradient_names(&self) -> &'static [&'static str] {
        match self.mode {
            BiasMode::Enabled => GRAD_NAMES_BIAS,
            BiasMode::Disabled => GRAD_NAMES_NOBIAS,
        }
    }

    /// The resolved bias mode.
    pub fn bias_mode(&self) -> BiasMode {
        self.mode
    }

    /// Layer dimensions `(d1, d2, out)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.d1, self.d2, self.out)
    }

    pub fn w(&self) -> &Tensor {
        &self.w
    }

    pub fn gw(&self) -> &Tensor {
        &self.gw
    }

    pub fn bias(&self) -> Option<&BiasTerms> {
        self.bias.as_ref()
    }

    pub fn bias_grads(&self) -> Option<&BiasTerms> {
        self.bias_grads.as_ref()
    }

    /// `W` viewed as the `[d1*d2, out]` matrix used by the matmul paths.
    pub fn w_matrix(&self) -> Result<TensorView<'_>, ShapeError> {
        Ok(self
            .w
            .view()
            .reshape(Shape::matrix(self.d1 * self.d2, self.out))?)
    }

    /// Looks up a parameter by name (`W`, `V1`, `V2`, `b`).
    pub fn parameter(&self, name: &str) -> Option<&Tensor> {
        match name {
            "W" => Some(&self.w),
            "V1" => self.bias.as_ref().map(|t| &t.v1),
            "V2" => self.bias.as_ref().map(|t| &t.v2),
            "b" => self.bias.as_ref().map(|t| &t.b),
            _ => None,
        }
    }

    /// Mutable access to a parameter's values by name, for optimizers and
    /// perturbation checks. Only the values are exposed so shapes stay fixed.
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut [f32]> {
        let t = match name {
            "W" => Some(&mut self.w),
            "V1" => self.bias.as_mut().map(|t| &mut t.v1),
            "V2" => self.bias.as_mut().map(|t| &mut t.v2),
            "b" => self.bias.as_mut().map(|t| &mut t.b),
            _ => None,
        };
        t.map(|t| t.as_f32_slice_mut())
    }

    /// Looks up a gradient accumulator by name (`gW`, `gV1`, `gV2`, `gb`).
    pub fn gradient(&self, name: &str) -> Option<&Tensor> {
        match name {
            "gW" => Some(&self.gw),
            "gV1" => self.bias_grads.as_ref().map(|t| &t.v1),
            "gV2" => self.bias_grads.as_ref().map(|t| &t.v2),
            "gb" => self.bias_grads.as_ref().map(|t| &t.b),
            _ => None,
        }
    }

    /// Read access to the parameters alongside write access to the
    /// accumulators, for in-place backward passes.
    pub(crate) fn split_for_backward(
        &mut self,
    ) -> (&Tensor, Option<&BiasTerms>, &mut Tensor, Option<&mut BiasTerms>) {
        (
            &self.w,
            self.bias.as_ref(),
            &mut self.gw,
            self.bias_grads.as_mut(),
        )
    }

    /// Adds a computed delta into the accumulators.
    ///
    /// Every shape is checked before the first addition, so either the whole
    /// delta is committed or nothing is.
    pub(crate) fn accumulate(&mut self, delta: &GradientDelta) -> Result<(), ShapeError> {
        expect_shape("gW", &delta.w, self.gw.shape().clone())?;
        match (&delta.bias, &self.bias_grads) {
            (Some(d), Some(_)) => d.check_shapes(self.d1, self.d2, self.out)?,
            (None, None) => {}
            (Some(d), None) => {
                return Err(ShapeError::Initializer {
                    param: "gb",
                    expected: Shape::scalar(),
                    actual: d.b.shape().clone(),
                })
            }
            (None, Some(g)) => {
                return Err(ShapeError::Initializer {
                    param: "gb",
                    expected: g.b.shape().clone(),
                    actual: Shape::scalar(),
                })
            }
        }

        self.gw.add_assign(&delta.w.view())?;
        if let (Some(d), Some(g)) = (&delta.bias, self.bias_grads.as_mut()) {
            g.v1.add_assign(&d.v1.view())?;
            g.v2.add_assign(&d.v2.view())?;
            g.b.add_assign(&d.b.view())?;
        }
        Ok(())
    }
}

fn expect_shape(param: &'static str, t: &Tensor, expected: Shape) -> Result<(), ShapeError> {
    if t.shape() != &expected {
        return Err(ShapeError::Initializer {
            param,
            expected,
            actual: t.shape().clone(),
        });
    }
    Ok(())
}

fn sample_w(d1: usize, d2: usize, out: usize, seed: Option<u64>) -> Result<Tensor, NetworkError> {
    let std_dev = (1.0 / (d1 * d2) as f64).sqrt() as f32;
    let normal = Normal::new(0.0f32, std_dev)
        .map_err(|e| NetworkError::Config(format!("invalid W initializer scale: {e}")))?;
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let data = (0..d1 * d2 * out).map(|_| normal.sample(&mut rng)).collect();
    Tensor::from_vec(Shape::tensor3(d1, d2, out), data)
        .map_err(|e| NetworkError::Shape(ShapeError::from(e)))
}
