// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! in_shape = [3, 2]
//! out_size = 2
//! bias = "enabled"
//! seed = 7
//! device = "parallel"
//! num_threads = 4
//! ```

use crate::device::{DeviceRuntime, HostDevice, ParallelDevice};
use crate::NetworkError;
use std::path::Path;

/// Whether the layer carries the `V1`, `V2`, `b` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasMode {
    /// `y = e1·W·e2 + e1·V1 + e2·V2 + b`.
    Enabled,
    /// `y = e1·W·e2` only.
    Disabled,
}

/// Which execution path the layer dispatches to by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// Direct nested-loop contraction on the calling thread.
    Reference,
    /// Outer-product + matmul decomposition on the calling thread.
    Host,
    /// Outer-product + matmul decomposition on a dedicated worker pool.
    Parallel,
}

/// Configuration for a tensor network layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerConfig {
    /// Flattened per-sample sizes `(d1, d2)` of the two inputs.
    pub in_shape: [usize; 2],
    /// Number of output channels.
    pub out_size: usize,
    /// Bias terms on or off.
    #[serde(default = "default_bias")]
    pub bias: BiasMode,
    /// Seed for the random `W` initializer; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Default execution path.
    #[serde(default = "default_device")]
    pub device: DeviceKind,
    /// Worker threads for the parallel device (defaults to online cores).
    #[serde(default)]
    pub num_threads: Option<usize>,
}

fn default_bias() -> BiasMode {
    BiasMode::Enabled
}

fn default_device() -> DeviceKind {
    DeviceKind::Reference
}

impl LayerConfig {
    /// Creates a configuration with bias terms and the reference path.
    pub fn new(d1: usize, d2: usize, out_size: usize) -> Self {
        Self {
            in_shape: [d1, d2],
            out_size,
            bias: default_bias(),
            seed: None,
            device: default_device(),
            num_threads: None,
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, NetworkError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetworkError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, NetworkError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| NetworkError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, NetworkError> {
        toml::to_string_pretty(self)
            .map_err(|e| NetworkError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks that every dimension is non-zero.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let [d1, d2] = self.in_shape;
        if d1 == 0 || d2 == 0 || self.out_size == 0 {
            return Err(NetworkError::Config(format!(
                "layer dimensions must be non-zero, got in_shape = [{d1}, {d2}], out_size = {}",
                self.out_size
            )));
        }
        if self.num_threads == Some(0) {
            return Err(NetworkError::Config(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Flattened size of the first input.
    pub fn d1(&self) -> usize {
        self.in_shape[0]
    }

    /// Flattened size of the second input.
    pub fn d2(&self) -> usize {
        self.in_shape[1]
    }

    /// Returns `true` when bias terms are configured.
    pub fn has_bias(&self) -> bool {
        self.bias == BiasMode::Enabled
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Creates the device named by this config, or `None` for the
    /// reference path.
    pub fn create_device(&self) -> Result<Option<Box<dyn DeviceRuntime>>, NetworkError> {
        match self.device {
            DeviceKind::Reference => Ok(None),
            DeviceKind::Host => Ok(Some(Box::new(HostDevice::new()))),
            DeviceKind::Parallel => {
                let device = ParallelDevice::new(self.resolve_threads())?;
                Ok(Some(Box::new(device)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let c = LayerConfig::new(3, 2, 4);
        assert_eq!(c.d1(), 3);
        assert_eq!(c.d2(), 2);
        assert_eq!(c.out_size, 4);
        assert!(c.has_bias());
        assert_eq!(c.device, DeviceKind::Reference);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
in_shape = [5, 7]
out_size = 3
bias = "disabled"
seed = 11
device = "parallel"
num_threads = 2
"#;
        let c = LayerConfig::from_toml(toml).unwrap();
        assert_eq!(c.in_shape, [5, 7]);
        assert_eq!(c.out_size, 3);
        assert_eq!(c.bias, BiasMode::Disabled);
        assert_eq!(c.seed, Some(11));
        assert_eq!(c.device, DeviceKind::Parallel);
        assert_eq!(c.resolve_threads(), 2);
    }

    #[test]
    fn test_from_toml_minimal_uses_defaults() {
        let c = LayerConfig::from_toml("in_shape = [2, 2]\nout_size = 1\n").unwrap();
        assert!(c.has_bias());
        assert_eq!(c.seed, None);
        assert_eq!(c.device, DeviceKind::Reference);
        assert!(c.resolve_threads() >= 1);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = LayerConfig {
            seed: Some(3),
            device: DeviceKind::Host,
            ..LayerConfig::new(4, 5, 6)
        };
        let toml = c.to_toml().unwrap();
        let back = LayerConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_validate_rejects_zero_dims() {
        assert!(LayerConfig::new(0, 2, 2).validate().is_err());
        assert!(LayerConfig::new(2, 0, 2).validate().is_err());
        assert!(LayerConfig::new(2, 2, 0).validate().is_err());
        assert!(LayerConfig::from_toml("in_shape = [2, 2]\nout_size = 0\n").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let c = LayerConfig {
            num_threads: Some(0),
            ..LayerConfig::new(2, 2, 2)
        };
        assert!(matches!(c.validate(), Err(NetworkError::Config(_))));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let toml = "in_shape = [2, 2]\nout_size = 1\ndevice = \"gpu\"\n";
        assert!(matches!(
            LayerConfig::from_toml(toml),
            Err(NetworkError::Config(_))
        ));
    }

    #[test]
    fn test_create_device() {
        let reference = LayerConfig::new(2, 2, 2);
        assert!(reference.create_device().unwrap().is_none());

        let host = LayerConfig {
            device: DeviceKind::Host,
            ..LayerConfig::new(2, 2, 2)
        };
        assert_eq!(host.create_device().unwrap().unwrap().name(), "host");

        let parallel = LayerConfig {
            device: DeviceKind::Parallel,
            num_threads: Some(2),
            ..LayerConfig::new(2, 2, 2)
        };
        assert_eq!(parallel.create_device().unwrap().unwrap().name(), "parallel");
    }
}
