// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the forward and backward contraction paths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tensor_core::{Shape, Tensor};
use tensor_network::{DeviceRuntime, HostDevice, LayerConfig, ParallelDevice, TensorNetwork};

const BATCH: usize = 64;

fn ramp(shape: Shape) -> Tensor {
    let n = shape.num_elements();
    let data = (0..n).map(|i| ((i % 23) as f32 - 11.0) * 0.03).collect();
    Tensor::from_vec(shape, data).expect("ramp tensor")
}

fn layer(dim: usize) -> TensorNetwork {
    let config = LayerConfig {
        seed: Some(0),
        ..LayerConfig::new(dim, dim, dim)
    };
    TensorNetwork::new(config).expect("layer")
}

fn bench_forward(c: &mut Criterion) {
    let host = HostDevice::new();
    let parallel = ParallelDevice::new(4).expect("parallel device");
    let mut group = c.benchmark_group("forward");
    for &dim in &[8usize, 16, 32] {
        let layer = layer(dim);
        let x0 = ramp(Shape::matrix(BATCH, dim));
        let x1 = ramp(Shape::matrix(BATCH, dim));

        group.bench_with_input(BenchmarkId::new("reference", dim), &dim, |b, _| {
            b.iter(|| black_box(layer.forward(&x0, &x1).expect("forward")))
        });
        for device in [&host as &dyn DeviceRuntime, &parallel] {
            group.bench_with_input(BenchmarkId::new(device.name(), dim), &dim, |b, _| {
                b.iter(|| black_box(layer.forward_on(device, &x0, &x1).expect("forward")))
            });
        }
    }
    group.finish();
}

fn bench_backward(c: &mut Criterion) {
    let host = HostDevice::new();
    let parallel = ParallelDevice::new(4).expect("parallel device");
    let mut group = c.benchmark_group("backward");
    for &dim in &[8usize, 16, 32] {
        let mut layer = layer(dim);
        let x0 = ramp(Shape::matrix(BATCH, dim));
        let x1 = ramp(Shape::matrix(BATCH, dim));
        let gy = ramp(Shape::matrix(BATCH, dim));

        group.bench_with_input(BenchmarkId::new("reference", dim), &dim, |b, _| {
            b.iter(|| black_box(layer.backward(&x0, &x1, &gy).expect("backward")))
        });
        for device in [&host as &dyn DeviceRuntime, &parallel] {
            group.bench_with_input(BenchmarkId::new(device.name(), dim), &dim, |b, _| {
                b.iter(|| black_box(layer.backward_on(device, &x0, &x1, &gy).expect("backward")))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_forward, bench_backward);
criterion_main!(benches);
