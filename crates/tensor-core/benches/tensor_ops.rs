// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the dense host kernels.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tensor_core::{gemm, row_outer_product, Shape, Tensor, Transpose};

fn ramp(shape: Shape) -> Tensor {
    let n = shape.num_elements();
    let data = (0..n).map(|i| ((i % 17) as f32 - 8.0) * 0.05).collect();
    Tensor::from_vec(shape, data).expect("ramp tensor")
}

fn bench_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm");
    for &size in &[32usize, 64, 128] {
        let a = ramp(Shape::matrix(size, size));
        let b = ramp(Shape::matrix(size, size));
        let mut out = Tensor::zeros(Shape::matrix(size, size));
        for (label, rhs_t) in [("nn", Transpose::No), ("nt", Transpose::Yes)] {
            group.bench_with_input(BenchmarkId::new(label, size), &size, |bench, _| {
                bench.iter(|| {
                    gemm(&a.view(), Transpose::No, &b.view(), rhs_t, 0.0, &mut out)
                        .expect("gemm");
                    black_box(out.as_f32_slice()[0]);
                })
            });
        }
    }
    group.finish();
}

fn bench_row_outer_product(c: &mut Criterion) {
    let batch = 64;
    let a = ramp(Shape::matrix(batch, 32));
    let b = ramp(Shape::matrix(batch, 32));
    let mut out = Tensor::zeros(Shape::matrix(batch, 32 * 32));
    c.bench_function("row_outer_product/64x32x32", |bench| {
        bench.iter(|| {
            row_outer_product(&a.view(), &b.view(), &mut out).expect("outer");
            black_box(out.as_f32_slice()[0]);
        })
    });
}

criterion_group!(benches, bench_gemm, bench_row_outer_product);
criterion_main!(benches);
