// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data-parallel device on a dedicated `rayon` worker pool.
//!
//! Each kernel validates its launch with the `tensor-core` shape helpers,
//! then splits the output into rows (columns for `sum_rows`) and runs the
//! shared per-row arithmetic on the pool. A kernel returns only after every
//! work item has finished.

use super::{kernel_error, DeviceRuntime};
use crate::DeviceError;
use rayon::prelude::*;
use tensor_core::{ops, PairAxis, Tensor, TensorView, Transpose};

const NAME: &str = "parallel";

/// Row-parallel kernels executed on an owned thread pool.
#[derive(Debug)]
pub struct ParallelDevice {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl ParallelDevice {
    /// Starts a pool with `threads` workers.
    pub fn new(threads: usize) -> Result<Self, DeviceError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tn-device-{i}"))
            .build()
            .map_err(|e| DeviceError::ThreadPool(e.to_string()))?;
        tracing::info!(threads, "parallel device started");
        Ok(Self { pool, threads })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl DeviceRuntime for ParallelDevice {
    fn name(&self) -> &'static str {
        NAME
    }

    fn row_outer_product(
        &self,
        a: &TensorView<'_>,
        b: &TensorView<'_>,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        let (_, p, q) = ops::outer_dims(a.shape(), b.shape(), out.shape())
            .map_err(kernel_error(NAME, "row_outer_product"))?;
        let (a, b) = (a.as_f32_slice(), b.as_f32_slice());
        let row_len = p * q;
        if row_len == 0 {
            return Ok(());
        }
        self.pool.install(|| {
            out.as_f32_slice_mut()
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(n, row)| {
                    ops::outer_row(&a[n * p..(n + 1) * p], &b[n * q..(n + 1) * q], row)
                });
        });
        Ok(())
    }

    fn gemm(
        &self,
        lhs: &TensorView<'_>,
        lhs_t: Transpose,
        rhs: &TensorView<'_>,
        rhs_t: Transpose,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        let dims = ops::gemm_dims(lhs.shape(), lhs_t, rhs.shape(), rhs_t, out.shape())
            .map_err(kernel_error(NAME, "gemm"))?;
        let (a, b) = (lhs.as_f32_slice(), rhs.as_f32_slice());
        if dims.n == 0 {
            return Ok(());
        }
        self.pool.install(|| {
            out.as_f32_slice_mut()
                .par_chunks_mut(dims.n)
                .enumerate()
                .for_each(|(i, c_row)| ops::gemm_row(a, lhs_t, b, rhs_t, dims, i, beta, c_row));
        });
        Ok(())
    }

    fn row_contract(
        &self,
        pairs: &TensorView<'_>,
        factor: &TensorView<'_>,
        keep: PairAxis,
        beta: f32,
        out: &mut Tensor,
    ) -> Result<(), DeviceError> {
        let (_, p, q) = ops::contract_dims(pairs.shape(), factor.shape(), keep, out.shape())
            .map_err(kernel_error(NAME, "row_contract"))?;
        let (t, f) = (pairs.as_f32_slice(), factor.as_f32_slice());
        let (f_len, o_len) = match keep {
            PairAxis::First => (q, p),
            PairAxis::Second => (p, q),
        };
        if o_len == 0 {
            return Ok(());
        }
        self.pool.install(|| {
            out.as_f32_slice_mut()
                .par_chunks_mut(o_len)
                .enumerate()
                .for_each(|(s, row)| {
                    ops::contract_row(
                        &t[s * p * q..(s + 1) * p * q],
                        &f[s * f_len..(s + 1) * f_len],
                        keep,
                        p,
                        q,
                        beta,
                        row,
                    )
                });
        });
        Ok(())
    }

    fn add_row_broadcast(&self, out: &mut Tensor, row: &TensorView<'_>) -> Result<(), DeviceError> {
        let m = ops::broadcast_dims(out.shape(), row.shape())
            .map_err(kernel_error(NAME, "add_row_broadcast"))?;
        let r = row.as_f32_slice();
        if m == 0 {
            return Ok(());
        }
        self.pool.install(|| {
            out.as_f32_slice_mut().par_chunks_mut(m).for_each(|out_row| {
                for (o, &b) in out_row.iter_mut().zip(r) {
                    *o += b;
                }
            });
        });
        Ok(())
    }

    fn sum_rows(&self, x: &TensorView<'_>, beta: f32, out: &mut Tensor) -> Result<(), DeviceError> {
        let m = ops::broadcast_dims(x.shape(), out.shape())
            .map_err(kernel_error(NAME, "sum_rows"))?;
        let xs = x.as_f32_slice();
        let rows = if m == 0 { 0 } else { xs.len() / m };
        self.pool.install(|| {
            out.as_f32_slice_mut()
                .par_iter_mut()
                .enumerate()
                .for_each(|(l, acc)| {
                    let base = if beta == 0.0 { 0.0 } else { beta * *acc };
                    *acc = base + (0..rows).map(|n| xs[n * m + l]).sum::<f32>();
                });
        });
        Ok(())
    }
}
