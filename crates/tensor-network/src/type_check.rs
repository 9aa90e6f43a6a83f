// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape checks run before any computation.

use crate::ShapeError;
use tensor_core::Shape;

/// Validates the inputs of a forward (or backward) call and returns the
/// batch size `N`.
///
/// Requires exactly two inputs, each of rank >= 2, sharing dimension 0, whose
/// trailing dimensions multiply out to `d1` and `d2` respectively. Rank and
/// batch are checked on both inputs before any feature count.
///
/// # Examples
/// ```
/// use tensor_core::Shape;
/// use tensor_network::type_check::check_forward;
///
/// let x0 = Shape::new(vec![8, 3, 2, 2]); // a batch of 3x2x2 images, d1 = 12
/// let x1 = Shape::matrix(8, 5);
/// assert_eq!(check_forward([12, 5], &[&x0, &x1]).unwrap(), 8);
/// ```
pub fn check_forward(in_shape: [usize; 2], inputs: &[&Shape]) -> Result<usize, ShapeError> {
    let (x0, x1) = match inputs {
        [x0, x1] => (*x0, *x1),
        _ => {
            return Err(ShapeError::InputCount {
                actual: inputs.len(),
            })
        }
    };

    let inputs = [x0, x1];
    let mut flat = [(0usize, 0usize); 2];
    for (index, shape) in inputs.into_iter().enumerate() {
        flat[index] = shape
            .batch_flattened()
            .filter(|_| shape.rank() >= 2)
            .ok_or_else(|| ShapeError::InputRank {
                index,
                shape: shape.clone(),
            })?;
    }
    let [(batch, f0), (batch1, f1)] = flat;
    if batch != batch1 {
        return Err(ShapeError::BatchMismatch {
            lhs: batch,
            rhs: batch1,
        });
    }

    for (index, (actual, expected)) in [f0, f1].into_iter().zip(in_shape).enumerate() {
        if actual != expected {
            return Err(ShapeError::FeatureMismatch {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(batch)
}

/// Validates that the upstream gradient is `[N, out]`.
pub fn check_backward(batch: usize, out_size: usize, grad_y: &Shape) -> Result<(), ShapeError> {
    let expected = Shape::matrix(batch, out_size);
    if grad_y != &expected {
        return Err(ShapeError::GradOutput {
            expected,
            actual: grad_y.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_flat_inputs() {
        let a = Shape::matrix(4, 3);
        let b = Shape::matrix(4, 2);
        assert_eq!(check_forward([3, 2], &[&a, &b]).unwrap(), 4);
    }

    #[test]
    fn test_accepts_higher_rank_inputs() {
        let a = Shape::new(vec![2, 1, 3]);
        let b = Shape::new(vec![2, 2, 1, 1]);
        assert_eq!(check_forward([3, 2], &[&a, &b]).unwrap(), 2);
    }

    #[test]
    fn test_input_count() {
        let a = Shape::matrix(4, 3);
        assert_eq!(
            check_forward([3, 2], &[&a]),
            Err(ShapeError::InputCount { actual: 1 })
        );
        assert_eq!(
            check_forward([3, 2], &[&a, &a, &a]),
            Err(ShapeError::InputCount { actual: 3 })
        );
    }

    #[test]
    fn test_rank_one_rejected() {
        let a = Shape::vector(3);
        let b = Shape::matrix(1, 2);
        assert!(matches!(
            check_forward([3, 2], &[&a, &b]),
            Err(ShapeError::InputRank { index: 0, .. })
        ));
        assert!(matches!(
            check_forward([3, 2], &[&b, &a]),
            Err(ShapeError::InputRank { index: 1, .. })
        ));
    }

    #[test]
    fn test_rank_checked_before_features() {
        let a = Shape::matrix(1, 2);
        let b = Shape::vector(3);
        assert!(matches!(
            check_forward([3, 2], &[&a, &b]),
            Err(ShapeError::InputRank { index: 1, .. })
        ));
        let c = Shape::matrix(2, 2);
        assert_eq!(
            check_forward([3, 2], &[&a, &c]),
            Err(ShapeError::BatchMismatch { lhs: 1, rhs: 2 })
        );
    }

    #[test]
    fn test_batch_mismatch() {
        let a = Shape::matrix(4, 3);
        let b = Shape::matrix(5, 2);
        assert_eq!(
            check_forward([3, 2], &[&a, &b]),
            Err(ShapeError::BatchMismatch { lhs: 4, rhs: 5 })
        );
    }

    #[test]
    fn test_feature_mismatch() {
        let a = Shape::matrix(4, 3);
        let b = Shape::matrix(4, 3);
        assert_eq!(
            check_forward([3, 2], &[&a, &b]),
            Err(ShapeError::FeatureMismatch {
                index: 1,
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_check_backward() {
        assert!(check_backward(4, 2, &Shape::matrix(4, 2)).is_ok());
        assert!(matches!(
            check_backward(4, 2, &Shape::matrix(4, 3)),
            Err(ShapeError::GradOutput { .. })
        ));
        assert!(check_backward(4, 2, &Shape::vector(8)).is_err());
    }
}
