//! Sequential reference computation
//!
//! The leader sums every request on its own before distributing it, so the
//! client can compare a single-worker timing against the distributed one.
//! The same kernels back the worker's per-partition computation.

use crate::distributed::types::ComputeMode;
use std::time::Duration;
use tally_common::{Stopwatch, millis_i32_to_duration};
use tokio::time::sleep;

/// Value and wall time of a sequential run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineResult {
    pub sum: i32,
    pub elapsed: Duration,
}

/// Sum `values`, paying `delay_ms` once per element.
pub async fn compute_baseline(values: &[i32], delay_ms: i32) -> BaselineResult {
    let watch = Stopwatch::start();
    let sum = compute(ComputeMode::Honest, values, delay_ms).await;
    BaselineResult {
        sum,
        elapsed: watch.elapsed(),
    }
}

/// Fold `values` according to `mode`, sleeping `delay_ms` after each element.
///
/// Arithmetic wraps on overflow.
pub async fn compute(mode: ComputeMode, values: &[i32], delay_ms: i32) -> i32 {
    let delay = millis_i32_to_duration(delay_ms);
    let (init, op): (i32, fn(i32, i32) -> i32) = match mode {
        ComputeMode::Honest => (0, i32::wrapping_add),
        ComputeMode::Faulty => (1, i32::wrapping_mul),
    };

    let mut acc = init;
    for &value in values {
        acc = op(acc, value);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_baseline_sum() {
        let result = compute_baseline(&[1, 2, 3, 4], 0).await;
        assert_eq!(result.sum, 10);
    }

    #[tokio::test]
    async fn test_baseline_respects_delay() {
        let values = [1, 2, 3];
        let result = compute_baseline(&values, 100).await;
        assert_eq!(result.sum, 6);
        assert!(result.elapsed >= Duration::from_millis(100 * values.len() as u64));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let result = compute_baseline(&[], 50).await;
        assert_eq!(result.sum, 0);
        assert_eq!(compute(ComputeMode::Faulty, &[], 0).await, 1);
    }

    #[tokio::test]
    async fn test_faulty_multiplies() {
        assert_eq!(compute(ComputeMode::Faulty, &[2, 3, 4], 0).await, 24);
        assert_eq!(compute(ComputeMode::Honest, &[2, 3, 4], 0).await, 9);
    }

    #[tokio::test]
    async fn test_overflow_wraps() {
        assert_eq!(
            compute(ComputeMode::Honest, &[i32::MAX, 1], 0).await,
            i32::MIN
        );
    }
}
