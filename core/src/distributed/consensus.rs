//! Duplicate-value check over a round's partial results
//!
//! A round is rejected when any two workers returned the same value. This is
//! a cheap heuristic for spotting degenerate computations, not a vote: two
//! honest workers whose partitions happen to sum to the same number also fail
//! the check.

use crate::distributed::types::PartialResult;
use crate::error::{ClusterError, Result};
use std::collections::HashSet;
use tracing::warn;

/// Reject `partials` if the number of distinct values is smaller than the
/// number of results.
pub fn validate(partials: &[PartialResult]) -> Result<()> {
    let distinct = partials
        .iter()
        .map(|p| p.value)
        .collect::<HashSet<i32>>()
        .len();

    if distinct < partials.len() {
        warn!(
            distinct,
            total = partials.len(),
            values = ?partials.iter().map(|p| p.value).collect::<Vec<_>>(),
            "Consensus check failed"
        );
        return Err(ClusterError::ConsensusFailed {
            distinct,
            total: partials.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partials(values: &[i32]) -> Vec<PartialResult> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| PartialResult {
                index,
                worker_id: format!("node-{index}"),
                value,
            })
            .collect()
    }

    #[test]
    fn test_distinct_values_pass() {
        assert!(validate(&partials(&[3, 7, 11])).is_ok());
    }

    #[test]
    fn test_duplicate_values_fail() {
        let err = validate(&partials(&[3, 7, 3])).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::ConsensusFailed {
                distinct: 2,
                total: 3
            }
        ));
        assert_eq!(err.error_code(), Some(3));
    }

    #[test]
    fn test_coincidental_equal_sums_are_rejected() {
        // [3] and [1, 2] are both correct, and still collide.
        let values = [[3].iter().sum::<i32>(), [1, 2].iter().sum(), 10];
        assert!(validate(&partials(&values)).is_err());
    }

    #[test]
    fn test_empty_and_single_pass() {
        assert!(validate(&[]).is_ok());
        assert!(validate(&partials(&[0])).is_ok());
    }
}
