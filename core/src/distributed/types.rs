//! Distributed computing types
//!
//! This module defines the core types shared by the leader, its workers and
//! the dispatch engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for workers, chosen by the worker at handshake
pub type WorkerId = String;

/// How a worker computes its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComputeMode {
    /// Sum the partition
    #[default]
    Honest,
    /// Multiply the partition instead, producing a deliberately wrong value
    Faulty,
}

impl ComputeMode {
    /// Map the `simulateFault` CLI flag (`0` or `1`) to a mode.
    pub fn from_fault_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Honest),
            1 => Some(Self::Faulty),
            _ => None,
        }
    }
}

/// A worker's answer for one partition of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Position of the partition this result covers
    pub index: usize,
    pub worker_id: WorkerId,
    pub value: i32,
}

/// Everything a dispatch round produced.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// Replies actually received, in partition order
    pub partials: Vec<PartialResult>,
    /// Workers that failed during the round and were deregistered
    pub failed: Vec<WorkerId>,
    /// Wall time from first dispatch to last completion
    pub elapsed: Duration,
}

impl RoundOutcome {
    /// Sum of every partial result received. Wraps on overflow.
    pub fn aggregate(&self) -> i32 {
        self.partials
            .iter()
            .fold(0i32, |acc, partial| acc.wrapping_add(partial.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_flag() {
        assert_eq!(ComputeMode::from_fault_flag(0), Some(ComputeMode::Honest));
        assert_eq!(ComputeMode::from_fault_flag(1), Some(ComputeMode::Faulty));
        assert_eq!(ComputeMode::from_fault_flag(2), None);
    }

    #[test]
    fn test_aggregate_skips_missing_partitions() {
        let outcome = RoundOutcome {
            partials: vec![
                PartialResult {
                    index: 0,
                    worker_id: "a".to_string(),
                    value: 3,
                },
                PartialResult {
                    index: 2,
                    worker_id: "c".to_string(),
                    value: 11,
                },
            ],
            failed: vec!["b".to_string()],
            elapsed: Duration::ZERO,
        };
        assert_eq!(outcome.aggregate(), 14);
    }
}
