//! Distributed computing module for tally
//!
//! This module provides the Leader-Worker implementation: worker
//! registration, partitioned fan-out of client tasks, result aggregation and
//! the consistency check applied before answering a client.

pub mod baseline;
pub mod client;
pub mod consensus;
pub mod dispatch;
pub mod leader;
pub mod partitioner;
pub mod registry;
pub mod types;
pub mod worker;

pub use baseline::{BaselineResult, compute, compute_baseline};
pub use client::{Client, TaskOutcome, parse_delay, parse_values};
pub use dispatch::Dispatcher;
pub use leader::{Leader, SessionState};
pub use partitioner::{Partition, partition, split};
pub use registry::{NodeRegistry, WorkerHandle};
pub use types::*;
pub use worker::Worker;
