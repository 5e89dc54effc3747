//! Tally Core - distributed sum orchestration
//!
//! A leader accepts dynamically registering workers, splits each client task
//! across them, gathers the partial results and checks them for consistency
//! before answering.

pub mod config;
pub mod distributed;
pub mod error;
pub mod logging;

pub use config::{LeaderConfig, WorkerConfig};
pub use distributed::{Client, ComputeMode, Leader, NodeRegistry, TaskOutcome, Worker};
pub use error::{ClusterError, Result};
