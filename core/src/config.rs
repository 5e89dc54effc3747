//! Configuration for the leader and worker processes

use crate::distributed::types::{ComputeMode, WorkerId};
use crate::error::{ClusterError, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tally_common::DEFAULT_MAX_FRAME_LENGTH;

/// Minimum number of registered workers for a task to be distributed.
pub const DEFAULT_MIN_WORKERS: usize = 3;

/// Configuration for the leader
#[derive(Debug, Clone)]
pub struct LeaderConfig {
    /// Address clients connect to
    pub client_addr: SocketAddr,
    /// Address workers register on
    pub worker_addr: SocketAddr,
    /// Quorum required before a task is dispatched
    pub min_workers: usize,
    /// Deadline for each per-worker call; `None` waits forever
    pub dispatch_timeout: Option<Duration>,
    /// Largest accepted frame body in bytes
    pub max_frame_length: usize,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            client_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            worker_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8001)),
            min_workers: DEFAULT_MIN_WORKERS,
            dispatch_timeout: None,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }
}

impl LeaderConfig {
    pub fn new(client_addr: SocketAddr, worker_addr: SocketAddr) -> Self {
        Self {
            client_addr,
            worker_addr,
            ..Self::default()
        }
    }

    pub fn with_min_workers(mut self, min_workers: usize) -> Self {
        self.min_workers = min_workers;
        self
    }

    pub fn with_dispatch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_workers == 0 {
            return Err(ClusterError::configuration("min_workers must be at least 1"));
        }
        if self.dispatch_timeout == Some(Duration::ZERO) {
            return Err(ClusterError::configuration(
                "dispatch timeout must be positive when set",
            ));
        }
        if self.max_frame_length == 0 {
            return Err(ClusterError::configuration(
                "max_frame_length must be positive",
            ));
        }
        Ok(())
    }
}

/// Configuration for a worker node
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// `host:port` of the leader's registration listener
    pub leader_addr: String,
    /// Identifier announced in the handshake
    pub worker_id: WorkerId,
    pub mode: ComputeMode,
}

impl WorkerConfig {
    pub fn new<S: Into<String>>(leader_addr: S) -> Self {
        Self {
            leader_addr: leader_addr.into(),
            worker_id: format!("worker-{}", uuid::Uuid::new_v4()),
            mode: ComputeMode::Honest,
        }
    }

    pub fn with_worker_id<S: Into<String>>(mut self, worker_id: S) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_mode(mut self, mode: ComputeMode) -> Self {
        self.mode = mode;
        self
    }
}
