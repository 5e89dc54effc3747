//! Fan-out/fan-in dispatch of a task across registered workers
//!
//! A round partitions the request over a registry snapshot, spawns one call
//! per worker and waits for every call to finish. Workers that fail are
//! deregistered and simply contribute nothing to the round.

use crate::config::LeaderConfig;
use crate::distributed::partitioner::{Partition, partition};
use crate::distributed::registry::{NodeRegistry, WorkerHandle};
use crate::distributed::types::{PartialResult, RoundOutcome};
use crate::error::{ClusterError, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tally_common::{Stopwatch, SubtaskRequest, TaskRequest};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: NodeRegistry,
    min_workers: usize,
    /// Per-call deadline; `None` waits for as long as the worker takes
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: NodeRegistry, min_workers: usize, timeout: Option<Duration>) -> Self {
        Self {
            registry,
            min_workers,
            timeout,
        }
    }

    pub fn from_config(registry: NodeRegistry, config: &LeaderConfig) -> Self {
        Self::new(registry, config.min_workers, config.dispatch_timeout)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Snapshot the registry, failing if it is below quorum.
    pub async fn checked_snapshot(&self) -> Result<Vec<Arc<WorkerHandle>>> {
        let snapshot = self.registry.snapshot().await;
        if snapshot.len() < self.min_workers {
            return Err(ClusterError::InsufficientWorkers {
                available: snapshot.len(),
                required: self.min_workers,
            });
        }
        Ok(snapshot)
    }

    /// Quorum check followed by a full dispatch round.
    pub async fn run_round(&self, request: &TaskRequest) -> Result<RoundOutcome> {
        let snapshot = self.checked_snapshot().await?;
        Ok(self.dispatch(request, snapshot).await)
    }

    /// Send one partition to each worker in `snapshot` and wait for all of
    /// them.
    ///
    /// Partition `i` always goes to `snapshot[i]`. When the input has fewer
    /// elements than there are workers, the trailing workers sit the round
    /// out.
    pub async fn dispatch(
        &self,
        request: &TaskRequest,
        snapshot: Vec<Arc<WorkerHandle>>,
    ) -> RoundOutcome {
        let partitions = partition(request.values.len(), snapshot.len());
        if partitions.len() < snapshot.len() {
            debug!(
                "Only {} partitions for {} workers; {} idle this round",
                partitions.len(),
                snapshot.len(),
                snapshot.len() - partitions.len()
            );
        }

        let assignments: Vec<(Partition, Arc<WorkerHandle>)> =
            partitions.into_iter().zip(snapshot).collect();

        info!("Dispatching {} subtasks", assignments.len());
        let watch = Stopwatch::start();

        let calls = assignments.iter().map(|(partition, handle)| {
            let subtask = SubtaskRequest {
                values: partition.slice(&request.values).to_vec(),
                delay_ms: request.delay_ms,
            };
            let handle = Arc::clone(handle);
            let registry = self.registry.clone();
            let timeout = self.timeout;
            let index = partition.index;

            tokio::spawn(async move {
                let outcome = handle.call(subtask, timeout).await;
                match &outcome {
                    Ok(result) => {
                        info!(
                            worker_id = %handle.worker_id(),
                            index,
                            sum = result.sum,
                            "Worker responded"
                        );
                    }
                    Err(e) => {
                        warn!(
                            worker_id = %handle.worker_id(),
                            peer = ?handle.peer_addr(),
                            index,
                            "Dispatch failed: {}",
                            e
                        );
                        registry.deregister(&handle).await;
                    }
                }
                outcome
            })
        });

        let joined = join_all(calls).await;
        let elapsed = watch.elapsed();

        let mut outcome = RoundOutcome {
            elapsed,
            ..RoundOutcome::default()
        };

        for ((partition, handle), joined) in assignments.iter().zip(joined) {
            match joined {
                Ok(Ok(result)) => outcome.partials.push(PartialResult {
                    index: partition.index,
                    worker_id: handle.worker_id().to_string(),
                    value: result.sum,
                }),
                Ok(Err(_)) => outcome.failed.push(handle.worker_id().to_string()),
                Err(e) => {
                    error!(
                        worker_id = %handle.worker_id(),
                        "Dispatch task aborted: {}",
                        e
                    );
                    self.registry.deregister(handle).await;
                    outcome.failed.push(handle.worker_id().to_string());
                }
            }
        }

        info!(
            received = outcome.partials.len(),
            failed = outcome.failed.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "All node responses received"
        );
        outcome
    }
}
