//! Registry of connected workers
//!
//! The registry is owned by the leader process and shared by the registration
//! listener (which adds workers) and by dispatch rounds (which remove workers
//! whose connection failed). Every access goes through one mutex, and rounds
//! only ever see whole-list snapshots.

use crate::distributed::types::WorkerId;
use crate::error::{ClusterError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tally_common::{Connection, SubtaskRequest, SubtaskResult};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A registered worker and the connection it registered on.
#[derive(Debug)]
pub struct WorkerHandle {
    worker_id: WorkerId,
    peer: Option<SocketAddr>,
    /// One request/reply exchange at a time per connection
    connection: Mutex<Connection>,
    alive: AtomicBool,
}

impl WorkerHandle {
    pub fn new(worker_id: WorkerId, connection: Connection) -> Self {
        Self {
            worker_id,
            peer: connection.peer_addr(),
            connection: Mutex::new(connection),
            alive: AtomicBool::new(true),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Send one subtask and wait for its result.
    ///
    /// `timeout` bounds the exchange itself, starting once this call owns the
    /// connection. Any failure, including an expired deadline or a malformed
    /// or unexpected reply, marks the handle dead before the connection is
    /// released and is reported as [`ClusterError::WorkerUnreachable`]. A
    /// dead handle refuses further calls, so a reply that arrives after its
    /// request was abandoned is never read by a later round.
    pub async fn call(
        &self,
        request: SubtaskRequest,
        timeout: Option<Duration>,
    ) -> Result<SubtaskResult> {
        let mut connection = self.connection.lock().await;
        if !self.is_alive() {
            return Err(ClusterError::worker_unreachable(
                &self.worker_id,
                "connection already abandoned",
            ));
        }

        let exchange = Self::exchange(&self.worker_id, &mut connection, request);
        let outcome = match timeout {
            None => exchange.await,
            Some(limit) => tokio::time::timeout(limit, exchange).await.unwrap_or_else(|_| {
                Err(ClusterError::worker_unreachable(
                    &self.worker_id,
                    format!("no reply within {}ms", limit.as_millis()),
                ))
            }),
        };

        if outcome.is_err() {
            self.mark_dead();
        }
        outcome
    }

    async fn exchange(
        worker_id: &str,
        connection: &mut Connection,
        request: SubtaskRequest,
    ) -> Result<SubtaskResult> {
        connection
            .send(request)
            .await
            .map_err(|e| ClusterError::worker_unreachable(worker_id, e))?;

        let reply = connection
            .recv()
            .await
            .map_err(|e| ClusterError::worker_unreachable(worker_id, e))?
            .ok_or_else(|| ClusterError::worker_unreachable(worker_id, "connection closed"))?;

        let result = reply
            .into_subtask_result()
            .map_err(|e| ClusterError::worker_unreachable(worker_id, e))?;

        if result.worker_id != worker_id {
            warn!(
                worker_id = %worker_id,
                reported = %result.worker_id,
                "Worker reported a different id in its result"
            );
        }
        Ok(result)
    }
}

/// Shared, mutex-guarded set of live workers in registration order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    workers: Arc<Mutex<Vec<Arc<WorkerHandle>>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worker. A live worker with the same id is replaced in place, so
    /// a reconnecting worker keeps its position in dispatch order.
    pub async fn register(&self, handle: WorkerHandle) -> Arc<WorkerHandle> {
        let handle = Arc::new(handle);
        let mut workers = self.workers.lock().await;

        match workers
            .iter_mut()
            .find(|existing| existing.worker_id == handle.worker_id)
        {
            Some(slot) => {
                warn!(
                    worker_id = %handle.worker_id,
                    "Worker is re-registering. Replacing old connection."
                );
                slot.mark_dead();
                *slot = Arc::clone(&handle);
            }
            None => workers.push(Arc::clone(&handle)),
        }

        info!(
            worker_id = %handle.worker_id,
            peer = ?handle.peer,
            registered = workers.len(),
            "Registered worker"
        );
        handle
    }

    /// Consistent copy of the live workers, in registration order.
    pub async fn snapshot(&self) -> Vec<Arc<WorkerHandle>> {
        self.workers
            .lock()
            .await
            .iter()
            .filter(|handle| handle.is_alive())
            .cloned()
            .collect()
    }

    /// Remove whichever handle is registered under `worker_id`.
    pub async fn remove(&self, worker_id: &str) -> Option<Arc<WorkerHandle>> {
        let mut workers = self.workers.lock().await;
        let position = workers.iter().position(|h| h.worker_id == worker_id)?;
        let removed = workers.remove(position);
        removed.mark_dead();
        info!(worker_id = %worker_id, remaining = workers.len(), "Removed worker");
        Some(removed)
    }

    /// Remove `handle` only if it is still the registered instance for its id.
    ///
    /// Returns `false` when the worker already reconnected under the same id,
    /// in which case the newer connection is left in place.
    pub async fn deregister(&self, handle: &Arc<WorkerHandle>) -> bool {
        handle.mark_dead();
        let mut workers = self.workers.lock().await;
        match workers.iter().position(|h| Arc::ptr_eq(h, handle)) {
            Some(position) => {
                workers.remove(position);
                info!(
                    worker_id = %handle.worker_id,
                    remaining = workers.len(),
                    "Deregistered failed worker"
                );
                true
            }
            None => {
                debug!(
                    worker_id = %handle.worker_id,
                    "Failed worker already replaced or removed"
                );
                false
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.workers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workers.lock().await.is_empty()
    }

    pub async fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers
            .lock()
            .await
            .iter()
            .map(|h| h.worker_id.clone())
            .collect()
    }

    /// Drop every registration, closing the connections once no round holds
    /// them any more.
    pub async fn clear(&self) {
        let mut workers = self.workers.lock().await;
        for handle in workers.iter() {
            handle.mark_dead();
        }
        let count = workers.len();
        workers.clear();
        info!("Cleared {} registered workers", count);
    }
}
