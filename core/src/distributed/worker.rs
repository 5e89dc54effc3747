//! Worker implementation for distributed computing
//!
//! A worker dials the leader's registration port, announces itself with a
//! handshake and then answers subtasks on that same connection until the
//! leader hangs up.

use crate::config::WorkerConfig;
use crate::distributed::baseline::compute;
use crate::distributed::types::{ComputeMode, WorkerId};
use crate::error::Result;
use tally_common::{Connection, Handshake, SubtaskRequest, SubtaskResult};
use tracing::{debug, info};

pub struct Worker {
    worker_id: WorkerId,
    mode: ComputeMode,
    connection: Connection,
}

impl Worker {
    /// Connect to the leader and register.
    pub async fn connect(config: WorkerConfig) -> Result<Self> {
        info!("Connecting to leader at: {}", config.leader_addr);

        let mut connection = Connection::connect(config.leader_addr.as_str()).await?;
        connection
            .send(Handshake {
                worker_id: config.worker_id.clone(),
            })
            .await?;

        info!(
            worker_id = %config.worker_id,
            mode = ?config.mode,
            "Registered with leader"
        );

        Ok(Self {
            worker_id: config.worker_id,
            mode: config.mode,
            connection,
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Serve subtasks until the leader closes the connection.
    ///
    /// Returns `Ok(())` on a clean close and an error for anything else,
    /// including a message that is not a subtask.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let Some(message) = self.connection.recv().await? else {
                info!(worker_id = %self.worker_id, "Leader closed the connection");
                return Ok(());
            };
            let request = message.into_subtask_request()?;
            let result = self.execute(request).await;
            self.connection.send(result).await?;
        }
    }

    async fn execute(&self, request: SubtaskRequest) -> SubtaskResult {
        debug!(
            worker_id = %self.worker_id,
            len = request.values.len(),
            delay_ms = request.delay_ms,
            faulty = self.mode == ComputeMode::Faulty,
            "Received subtask"
        );

        let sum = compute(self.mode, &request.values, request.delay_ms).await;

        info!(worker_id = %self.worker_id, result = sum, "Computation done");
        SubtaskResult {
            sum,
            worker_id: self.worker_id.clone(),
        }
    }
}
