//! Client side of the task protocol

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use tally_common::{ClientResponse, Connection, ErrorResponse, Message, ProtocolError, TaskRequest};
use tokio::net::ToSocketAddrs;
use tracing::info;

/// What the leader answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed(ClientResponse),
    Rejected(ErrorResponse),
}

pub struct Client;

impl Client {
    /// Send `request` to the leader at `addr` and wait for its single reply.
    pub async fn submit<A: ToSocketAddrs>(addr: A, request: TaskRequest) -> Result<TaskOutcome> {
        let mut connection = Connection::connect(addr).await?;
        connection.send(request).await?;
        info!("Sent task to leader");

        match connection.recv().await? {
            Some(Message::ClientResponse(response)) => Ok(TaskOutcome::Completed(response)),
            Some(Message::ErrorResponse(error)) => Ok(TaskOutcome::Rejected(error)),
            Some(other) => Err(ProtocolError::unexpected("ClientResponse", other.kind()).into()),
            None => Err(ClusterError::ConnectionClosed),
        }
    }
}

/// Parse a comma-separated list of integers such as `"1, 2, 3,4"`.
pub fn parse_values(input: &str) -> Result<Vec<i32>> {
    if input.trim().is_empty() {
        return Err(ClusterError::invalid_input("list cannot be empty"));
    }
    input
        .split(',')
        .map(|item| {
            item.trim().parse::<i32>().map_err(|_| {
                ClusterError::invalid_input(format!(
                    "expected comma-separated integers, found {:?}",
                    item.trim()
                ))
            })
        })
        .collect()
}

/// Parse a non-negative delay in milliseconds.
pub fn parse_delay(input: &str) -> Result<i32> {
    let delay = input
        .trim()
        .parse::<i32>()
        .map_err(|_| ClusterError::invalid_input(format!("invalid delay {:?}", input.trim())))?;
    if delay < 0 {
        return Err(ClusterError::invalid_input("delay cannot be negative"));
    }
    Ok(delay)
}
