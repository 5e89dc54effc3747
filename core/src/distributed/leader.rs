//! Leader implementation for distributed computing
//!
//! The Leader owns the worker registry and runs two listeners: one on which
//! workers register, and one on which clients submit tasks. Each client
//! connection is served by its own task, carrying one request through
//! baseline computation, quorum check, dispatch and validation before a single
//! response is written back.

use crate::config::LeaderConfig;
use crate::distributed::baseline::compute_baseline;
use crate::distributed::consensus;
use crate::distributed::dispatch::Dispatcher;
use crate::distributed::registry::{NodeRegistry, WorkerHandle};
use crate::error::{ClusterError, Result};
use std::future::Future;
use std::net::SocketAddr;
use tally_common::{ClientResponse, Connection, Message, TaskRequest, duration_to_millis_i32};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Lifecycle of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingTask,
    ComputingBaseline,
    CheckingQuorum,
    Dispatching,
    Validating,
    Responding,
    Closed,
}

/// A bound, not yet running, leader.
pub struct Leader {
    config: LeaderConfig,
    registry: NodeRegistry,
    dispatcher: Dispatcher,
    client_listener: TcpListener,
    worker_listener: TcpListener,
}

impl Leader {
    /// Validate `config` and bind both listeners.
    pub async fn bind(config: LeaderConfig) -> Result<Self> {
        config.validate()?;

        let client_listener = TcpListener::bind(config.client_addr)
            .await
            .map_err(|e| ClusterError::io(format!("binding client port {}", config.client_addr), e))?;
        let worker_listener = TcpListener::bind(config.worker_addr)
            .await
            .map_err(|e| ClusterError::io(format!("binding worker port {}", config.worker_addr), e))?;

        let registry = NodeRegistry::new();
        let dispatcher = Dispatcher::from_config(registry.clone(), &config);

        Ok(Self {
            config,
            registry,
            dispatcher,
            client_listener,
            worker_listener,
        })
    }

    pub fn client_addr(&self) -> Result<SocketAddr> {
        self.client_listener
            .local_addr()
            .map_err(|e| ClusterError::io("reading client listener address", e))
    }

    pub fn worker_addr(&self) -> Result<SocketAddr> {
        self.worker_listener
            .local_addr()
            .map_err(|e| ClusterError::io("reading worker listener address", e))
    }

    /// Handle to the registry this leader dispatches against.
    pub fn registry(&self) -> NodeRegistry {
        self.registry.clone()
    }

    /// Serve until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drop every worker registration.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Leader listening for clients on {} and workers on {}",
            self.client_addr()?,
            self.worker_addr()?
        );

        let Leader {
            config,
            registry,
            dispatcher,
            client_listener,
            worker_listener,
        } = self;

        tokio::select! {
            _ = accept_workers(worker_listener, registry.clone(), config.max_frame_length) => {}
            _ = accept_clients(client_listener, dispatcher, config.max_frame_length) => {}
            _ = shutdown => info!("Leader shutting down"),
        }

        registry.clear().await;
        Ok(())
    }
}

async fn accept_workers(listener: TcpListener, registry: NodeRegistry, max_frame_length: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "Worker connection accepted");
                let registry = registry.clone();
                tokio::spawn(async move {
                    register_worker(stream, peer, registry, max_frame_length).await;
                });
            }
            Err(e) => error!("Failed to accept worker connection: {}", e),
        }
    }
}

/// Read the handshake from a fresh worker connection and register it.
async fn register_worker(
    stream: TcpStream,
    peer: SocketAddr,
    registry: NodeRegistry,
    max_frame_length: usize,
) {
    let mut connection = Connection::with_max_frame_length(stream, max_frame_length);

    let handshake = match connection.recv().await {
        Ok(Some(message)) => match message.into_handshake() {
            Ok(handshake) => handshake,
            Err(e) => {
                warn!(%peer, "Rejecting worker: {}", e);
                return;
            }
        },
        Ok(None) => {
            debug!(%peer, "Worker closed before handshake");
            return;
        }
        Err(e) => {
            warn!(%peer, "Rejecting worker: {}", e);
            return;
        }
    };

    if handshake.worker_id.trim().is_empty() {
        warn!(%peer, "Rejecting worker with empty id");
        return;
    }

    registry
        .register(WorkerHandle::new(handshake.worker_id, connection))
        .await;
}

async fn accept_clients(listener: TcpListener, dispatcher: Dispatcher, max_frame_length: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "Client connected");
                let session = ClientSession::new(
                    Connection::with_max_frame_length(stream, max_frame_length),
                    peer,
                    dispatcher.clone(),
                );
                tokio::spawn(session.run());
            }
            Err(e) => error!("Failed to accept client connection: {}", e),
        }
    }
}

/// One client connection, carried from request to response.
struct ClientSession {
    connection: Connection,
    peer: SocketAddr,
    dispatcher: Dispatcher,
    state: SessionState,
}

impl ClientSession {
    fn new(connection: Connection, peer: SocketAddr, dispatcher: Dispatcher) -> Self {
        Self {
            connection,
            peer,
            dispatcher,
            state: SessionState::AwaitingTask,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(peer = %self.peer, from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }

    async fn run(mut self) {
        let request = match self.connection.recv().await {
            Ok(Some(message)) => match message.into_task_request() {
                Ok(request) => request,
                Err(e) => {
                    warn!(peer = %self.peer, "Closing client: {}", e);
                    self.transition(SessionState::Closed);
                    return;
                }
            },
            Ok(None) => {
                debug!(peer = %self.peer, "Client closed without sending a task");
                self.transition(SessionState::Closed);
                return;
            }
            Err(e) => {
                warn!(peer = %self.peer, "Closing client: {}", e);
                self.transition(SessionState::Closed);
                return;
            }
        };

        info!(
            peer = %self.peer,
            len = request.values.len(),
            delay_ms = request.delay_ms,
            "Received task"
        );

        let reply: Message = match self.process(&request).await {
            Ok(response) => response.into(),
            Err(e) => match e.to_error_response() {
                Some(response) => {
                    info!(peer = %self.peer, code = response.code, "Rejecting task: {}", e);
                    response.into()
                }
                None => {
                    error!(peer = %self.peer, "Task failed: {}", e);
                    self.transition(SessionState::Closed);
                    return;
                }
            },
        };

        self.transition(SessionState::Responding);
        if let Err(e) = self.connection.send(reply).await {
            warn!(peer = %self.peer, "Failed to send response: {}", e);
        }
        self.transition(SessionState::Closed);
    }

    async fn process(&mut self, request: &TaskRequest) -> Result<ClientResponse> {
        self.transition(SessionState::ComputingBaseline);
        let baseline = compute_baseline(&request.values, request.delay_ms).await;
        info!(
            sum = baseline.sum,
            elapsed_ms = baseline.elapsed.as_millis() as u64,
            "Baseline computed"
        );

        self.transition(SessionState::CheckingQuorum);
        let snapshot = self.dispatcher.checked_snapshot().await?;

        self.transition(SessionState::Dispatching);
        let outcome = self.dispatcher.dispatch(request, snapshot).await;

        self.transition(SessionState::Validating);
        consensus::validate(&outcome.partials)?;

        let sum = outcome.aggregate();
        if sum != baseline.sum {
            warn!(
                distributed = sum,
                baseline = baseline.sum,
                "Distributed sum differs from baseline"
            );
        }

        Ok(ClientResponse {
            sum,
            baseline_ms: duration_to_millis_i32(baseline.elapsed),
            distributed_ms: duration_to_millis_i32(outcome.elapsed),
        })
    }
}
