//! Common test utilities and helpers for integration tests

use std::net::SocketAddr;
use std::time::Duration;
use tally_common::{Connection, Handshake, Message, TaskRequest};
use tally_core::{
    Client, ComputeMode, Leader, LeaderConfig, NodeRegistry, TaskOutcome, Worker, WorkerConfig,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// A leader running on ephemeral loopback ports.
pub struct TestCluster {
    pub client_addr: SocketAddr,
    pub worker_addr: SocketAddr,
    pub registry: NodeRegistry,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<tally_core::Result<()>>,
}

impl TestCluster {
    pub async fn start() -> Self {
        Self::start_with(LeaderConfig::default()).await
    }

    pub async fn start_with(config: LeaderConfig) -> Self {
        let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = LeaderConfig {
            client_addr: loopback,
            worker_addr: loopback,
            ..config
        };
        let leader = Leader::bind(config).await.expect("leader should bind");
        let client_addr = leader.client_addr().unwrap();
        let worker_addr = leader.worker_addr().unwrap();
        let registry = leader.registry();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(leader.run_until(async {
            let _ = rx.await;
        }));

        Self {
            client_addr,
            worker_addr,
            registry,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Start a library worker and wait until the leader has registered it.
    pub async fn add_worker(&self, id: &str, mode: ComputeMode) -> JoinHandle<tally_core::Result<()>> {
        let expected = self.registry.len().await + 1;
        let config = WorkerConfig::new(self.worker_addr.to_string())
            .with_worker_id(id)
            .with_mode(mode);
        let worker = Worker::connect(config).await.expect("worker should connect");
        let handle = tokio::spawn(worker.run());
        wait_for_workers(&self.registry, expected).await;
        handle
    }

    /// Register a hand-driven worker connection and return it.
    pub async fn add_raw_worker(&self, id: &str) -> Connection {
        let expected = self.registry.len().await + 1;
        let mut connection = Connection::connect(self.worker_addr).await.unwrap();
        connection
            .send(Handshake {
                worker_id: id.to_string(),
            })
            .await
            .unwrap();
        wait_for_workers(&self.registry, expected).await;
        connection
    }

    pub async fn submit(&self, values: Vec<i32>, delay_ms: i32) -> TaskOutcome {
        Client::submit(self.client_addr, TaskRequest { values, delay_ms })
            .await
            .expect("leader should answer")
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("leader should stop")
            .unwrap()
            .unwrap();
    }
}

/// Poll until `registry` holds exactly `count` workers.
pub async fn wait_for_workers(registry: &NodeRegistry, count: usize) {
    let poll = async {
        while registry.len().await != count {
            sleep(Duration::from_millis(10)).await;
        }
    };
    timeout(Duration::from_secs(5), poll)
        .await
        .unwrap_or_else(|_| panic!("registry never reached {count} workers"));
}

/// Serve a raw worker connection: answer every subtask with its true sum.
pub fn serve_honestly(mut connection: Connection, id: &str) -> JoinHandle<()> {
    let id = id.to_string();
    tokio::spawn(async move {
        while let Ok(Some(Message::SubtaskRequest(request))) = connection.recv().await {
            let reply = tally_common::SubtaskResult {
                sum: request.values.iter().sum(),
                worker_id: id.clone(),
            };
            if connection.send(reply).await.is_err() {
                break;
            }
        }
    })
}

/// Assert nothing arrives on `connection` within a short window.
pub async fn assert_silent(connection: &mut Connection) {
    let received = timeout(Duration::from_millis(200), connection.recv()).await;
    assert!(
        received.is_err(),
        "expected no traffic, got {:?}",
        received.map(|r| r.map(|m| m.map(|m| m.kind())))
    );
}

pub fn expect_completed(outcome: TaskOutcome) -> tally_common::ClientResponse {
    match outcome {
        TaskOutcome::Completed(response) => response,
        TaskOutcome::Rejected(error) => panic!("expected a result, got error {error:?}"),
    }
}

pub fn expect_rejected(outcome: TaskOutcome) -> tally_common::ErrorResponse {
    match outcome {
        TaskOutcome::Rejected(error) => error,
        TaskOutcome::Completed(response) => panic!("expected an error, got {response:?}"),
    }
}
