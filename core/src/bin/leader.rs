//! Leader process: `tally-leader <client_port> <worker_port>`

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tally_core::config::DEFAULT_MIN_WORKERS;
use tally_core::{Leader, LeaderConfig, logging};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Distributed sum leader", long_about = None)]
struct Args {
    /// Port clients submit tasks on
    client_port: u16,

    /// Port workers register on
    worker_port: u16,

    /// Interface to bind both listeners to
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Workers required before a task is distributed
    #[arg(long, default_value_t = DEFAULT_MIN_WORKERS)]
    min_workers: usize,

    /// Give up on a worker that has not replied within this many milliseconds
    #[arg(long)]
    dispatch_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = LeaderConfig::new(
        SocketAddr::new(args.bind, args.client_port),
        SocketAddr::new(args.bind, args.worker_port),
    )
    .with_min_workers(args.min_workers)
    .with_dispatch_timeout(args.dispatch_timeout_ms.map(Duration::from_millis));

    let leader = Leader::bind(config).await?;
    leader
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received ctrl-c");
            }
        })
        .await?;
    Ok(())
}
