//! Worker process: `tally-worker <leader_host> <leader_port> [simulate_fault]`

use anyhow::Context;
use clap::Parser;
use tally_core::{ComputeMode, Worker, WorkerConfig, logging};

#[derive(Parser)]
#[command(author, version, about = "Distributed sum worker", long_about = None)]
struct Args {
    /// Leader host name or address
    leader_host: String,

    /// Leader worker-registration port
    leader_port: u16,

    /// 1 to multiply instead of sum, producing wrong results on purpose
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    simulate_fault: u8,

    /// Identifier announced to the leader (random if omitted)
    #[arg(long)]
    worker_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mode = ComputeMode::from_fault_flag(args.simulate_fault)
        .context("simulate_fault must be 0 or 1")?;
    let mut config =
        WorkerConfig::new(format!("{}:{}", args.leader_host, args.leader_port)).with_mode(mode);
    if let Some(worker_id) = args.worker_id {
        config = config.with_worker_id(worker_id);
    }

    let worker = Worker::connect(config)
        .await
        .context("failed to register with leader")?;
    worker.run().await?;
    Ok(())
}
