//! Client process: `tally-client <leader_host> <leader_port>`

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use tally_common::TaskRequest;
use tally_core::distributed::{parse_delay, parse_values};
use tally_core::{Client, TaskOutcome, logging};

#[derive(Parser)]
#[command(author, version, about = "Distributed sum client", long_about = None)]
struct Args {
    /// Leader host name or address
    leader_host: String,

    /// Leader client port
    leader_port: u16,

    /// Comma-separated integers; prompted for when omitted
    #[arg(long)]
    values: Option<String>,

    /// Per-element delay in milliseconds; prompted for when omitted
    #[arg(long)]
    delay_ms: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let values = match args.values {
        Some(values) => values,
        None => prompt("Enter comma-separated list of integers: ")?,
    };
    let values = parse_values(&values)?;

    let delay = match args.delay_ms {
        Some(delay) => delay,
        None => prompt("Enter delay in milliseconds: ")?,
    };
    let delay_ms = parse_delay(&delay)?;

    let outcome = Client::submit(
        (args.leader_host.as_str(), args.leader_port),
        TaskRequest { values, delay_ms },
    )
    .await
    .context("request to leader failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        TaskOutcome::Completed(result) => {
            println!("====== Result ======");
            println!("Sum: {}", result.sum);
            println!("Single-threaded time: {} ms", result.baseline_ms);
            println!("Distributed time: {} ms", result.distributed_ms);
        }
        TaskOutcome::Rejected(error) => {
            println!("ERROR ({}): {}", error.code, error.message);
        }
    }
    Ok(())
}
