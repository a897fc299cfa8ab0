//! Client entry point: one-shot operations against the cluster.

use clap::{Parser, Subcommand};
use corelib::{RingBuilder, Topology};
use replication::Client;
use std::path::PathBuf;
use tracing::info;

/// Issue requests to the key-value store cluster.
#[derive(Parser, Debug)]
#[command(name = "dkv-client", version, about)]
struct Args {
    /// Path to a JSON cluster config overriding the built-in cluster.
    #[arg(long)]
    cluster: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a value.
    Put { key: String, value: String },
    /// Read a value from a quorum of replicas.
    Get { key: String },
    /// Print the hash ring topology.
    Ring,
}

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let config = cli::load_config(args.cluster)?;

    match args.command {
        Command::Put { key, value } => {
            let client = Client::new(config)?;
            let replicated = client.put(&key, &value)?;
            info!(key = %key, replicated, "put finished");
        }
        Command::Get { key } => {
            let client = Client::new(config)?;
            match client.get(&key)? {
                Some(lookup) => {
                    println!("{}", lookup.value);
                    info!(key = %key, timestamp = lookup.timestamp, "get finished");
                }
                None => println!("(not found)"),
            }
        }
        Command::Ring => {
            let ring = RingBuilder::new()
                .with_vnodes(config.virtual_nodes)
                .add_nodes(&config.nodes)
                .build()?;
            print!("{}", Topology::new(&ring).describe());
        }
    }
    Ok(())
}
