//! Server entry point: run one node of the cluster.

use clap::Parser;
use replication::Server;
use std::path::PathBuf;

/// Run a key-value store server node.
#[derive(Parser, Debug)]
#[command(name = "dkv-server", version, about)]
struct Args {
    /// Port to listen on; must belong to a node in the cluster config.
    #[arg(short, long)]
    port: u16,

    /// Path to a JSON cluster config overriding the built-in cluster.
    #[arg(long)]
    cluster: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = Args::parse();

    let config = cli::load_config(args.cluster)?;
    let server = Server::new(args.port, config)?;
    server.run()?;
    Ok(())
}
