//! Shared plumbing for the command-line binaries.

use anyhow::Context;
use corelib::ClusterConfig;
use std::path::PathBuf;

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Load the cluster configuration: the compiled-in default, or a JSON
/// override.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<ClusterConfig> {
    let config = match path {
        Some(path) => ClusterConfig::from_json_file(&path)
            .with_context(|| format!("loading cluster config from {}", path.display()))?,
        None => ClusterConfig::default(),
    };
    config.validate().context("invalid cluster config")?;
    Ok(config)
}
