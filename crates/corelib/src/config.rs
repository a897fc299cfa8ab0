//! Cluster configuration.
//!
//! The node list is a static configuration known identically to every
//! client and server; the compiled-in default matches the four-node local
//! cluster. Deployments can override it with a JSON file.

use crate::error::{Error, Result};
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default virtual nodes per physical node.
pub const DEFAULT_VIRTUAL_NODES: usize = 100;
/// Default replication factor.
pub const DEFAULT_REPLICATION_FACTOR: usize = 3;
/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 8;
/// Default quorum wait deadline, for both reads and replication.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Static cluster configuration shared by clients and servers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Ordered list of server endpoints.
    pub nodes: Vec<Node>,
    /// Virtual nodes inserted per physical node.
    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: usize,
    /// Number of replicas per key, primary included.
    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,
    /// Worker pool size for connection handling and background tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Deadline for a quorum of GET responses.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub get_timeout: Duration,
    /// Deadline for a quorum of replication acknowledgements.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub replication_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: vec![
                Node::new("127.0.0.1", 8081),
                Node::new("127.0.0.1", 8082),
                Node::new("127.0.0.1", 8083),
                Node::new("127.0.0.1", 8084),
            ],
            virtual_nodes: DEFAULT_VIRTUAL_NODES,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            workers: DEFAULT_WORKERS,
            get_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            replication_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClusterConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::InvalidConfig(format!("read {}: {}", path.as_ref().display(), e)))?;
        let config: ClusterConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("parse {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration invariants the protocol depends on.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyNodeList);
        }
        if self.replication_factor == 0 {
            return Err(Error::InvalidConfig("replication factor must be positive".into()));
        }
        if self.nodes.len() < self.replication_factor {
            return Err(Error::NotEnoughNodes {
                have: self.nodes.len(),
                need: self.replication_factor,
            });
        }
        if self.virtual_nodes == 0 {
            return Err(Error::InvalidConfig("virtual nodes must be positive".into()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("worker count must be positive".into()));
        }
        Ok(())
    }

    /// Majority threshold over the whole cluster: `N/2 + 1`.
    pub fn quorum(&self) -> usize {
        self.nodes.len() / 2 + 1
    }

    /// Find the configured node listening on `port`, if any. Servers use
    /// this to resolve their own identity at startup.
    pub fn node_on_port(&self, port: u16) -> Option<&Node> {
        self.nodes.iter().find(|n| n.port == port)
    }
}

fn default_virtual_nodes() -> usize {
    DEFAULT_VIRTUAL_NODES
}

fn default_replication_factor() -> usize {
    DEFAULT_REPLICATION_FACTOR
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// Serialize the timeouts as plain seconds in config files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
