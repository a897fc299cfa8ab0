//! Node abstractions for the cluster.
//!
//! Nodes represent addressable server endpoints. They are value types,
//! equal by `(ip, port)`, and identical on every participant that shares
//! the same cluster configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// An addressable server endpoint in the cluster.
///
/// Keep this struct small and cheap to clone; heavy mutable state
/// (connections, stores, metrics) lives elsewhere.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Node {
    /// IP address the server listens on.
    pub ip: String,
    /// TCP port the server listens on.
    pub port: u16,
}

impl Node {
    /// Construct a new node endpoint.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }

    /// Resolve this endpoint to a socket address.
    ///
    /// Fails only if the configured IP string does not parse, which is a
    /// configuration error surfaced at connect time.
    pub fn socket_addr(&self) -> std::io::Result<SocketAddr> {
        let ip: IpAddr = self.ip.parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid node address {}", self),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
