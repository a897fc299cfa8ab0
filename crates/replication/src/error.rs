//! Error types for the replication protocol.

/// Result type alias for the replication crate.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors surfaced by the coordinators.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// Transport or codec failure on a single exchange.
    #[error(transparent)]
    Wire(#[from] wire::WireError),

    /// Ring or configuration failure.
    #[error(transparent)]
    Ring(#[from] corelib::Error),

    /// Too few responses arrived before the deadline.
    #[error("quorum not reached: {received} of {required} responses")]
    QuorumTimeout { received: usize, required: usize },

    /// The peer replied with something other than the expected body.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// The server socket could not be set up.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// The server's port does not belong to any configured node.
    #[error("port {0} is not in the configured node list")]
    UnknownServerPort(u16),
}
