//! Error types for the core library.

use crate::node::Node;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// These are all construction or configuration failures; ring lookups on a
/// well-formed ring cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A ring cannot be built from an empty node list.
    #[error("node list must not be empty")]
    EmptyNodeList,

    /// The node is already present on the ring.
    #[error("node {0} already exists")]
    DuplicateNode(Node),

    /// The node is not present on the ring.
    #[error("node {0} not found")]
    UnknownNode(Node),

    /// The ring holds fewer physical nodes than the requested replica count.
    #[error("not enough nodes for replication: have {have}, need {need}")]
    NotEnoughNodes { have: usize, need: usize },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
