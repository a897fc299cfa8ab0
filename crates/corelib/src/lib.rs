//! Core library for the distributed key-value store.
//!
//! This crate provides the cluster-wide building blocks shared by servers
//! and clients:
//! - Node endpoints and the static cluster configuration
//! - Ring tokens and the partitioner that produces them
//! - The consistent hash ring with virtual nodes and replica selection
//! - Ring topology inspection

pub mod config;
pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;

pub use config::ClusterConfig;
pub use error::{Error, Result};
pub use node::Node;
pub use partitioner::{Partitioner, SipPartitioner};
pub use ring::{HashRing, RingBuilder};
pub use token::RingToken;
pub use topology::Topology;
