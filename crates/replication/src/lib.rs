//! Replication and consistency protocol.
//!
//! This crate holds both halves of the coordinator protocol:
//!
//! - **Server side**: the in-memory [`store::Store`] with its logical
//!   clock, and the [`server::Server`] that accepts framed requests and
//!   performs primary-coordinated PUT replication.
//! - **Client side**: the [`client::Client`] that routes PUTs to the
//!   primary, fans GETs out to the replica set, reconciles by
//!   last-write-wins and schedules background read repair.
//!
//! Shared plumbing: the bounded [`pool::WorkerPool`] and the
//! [`quorum::QuorumWait`] majority-wait primitive.

pub mod client;
pub mod error;
pub mod pool;
pub mod quorum;
mod rpc;
pub mod server;
pub mod store;

pub use client::{Client, Lookup};
pub use error::{ReplicationError, Result};
pub use pool::WorkerPool;
pub use quorum::QuorumWait;
pub use server::{Server, ServerHandle};
pub use store::{Entry, Store};
