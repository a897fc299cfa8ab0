//! Wire protocol for the distributed key-value store.
//!
//! This crate provides the transport and serialization layer:
//! - Length-prefixed framing over blocking TCP streams
//! - The client/server message schema
//! - The bincode codec between messages and frame payloads

pub mod codec;
pub mod error;
pub mod frame;
pub mod protocol;

pub use codec::{decode_client, decode_server, encode_client, encode_server};
pub use error::{WireError, WireResult};
pub use frame::{recv_frame, send_frame};
pub use protocol::{
    ClientMessage, GetRequest, GetResponse, PutRequest, PutResponse, Reply, ServerMessage, Status,
};
