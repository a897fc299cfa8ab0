//! Bincode codec between messages and frame payloads.
//!
//! The framing layer carries opaque byte payloads; this module is the only
//! place that knows their encoding.

use crate::error::{WireError, WireResult};
use crate::protocol::{ClientMessage, ServerMessage};

pub fn encode_client(message: &ClientMessage) -> WireResult<Vec<u8>> {
    bincode::serialize(message).map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode_client(payload: &[u8]) -> WireResult<ClientMessage> {
    bincode::deserialize(payload).map_err(|e| WireError::Decode(e.to_string()))
}

pub fn encode_server(message: &ServerMessage) -> WireResult<Vec<u8>> {
    bincode::serialize(message).map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode_server(payload: &[u8]) -> WireResult<ServerMessage> {
    bincode::deserialize(payload).map_err(|e| WireError::Decode(e.to_string()))
}
