//! One-shot request/reply exchange with a server node.
//!
//! The protocol is stateless per connection: connect, send one framed
//! request, read one framed reply, close.

use crate::error::Result;
use corelib::Node;
use std::net::TcpStream;
use wire::{decode_server, encode_client, recv_frame, send_frame, ClientMessage, ServerMessage};

pub(crate) fn exchange(node: &Node, message: &ClientMessage) -> Result<ServerMessage> {
    let addr = node.socket_addr().map_err(wire::WireError::Io)?;
    let mut stream = TcpStream::connect(addr).map_err(wire::WireError::Io)?;
    let payload = encode_client(message)?;
    send_frame(&mut stream, &payload)?;
    let reply = recv_frame(&mut stream)?;
    Ok(decode_server(&reply)?)
}
