//! Length-prefixed framing.
//!
//! Every message on the wire is `[4-byte length, big-endian][payload]`.
//! Writers send both segments fully; readers read exactly the prefix and
//! then exactly the payload, treating a short read as connection closure.

use crate::error::{WireError, WireResult};
use bytes::{BufMut, BytesMut};
use std::io::{Read, Write};

/// Sanity cap on a single frame. Declared lengths above this are rejected
/// before any payload allocation.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Send one framed message, prefix and payload both written fully.
pub fn send_frame<W: Write>(writer: &mut W, payload: &[u8]) -> WireResult<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge {
            got: payload.len(),
            limit: MAX_FRAME_LEN,
        });
    }
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    // write_all retries partial sends until the frame is on the wire.
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Receive one framed message.
pub fn recv_frame<R: Read>(reader: &mut R) -> WireResult<Vec<u8>> {
    let mut prefix = [0u8; 4];
    read_exact_or_closed(reader, &mut prefix, "length prefix")?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge {
            got: len,
            limit: MAX_FRAME_LEN,
        });
    }

    let mut payload = vec![0u8; len];
    read_exact_or_closed(reader, &mut payload, "message body")?;
    Ok(payload)
}

fn read_exact_or_closed<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    segment: &'static str,
) -> WireResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::ConnectionClosed(segment)
        } else {
            WireError::Io(e)
        }
    })
}
