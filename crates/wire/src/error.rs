//! Wire-level error types.

/// Result type alias for wire operations.
pub type WireResult<T> = std::result::Result<T, WireError>;

/// Errors on a single framed exchange.
///
/// These are always local to one connection; callers log them and count
/// the exchange as a non-response.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection mid-frame.
    #[error("connection closed during {0}")]
    ConnectionClosed(&'static str),

    /// Declared frame length exceeds the sanity cap.
    #[error("frame of {got} bytes exceeds limit of {limit}")]
    FrameTooLarge { got: usize, limit: usize },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}
