//! Error types for packet-stream.

use thiserror::Error;

/// Main error type for buffer, framing and transport operations.
#[derive(Debug, Error)]
pub enum PacketError {
    /// Input could not be converted to octets (or octets to text).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pop/shift asked for more octets than the buffer holds.
    #[error("Buffer underflow: requested {requested} bytes, {available} available")]
    BufferUnderflow { requested: usize, available: usize },

    /// Byte or bit index outside the current bounds.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Framing strategy missing or reporting an impossible boundary.
    #[error("Strategy misconfigured: {0}")]
    StrategyMisconfigured(String),

    /// Buffered data grew past the limit without a frame boundary.
    #[error("Buffered {buffered} bytes without a frame boundary (limit {limit})")]
    FrameTooLarge { buffered: usize, limit: usize },

    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using PacketError.
pub type Result<T> = std::result::Result<T, PacketError>;
