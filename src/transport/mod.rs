//! Transport module - adapter between a byte source and a framer.
//!
//! Wraps anything implementing tokio's `AsyncRead`/`AsyncWrite` (TCP
//! streams, Unix sockets, in-memory duplex pipes).

mod stream;

pub use stream::{PacketStream, READ_CHUNK_SIZE};
