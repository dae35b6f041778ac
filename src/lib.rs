//! # packet-stream
//!
//! Byte buffering and stream framing for socket-style protocols.
//!
//! Bytes arrive from a socket in chunks of unpredictable size. This crate
//! accumulates them and cuts them into application-level frames.
//!
//! ## Architecture
//!
//! - **Packet** ([`packet::Packet`]): double-ended octet buffer with Big
//!   Endian integer put/pop/shift, search and bit access
//! - **Framer** ([`protocol::StreamFramer`]): accumulation buffer plus a
//!   pluggable [`protocol::Strategy`] (fixed length, delimiter, predicate)
//! - **Transport** ([`transport::PacketStream`]): drives a framer from any
//!   tokio reader/writer
//!
//! ## Example
//!
//! ```
//! use packet_stream::protocol::{Strategy, StreamFramer};
//!
//! let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
//!
//! let frames = framer.push(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
//! assert_eq!(frames.len(), 1);
//! assert_eq!(&frames[0][..], b"GET / HTTP/1.1\r\n");
//!
//! let frames = framer.push(b"mple.com\r\n").unwrap();
//! assert_eq!(&frames[0][..], b"Host: example.com\r\n");
//! ```

pub mod error;
pub mod packet;
pub mod protocol;
pub mod transport;

pub use error::{PacketError, Result};
pub use packet::{Packet, TextEncoding};
pub use protocol::{Strategy, StreamFramer};
pub use transport::PacketStream;
