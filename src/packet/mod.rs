//! Packet module - the byte buffer underneath every framer.
//!
//! - [`Packet`]: double-ended octet buffer with Big Endian integer codecs
//! - [`TextEncoding`]: string ⇄ byte conversion at the buffer boundary
//! - [`bit_of`] / [`bits_of`]: bit-level reads, bit 0 = most significant

mod bits;
mod buffer;
mod encoding;

pub use bits::{bit_of, bits_of, BITS_PER_OCTET};
pub use buffer::Packet;
pub use encoding::{Contents, Needle, TextEncoding};

pub(crate) use buffer::find_subsequence;
