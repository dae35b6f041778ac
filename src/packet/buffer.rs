//! Double-ended byte buffer.
//!
//! `Packet` is an ordered sequence of octets backed by `bytes::BytesMut`.
//! Octets are appended at the tail, removed from the tail with `pop_*` and
//! removed from the head with `shift_*`. Head removal is O(1): `BytesMut`
//! advances its start offset instead of moving the remaining octets.
//!
//! # Byte order
//!
//! Every multi-octet integer is written Big Endian:
//! ```text
//! put_uint32(0x11223344)  ->  .. 0x11 0x22 0x33 0x44
//!                                ^head-side        ^tail
//! ```
//! `pop_uint32` reads that value back from the tail and `shift_uint32` reads
//! it back from the head. The two only agree with `put_uint32` when the value
//! sits at the end they read from.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::bits::{bit_of, bits_of, BITS_PER_OCTET};
use super::encoding::{Contents, Needle, TextEncoding};
use crate::error::{PacketError, Result};

/// Ordered, mutable, double-ended sequence of octets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    bytes: BytesMut,
    encoding: TextEncoding,
}

impl Packet {
    /// Create an empty UTF-8 packet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty packet with the given text encoding.
    pub fn with_encoding(encoding: TextEncoding) -> Self {
        Self {
            bytes: BytesMut::new(),
            encoding,
        }
    }

    /// Create an empty UTF-8 packet with room for `capacity` octets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_encoding(capacity, TextEncoding::Utf8)
    }

    /// Create an empty packet with room for `capacity` octets and the given
    /// text encoding.
    pub fn with_capacity_and_encoding(capacity: usize, encoding: TextEncoding) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            encoding,
        }
    }

    /// Create a UTF-8 packet pre-filled with `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            bytes: BytesMut::from(text.as_bytes()),
            encoding: TextEncoding::Utf8,
        }
    }

    /// Create a packet pre-filled with `text` in the given encoding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `text` cannot be encoded.
    pub fn from_text_with(text: &str, encoding: TextEncoding) -> Result<Self> {
        let mut packet = Self::with_encoding(encoding);
        packet.put_text(text)?;
        Ok(packet)
    }

    /// Declared text encoding.
    #[inline]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Number of octets held.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the packet holds no octets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Allocated capacity in octets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Borrow the contents, head first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Owned snapshot of the contents. The packet is left untouched.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bytes)
    }

    /// Octet at `index`, counted from the head.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Drop all octets, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    // ------------------------------------------------------------------
    // Append (tail)
    // ------------------------------------------------------------------

    /// Append one octet to the tail.
    #[inline]
    pub fn append_octet(&mut self, value: u8) {
        self.bytes.put_u8(value);
    }

    /// Append raw octets to the tail, in order.
    #[inline]
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Encode `text` with `encoding` and append it to the tail.
    ///
    /// Nothing is appended on failure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `text` cannot be encoded.
    pub fn append_text(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        let encoded = encoding.encode(text)?;
        self.bytes.extend_from_slice(&encoded);
        Ok(())
    }

    /// Append `text` using the packet's own encoding.
    pub fn put_text(&mut self, text: &str) -> Result<()> {
        self.append_text(text, self.encoding)
    }

    /// Append text or raw octets.
    ///
    /// # Example
    ///
    /// ```
    /// use packet_stream::packet::Packet;
    ///
    /// let mut packet = Packet::new();
    /// packet.fill("GET / HTTP/1.1").unwrap();
    /// packet.fill(b"\r\n").unwrap();
    /// assert_eq!(packet.as_slice(), b"GET / HTTP/1.1\r\n");
    /// ```
    pub fn fill<'a>(&mut self, contents: impl Into<Contents<'a>>) -> Result<()> {
        match contents.into() {
            Contents::Text(text) => self.put_text(text),
            Contents::Bytes(bytes) => {
                self.append_bytes(bytes);
                Ok(())
            }
        }
    }

    /// Append one octet.
    #[inline]
    pub fn put_uint8(&mut self, value: u8) {
        self.append_octet(value);
    }

    /// Append a u16, most significant octet first.
    ///
    /// # Example
    ///
    /// ```
    /// use packet_stream::packet::Packet;
    ///
    /// let mut packet = Packet::new();
    /// packet.put_uint16(0x1234);
    /// assert_eq!(packet.as_slice(), &[0x12, 0x34]);
    /// ```
    #[inline]
    pub fn put_uint16(&mut self, value: u16) {
        self.bytes.put_u16(value);
    }

    /// Append a u32, most significant octet first.
    #[inline]
    pub fn put_uint32(&mut self, value: u32) {
        self.bytes.put_u32(value);
    }

    /// Append a u64, most significant octet first.
    #[inline]
    pub fn put_uint64(&mut self, value: u64) {
        self.bytes.put_u64(value);
    }

    // ------------------------------------------------------------------
    // Pop (tail)
    // ------------------------------------------------------------------

    /// Remove and return the last octet.
    pub fn pop_uint8(&mut self) -> Result<u8> {
        self.ensure_available(1)?;
        let last = self.bytes.len() - 1;
        let value = self.bytes[last];
        self.bytes.truncate(last);
        Ok(value)
    }

    /// Remove a Big Endian u16 from the tail.
    ///
    /// The last octet is the low half, the one before it the high half.
    pub fn pop_uint16(&mut self) -> Result<u16> {
        self.ensure_available(2)?;
        let low = u16::from(self.pop_uint8()?);
        let high = u16::from(self.pop_uint8()?);
        Ok(high << 8 | low)
    }

    /// Remove a Big Endian u32 from the tail.
    pub fn pop_uint32(&mut self) -> Result<u32> {
        self.ensure_available(4)?;
        let low = u32::from(self.pop_uint16()?);
        let high = u32::from(self.pop_uint16()?);
        Ok(high << 16 | low)
    }

    /// Remove a Big Endian u64 from the tail.
    pub fn pop_uint64(&mut self) -> Result<u64> {
        self.ensure_available(8)?;
        let low = u64::from(self.pop_uint32()?);
        let high = u64::from(self.pop_uint32()?);
        Ok(high << 32 | low)
    }

    /// Remove and return the last `length` octets, in their original order.
    pub fn pop_bytes(&mut self, length: usize) -> Result<Bytes> {
        self.ensure_available(length)?;
        let start = self.bytes.len() - length;
        let tail = Bytes::copy_from_slice(&self.bytes[start..]);
        self.bytes.truncate(start);
        Ok(tail)
    }

    /// Drain the whole packet.
    pub fn pop_all(&mut self) -> Bytes {
        self.bytes.split().freeze()
    }

    // ------------------------------------------------------------------
    // Shift (head)
    // ------------------------------------------------------------------

    /// Remove and return the first octet.
    pub fn shift_uint8(&mut self) -> Result<u8> {
        self.ensure_available(1)?;
        Ok(self.bytes.get_u8())
    }

    /// Remove a Big Endian u16 from the head.
    pub fn shift_uint16(&mut self) -> Result<u16> {
        self.ensure_available(2)?;
        Ok(self.bytes.get_u16())
    }

    /// Remove a Big Endian u32 from the head.
    pub fn shift_uint32(&mut self) -> Result<u32> {
        self.ensure_available(4)?;
        Ok(self.bytes.get_u32())
    }

    /// Remove a Big Endian u64 from the head.
    pub fn shift_uint64(&mut self) -> Result<u64> {
        self.ensure_available(8)?;
        Ok(self.bytes.get_u64())
    }

    /// Remove and return exactly the first `length` octets.
    ///
    /// Zero-copy: the returned `Bytes` shares the packet's allocation.
    pub fn shift_bytes(&mut self, length: usize) -> Result<Bytes> {
        self.ensure_available(length)?;
        Ok(self.bytes.split_to(length).freeze())
    }

    // ------------------------------------------------------------------
    // Read-only access
    // ------------------------------------------------------------------

    /// Borrow the first `length` octets without consuming them.
    pub fn peek_bytes(&self, length: usize) -> Result<&[u8]> {
        self.ensure_available(length)?;
        Ok(&self.bytes[..length])
    }

    /// Decode the first `length` octets as text without consuming them.
    ///
    /// # Errors
    ///
    /// `BufferUnderflow` if fewer than `length` octets are held,
    /// `InvalidInput` if they don't decode in the packet's encoding.
    pub fn peek_text(&self, length: usize) -> Result<String> {
        let head = self.peek_bytes(length)?;
        self.encoding.decode(head)
    }

    /// Offset of the first occurrence of `needle`, if any.
    ///
    /// An empty needle matches at offset 0. Text that can't be encoded in
    /// the packet's encoding is never found.
    ///
    /// # Example
    ///
    /// ```
    /// use packet_stream::packet::Packet;
    ///
    /// let packet = Packet::from_text("key: value\r\n");
    /// assert_eq!(packet.find(b':'), Some(3));
    /// assert_eq!(packet.find("\r\n"), Some(10));
    /// assert_eq!(packet.find(b"\n\n"), None);
    /// ```
    pub fn find<'a>(&self, needle: impl Into<Needle<'a>>) -> Option<usize> {
        match needle.into() {
            Needle::Octet(octet) => self.bytes.iter().position(|&b| b == octet),
            Needle::Bytes(seq) => find_subsequence(&self.bytes, seq),
            Needle::Text(text) => {
                let encoded = self.encoding.encode(text).ok()?;
                find_subsequence(&self.bytes, &encoded)
            }
        }
    }

    /// Check if `needle` occurs anywhere in the packet.
    #[inline]
    pub fn contains<'a>(&self, needle: impl Into<Needle<'a>>) -> bool {
        self.find(needle).is_some()
    }

    /// Bit `bit_index` (0 = most significant) of the octet at `byte_index`.
    pub fn bit_at(&self, byte_index: usize, bit_index: usize) -> Result<u8> {
        bit_of(self.octet_at(byte_index)?, bit_index)
    }

    /// All eight bits of the octet at `byte_index`, most significant first.
    pub fn bits_at(&self, byte_index: usize) -> Result<[u8; BITS_PER_OCTET]> {
        Ok(bits_of(self.octet_at(byte_index)?))
    }

    fn octet_at(&self, index: usize) -> Result<u8> {
        self.get(index).ok_or(PacketError::IndexOutOfRange {
            index,
            len: self.bytes.len(),
        })
    }

    #[inline]
    fn ensure_available(&self, requested: usize) -> Result<()> {
        if requested > self.bytes.len() {
            return Err(PacketError::BufferUnderflow {
                requested,
                available: self.bytes.len(),
            });
        }
        Ok(())
    }
}

/// First offset of `needle` in `haystack`. An empty needle matches at 0.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    match needle.len() {
        0 => Some(0),
        1 => haystack.iter().position(|&b| b == needle[0]),
        n if n > haystack.len() => None,
        n => haystack.windows(n).position(|window| window == needle),
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Packet Length={}>", self.bytes.len())
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&[u8]> for Packet {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: BytesMut::from(bytes),
            encoding: TextEncoding::Utf8,
        }
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(&bytes[..])
    }
}

impl From<Bytes> for Packet {
    fn from(bytes: Bytes) -> Self {
        Self::from(&bytes[..])
    }
}

impl From<&str> for Packet {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
