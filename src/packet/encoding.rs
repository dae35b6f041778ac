//! Text encodings used at the string ⇄ byte boundary.
//!
//! A [`Packet`](super::Packet) only ever stores octets. Text is converted
//! when it enters the buffer (`append_text`, `put_text`, `fill`) and when it
//! is read back (`peek_text`).

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PacketError, Result};

/// Declared text encoding of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8 (default).
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1: one octet per char, chars above U+00FF rejected.
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
    /// 7-bit ASCII.
    #[serde(rename = "ascii", alias = "us-ascii")]
    Ascii,
}

impl TextEncoding {
    /// Canonical label of this encoding.
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Encode text to octets.
    ///
    /// UTF-8 borrows the input; the single-byte encodings allocate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a char has no representation in this encoding.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            TextEncoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            TextEncoding::Latin1 => self.encode_single_byte(text, 0xFF),
            TextEncoding::Ascii => self.encode_single_byte(text, 0x7F),
        }
    }

    fn encode_single_byte<'a>(&self, text: &'a str, max: u32) -> Result<Cow<'a, [u8]>> {
        if text.is_ascii() {
            return Ok(Cow::Borrowed(text.as_bytes()));
        }

        text.chars()
            .map(|c| {
                let code = c as u32;
                if code <= max {
                    Ok(code as u8)
                } else {
                    Err(PacketError::InvalidInput(format!(
                        "character {:?} cannot be encoded as {}",
                        c,
                        self.label()
                    )))
                }
            })
            .collect::<Result<Vec<u8>>>()
            .map(Cow::Owned)
    }

    /// Decode octets to text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the octets are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| PacketError::InvalidInput(format!("invalid utf-8: {}", e))),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(PacketError::InvalidInput(format!(
                    "non-ascii byte 0x{:02x} at offset {}",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            other => Err(PacketError::InvalidInput(format!(
                "unknown encoding: {}",
                other
            ))),
        }
    }
}

/// Contents accepted by [`Packet::fill`](super::Packet::fill).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contents<'a> {
    /// Text, encoded with the buffer's encoding.
    Text(&'a str),
    /// Raw octets, appended as-is.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Contents<'a> {
    fn from(text: &'a str) -> Self {
        Contents::Text(text)
    }
}

impl<'a> From<&'a String> for Contents<'a> {
    fn from(text: &'a String) -> Self {
        Contents::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Contents<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Contents::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Contents<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Contents::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Contents<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Contents::Bytes(bytes)
    }
}

/// Search target for [`Packet::find`](super::Packet::find).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Needle<'a> {
    /// A single octet value.
    Octet(u8),
    /// A literal byte sequence.
    Bytes(&'a [u8]),
    /// Text, encoded with the buffer's encoding before searching.
    Text(&'a str),
}

impl From<u8> for Needle<'_> {
    fn from(octet: u8) -> Self {
        Needle::Octet(octet)
    }
}

impl<'a> From<&'a [u8]> for Needle<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Needle::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Needle<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Needle::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Needle<'a> {
    fn from(text: &'a str) -> Self {
        Needle::Text(text)
    }
}
