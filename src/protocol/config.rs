//! Framer configuration.
//!
//! Limits live in [`FramingLimits`]; [`FramerConfig`] adds the strategy and
//! text encoding so a whole framer can be described in JSON:
//!
//! ```
//! use packet_stream::protocol::{FramerConfig, StreamFramer};
//!
//! let config = FramerConfig::from_json(r#"{
//!     "strategy": { "type": "delimiter", "delimiter": "\r\n" },
//!     "max_buffered": 65536
//! }"#).unwrap();
//!
//! let mut framer = StreamFramer::from_config(&config);
//! let frames = framer.push(b"PING\r\nPO").unwrap();
//! assert_eq!(&frames[0][..], b"PING\r\n");
//! ```

use serde::{Deserialize, Serialize};

use super::strategy::{LengthWidth, Strategy};
use crate::error::{PacketError, Result};
use crate::packet::TextEncoding;

/// Default initial buffer capacity (64KB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 64 * 1024;

/// Default limit on buffered bytes without a frame boundary (1 GB).
pub const DEFAULT_MAX_BUFFERED: usize = 1_073_741_824;

/// Buffer sizing and limits for a [`StreamFramer`](super::StreamFramer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingLimits {
    /// Capacity reserved up front for the accumulation buffer.
    pub initial_capacity: usize,
    /// Maximum bytes held while no frame boundary is found.
    pub max_buffered: usize,
}

impl Default for FramingLimits {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_buffered: DEFAULT_MAX_BUFFERED,
        }
    }
}

/// Delimiter bytes in a config: a JSON string, or an array of octets for
/// delimiters that are not valid UTF-8.
///
/// ```
/// use packet_stream::protocol::{FramerConfig, StrategyConfig};
///
/// let config = FramerConfig::from_json(
///     r#"{"strategy": {"type": "delimiter", "delimiter": [0, 255]}}"#,
/// ).unwrap();
/// match config.strategy {
///     Some(StrategyConfig::Delimiter { delimiter, .. }) => {
///         assert_eq!(delimiter.as_bytes(), &[0x00, 0xFF]);
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelimiterConfig {
    /// UTF-8 text, e.g. `"\r\n"`.
    Text(String),
    /// Raw octets, e.g. `[13, 10]`.
    Bytes(Vec<u8>),
}

impl DelimiterConfig {
    /// The delimiter octets.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DelimiterConfig::Text(text) => text.as_bytes(),
            DelimiterConfig::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for DelimiterConfig {
    fn from(text: &str) -> Self {
        DelimiterConfig::Text(text.to_string())
    }
}

impl From<Vec<u8>> for DelimiterConfig {
    fn from(bytes: Vec<u8>) -> Self {
        DelimiterConfig::Bytes(bytes)
    }
}

/// Serializable description of a [`Strategy`].
///
/// Predicates other than length-prefixed framing are code, not data, and
/// can only be attached through [`Strategy::predicate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Frames of exactly `length` octets.
    FixedLength {
        length: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_bytes: Option<usize>,
    },
    /// Frames terminated by `delimiter` (text or raw octets).
    Delimiter {
        delimiter: DelimiterConfig,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_bytes: Option<usize>,
    },
    /// Big Endian length field followed by the payload.
    LengthPrefixed {
        width: LengthWidth,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_bytes: Option<usize>,
    },
}

impl StrategyConfig {
    /// Check the config describes a usable strategy.
    ///
    /// # Errors
    ///
    /// Returns `StrategyMisconfigured` for an empty delimiter.
    pub fn validate(&self) -> Result<()> {
        match self {
            StrategyConfig::Delimiter { delimiter, .. } if delimiter.as_bytes().is_empty() => Err(
                PacketError::StrategyMisconfigured("delimiter must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Build the strategy this config describes.
    pub fn build(&self) -> Strategy {
        let (strategy, min_bytes) = match self {
            StrategyConfig::FixedLength { length, min_bytes } => {
                (Strategy::fixed_length(*length), *min_bytes)
            }
            StrategyConfig::Delimiter {
                delimiter,
                min_bytes,
            } => (Strategy::delimiter(delimiter.as_bytes()), *min_bytes),
            StrategyConfig::LengthPrefixed { width, min_bytes } => {
                (Strategy::length_prefixed(*width), *min_bytes)
            }
        };

        match min_bytes {
            Some(min_bytes) => strategy.with_min_bytes(min_bytes),
            None => strategy,
        }
    }
}

/// Complete framer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramerConfig {
    /// Strategy attached at construction; `None` leaves the framer
    /// unconfigured until `set_strategy` is called.
    #[serde(default)]
    pub strategy: Option<StrategyConfig>,
    /// Text encoding of the accumulation buffer.
    #[serde(default)]
    pub encoding: TextEncoding,
    /// Buffer sizing and limits.
    #[serde(flatten)]
    pub limits: FramingLimits,
}

impl FramerConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the document doesn't match the schema and
    /// `StrategyMisconfigured` if it describes an unusable strategy.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the strategy, if any, is usable.
    pub fn validate(&self) -> Result<()> {
        match &self.strategy {
            Some(strategy) => strategy.validate(),
            None => Ok(()),
        }
    }

    /// Serialize this configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
