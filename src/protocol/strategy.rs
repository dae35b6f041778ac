//! Framing strategies.
//!
//! A [`Strategy`] pairs a minimum byte count with a boundary rule. The framer
//! only asks the rule for a boundary once at least `min_bytes` are buffered,
//! and the rule only sees its evaluation window:
//!
//! | Rule | `min_bytes` | Window |
//! |------|-------------|--------|
//! | `FixedLength(n)` | `n` | first `min_bytes` octets |
//! | `Delimiter(d)` | `d.len()` | whole buffer |
//! | `Predicate` (full) | caller | whole buffer |
//! | `Predicate` (prefix) | caller | first `min_bytes` octets |
//!
//! A boundary is reported as a frame length counted from the head. Delimited
//! frames include the delimiter.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{PacketError, Result};
use crate::packet::find_subsequence;

/// Boundary function: given the evaluation window, return the frame length,
/// or `None` if the frame is not complete yet.
pub type BoundaryFn = dyn Fn(&[u8]) -> Option<usize> + Send + Sync;

/// Portion of the buffer a boundary rule may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The first `min_bytes` octets.
    Prefix,
    /// Everything buffered.
    Full,
}

/// Boundary rule of a strategy.
#[derive(Clone)]
pub enum Rule {
    /// Every frame is exactly this many octets.
    FixedLength(usize),
    /// A frame ends right after the first occurrence of this sequence.
    Delimiter(Bytes),
    /// Caller-supplied boundary function.
    Predicate {
        /// Evaluation window handed to `boundary`.
        window: Window,
        /// The boundary function.
        boundary: Arc<BoundaryFn>,
    },
}

impl Rule {
    /// Smallest `min_bytes` that still lets this rule report a frame.
    fn min_floor(&self) -> usize {
        match self {
            Rule::FixedLength(n) => *n,
            Rule::Delimiter(delimiter) => delimiter.len(),
            Rule::Predicate { .. } => 0,
        }
    }

    fn window(&self) -> Window {
        match self {
            Rule::FixedLength(_) => Window::Prefix,
            Rule::Delimiter(_) => Window::Full,
            Rule::Predicate { window, .. } => *window,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::FixedLength(n) => f.debug_tuple("FixedLength").field(n).finish(),
            Rule::Delimiter(delimiter) => f.debug_tuple("Delimiter").field(delimiter).finish(),
            Rule::Predicate { window, .. } => f
                .debug_struct("Predicate")
                .field("window", window)
                .finish_non_exhaustive(),
        }
    }
}

/// Width of the Big Endian length field of a length-prefixed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthWidth {
    /// 1-octet length.
    U8,
    /// 2-octet length.
    U16,
    /// 4-octet length.
    U32,
    /// 8-octet length.
    U64,
}

impl LengthWidth {
    /// Size of the length field in octets.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
            LengthWidth::U32 => 4,
            LengthWidth::U64 => 8,
        }
    }

    /// Read the length field from the start of `buf`.
    ///
    /// Returns `None` if `buf` is shorter than the field.
    pub fn read(&self, buf: &[u8]) -> Option<u64> {
        let field = buf.get(..self.size())?;
        let value = field.iter().fold(0u64, |acc, &b| acc << 8 | u64::from(b));
        Some(value)
    }
}

/// A framing strategy: minimum byte count plus boundary rule.
///
/// # Example
///
/// ```
/// use packet_stream::protocol::Strategy;
///
/// let lines = Strategy::delimiter(b"\r\n");
/// assert_eq!(lines.evaluate(b"GET / HTTP/1.1\r\nHost").unwrap(), Some(16));
/// assert_eq!(lines.evaluate(b"GET / HTTP/1.1").unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Strategy {
    min_bytes: usize,
    rule: Rule,
}

impl Strategy {
    /// Frames of exactly `length` octets.
    pub fn fixed_length(length: usize) -> Self {
        Self {
            min_bytes: length,
            rule: Rule::FixedLength(length),
        }
    }

    /// Frames terminated by `delimiter`, delimiter included.
    ///
    /// An empty delimiter is reported as `StrategyMisconfigured` on the
    /// first evaluation.
    pub fn delimiter(delimiter: impl AsRef<[u8]>) -> Self {
        let delimiter = Bytes::copy_from_slice(delimiter.as_ref());
        Self {
            min_bytes: delimiter.len(),
            rule: Rule::Delimiter(delimiter),
        }
    }

    /// Caller-defined boundary over the whole buffer, evaluated once at
    /// least `min_bytes` are buffered.
    ///
    /// The boundary runs again on every extraction attempt, so it should
    /// look at a bounded part of the buffer (a header) rather than scan it.
    pub fn predicate<F>(min_bytes: usize, boundary: F) -> Self
    where
        F: Fn(&[u8]) -> Option<usize> + Send + Sync + 'static,
    {
        Self {
            min_bytes,
            rule: Rule::Predicate {
                window: Window::Full,
                boundary: Arc::new(boundary),
            },
        }
    }

    /// Caller-defined boundary that only sees the first `min_bytes` octets.
    pub fn predicate_in_prefix<F>(min_bytes: usize, boundary: F) -> Self
    where
        F: Fn(&[u8]) -> Option<usize> + Send + Sync + 'static,
    {
        Self {
            min_bytes,
            rule: Rule::Predicate {
                window: Window::Prefix,
                boundary: Arc::new(boundary),
            },
        }
    }

    /// Frames made of a Big Endian length field followed by that many
    /// payload octets. The frame covers header and payload.
    ///
    /// # Example
    ///
    /// ```
    /// use packet_stream::protocol::{LengthWidth, Strategy};
    ///
    /// let strategy = Strategy::length_prefixed(LengthWidth::U16);
    /// assert_eq!(strategy.evaluate(&[0, 3, b'a', b'b']).unwrap(), None);
    /// assert_eq!(strategy.evaluate(&[0, 3, b'a', b'b', b'c', 0]).unwrap(), Some(5));
    /// ```
    pub fn length_prefixed(width: LengthWidth) -> Self {
        Self::predicate(width.size(), move |buf| {
            let payload = usize::try_from(width.read(buf)?).ok()?;
            let total = width.size().checked_add(payload)?;
            (buf.len() >= total).then_some(total)
        })
    }

    /// Raise the evaluation threshold.
    ///
    /// The threshold never drops below what the rule itself needs: the
    /// frame length for fixed-length frames, the delimiter length for
    /// delimited frames.
    pub fn with_min_bytes(mut self, min_bytes: usize) -> Self {
        self.min_bytes = min_bytes.max(self.rule.min_floor());
        self
    }

    /// Bytes required before the rule is evaluated.
    #[inline]
    pub fn min_bytes(&self) -> usize {
        self.min_bytes
    }

    /// The boundary rule.
    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Decide where the first frame in `buffered` ends.
    ///
    /// Returns:
    /// - `Ok(Some(len))` if a frame of `len` octets is complete
    /// - `Ok(None)` if more data is needed (or the rule reported length 0)
    /// - `Err(StrategyMisconfigured)` for an empty delimiter or a reported
    ///   length longer than the evaluation window
    pub fn evaluate(&self, buffered: &[u8]) -> Result<Option<usize>> {
        self.evaluate_from(buffered, 0)
    }

    /// Same as [`evaluate`](Self::evaluate), but the first `scanned`
    /// octets were already searched without finding a boundary.
    ///
    /// Delimiter search resumes `delimiter.len() - 1` octets before
    /// `scanned`, so a delimiter split across reads is still found. Other
    /// rules ignore `scanned`.
    ///
    /// ```
    /// use packet_stream::protocol::Strategy;
    ///
    /// let lines = Strategy::delimiter(b"\r\n");
    /// assert_eq!(lines.evaluate_from(b"abc\r", 0).unwrap(), None);
    /// assert_eq!(lines.evaluate_from(b"abc\r\n", 4).unwrap(), Some(5));
    /// ```
    pub fn evaluate_from(&self, buffered: &[u8], scanned: usize) -> Result<Option<usize>> {
        if buffered.len() < self.min_bytes {
            return Ok(None);
        }

        let window = match self.rule.window() {
            Window::Prefix => &buffered[..self.min_bytes],
            Window::Full => buffered,
        };

        let length = match &self.rule {
            Rule::FixedLength(n) => (window.len() >= *n).then_some(*n),
            Rule::Delimiter(delimiter) => {
                if delimiter.is_empty() {
                    return Err(PacketError::StrategyMisconfigured(
                        "delimiter must not be empty".to_string(),
                    ));
                }
                let start = scanned
                    .min(window.len())
                    .saturating_sub(delimiter.len() - 1);
                find_subsequence(&window[start..], delimiter)
                    .map(|offset| start + offset + delimiter.len())
            }
            Rule::Predicate { boundary, .. } => boundary(window),
        };

        match length {
            Some(0) | None => Ok(None),
            Some(len) if len > window.len() => Err(PacketError::StrategyMisconfigured(format!(
                "boundary length {} exceeds evaluation window of {} bytes",
                len,
                window.len()
            ))),
            Some(len) => Ok(Some(len)),
        }
    }
}
