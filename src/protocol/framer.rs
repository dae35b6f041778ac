//! Stream framer: accumulate bytes, cut frames.
//!
//! Each cycle the framer is either accumulating (not enough bytes for the
//! strategy to find a boundary) or frame-ready (boundary found, frame cut from
//! the head). There is no terminal state; the framer cycles for as long as
//! its connection lives and any partial frame is dropped with it.
//!
//! # Example
//!
//! ```
//! use packet_stream::protocol::{Strategy, StreamFramer};
//!
//! let mut framer = StreamFramer::with_strategy(Strategy::fixed_length(5));
//!
//! framer.feed(b"AB");
//! assert!(framer.try_extract_frame().unwrap().is_none());
//!
//! framer.feed(b"CDEFGHIJ");
//! let frames = framer.frames().collect::<Result<Vec<_>, _>>().unwrap();
//! assert_eq!(frames, vec![&b"ABCDE"[..], &b"FGHIJ"[..]]);
//! ```

use bytes::Bytes;

use super::config::{FramerConfig, FramingLimits};
use super::strategy::Strategy;
use crate::error::{PacketError, Result};
use crate::packet::Packet;

/// Splits a byte stream into frames using a pluggable [`Strategy`].
///
/// Not internally synchronized: one framer per stream.
#[derive(Debug)]
pub struct StreamFramer {
    /// Accumulated bytes not yet cut into frames.
    buffer: Packet,
    /// Active strategy; `None` until one is attached.
    strategy: Option<Strategy>,
    /// Buffer sizing and limits.
    limits: FramingLimits,
    /// Leading bytes already searched without finding a boundary.
    scanned: usize,
}

impl StreamFramer {
    /// Create a framer with default limits and no strategy.
    ///
    /// A strategy must be attached with [`set_strategy`](Self::set_strategy)
    /// before frames can be extracted.
    pub fn new() -> Self {
        Self::with_limits(FramingLimits::default())
    }

    /// Create a framer with custom limits and no strategy.
    pub fn with_limits(limits: FramingLimits) -> Self {
        Self {
            buffer: Packet::with_capacity(limits.initial_capacity),
            strategy: None,
            limits,
            scanned: 0,
        }
    }

    /// Create a framer with default limits and the given strategy.
    pub fn with_strategy(strategy: Strategy) -> Self {
        let mut framer = Self::new();
        framer.strategy = Some(strategy);
        framer
    }

    /// Create a framer from a full configuration.
    pub fn from_config(config: &FramerConfig) -> Self {
        Self {
            buffer: Packet::with_capacity_and_encoding(
                config.limits.initial_capacity,
                config.encoding,
            ),
            strategy: config.strategy.as_ref().map(|s| s.build()),
            limits: config.limits,
            scanned: 0,
        }
    }

    /// Attach or replace the strategy.
    ///
    /// Buffered bytes are kept; the next extraction uses the new strategy.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        tracing::debug!(
            rule = ?strategy.rule(),
            min_bytes = strategy.min_bytes(),
            buffered = self.buffer.len(),
            "framing strategy set"
        );
        self.strategy = Some(strategy);
        self.scanned = 0;
    }

    /// The active strategy, if any.
    #[inline]
    pub fn strategy(&self) -> Option<&Strategy> {
        self.strategy.as_ref()
    }

    /// Buffer limits.
    #[inline]
    pub fn limits(&self) -> FramingLimits {
        self.limits
    }

    /// Append newly arrived bytes.
    #[inline]
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.append_bytes(data);
    }

    /// Append newly arrived text, encoded with the buffer's encoding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the text can't be encoded; nothing is
    /// appended in that case.
    pub fn feed_text(&mut self, text: &str) -> Result<()> {
        self.buffer.put_text(text)
    }

    /// Try to cut one frame from the head of the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed; nothing is consumed
    /// - `Err(StrategyMisconfigured)` if no strategy is attached or the
    ///   strategy reports an impossible boundary
    /// - `Err(FrameTooLarge)` if more than `max_buffered` bytes are held,
    ///   the strategy's `min_bytes` is reached and still no boundary is found
    ///
    /// Call repeatedly after each [`feed`](Self::feed): one chunk may hold
    /// several frames.
    pub fn try_extract_frame(&mut self) -> Result<Option<Bytes>> {
        let strategy = self.strategy.as_ref().ok_or_else(|| {
            PacketError::StrategyMisconfigured("no framing strategy attached".to_string())
        })?;

        let buffered = self.buffer.len();
        let ready = buffered >= strategy.min_bytes();

        match strategy.evaluate_from(self.buffer.as_slice(), self.scanned)? {
            Some(length) => {
                let frame = self.buffer.shift_bytes(length)?;
                self.scanned = 0;
                tracing::trace!(
                    length,
                    remaining = self.buffer.len(),
                    "frame extracted"
                );
                Ok(Some(frame))
            }
            None if !ready => Ok(None),
            None if buffered > self.limits.max_buffered => {
                self.scanned = buffered;
                tracing::warn!(
                    buffered,
                    limit = self.limits.max_buffered,
                    "no frame boundary within buffer limit"
                );
                Err(PacketError::FrameTooLarge {
                    buffered,
                    limit: self.limits.max_buffered,
                })
            }
            None => {
                self.scanned = buffered;
                Ok(None)
            }
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data stays buffered for the next push.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.feed(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_frame()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Iterate over the frames currently extractable.
    ///
    /// The iterator ends at the first "no frame yet" or after yielding an
    /// error. Calling `frames()` again after the next `feed` resumes where
    /// it stopped.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            framer: self,
            done: false,
        }
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The accumulation buffer.
    #[inline]
    pub fn buffer(&self) -> &Packet {
        &self.buffer
    }

    /// Drain whatever is buffered, typically a partial frame at end of stream.
    pub fn take_remaining(&mut self) -> Bytes {
        self.scanned = 0;
        self.buffer.pop_all()
    }

    /// Drop all buffered bytes. The strategy is kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`StreamFramer::frames`].
pub struct Frames<'a> {
    framer: &'a mut StreamFramer,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.framer.try_extract_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::TextEncoding;
    use crate::protocol::{LengthWidth, StrategyConfig};

    /// Helper to build a u16 length-prefixed frame.
    fn make_prefixed(payload: &[u8]) -> Vec<u8> {
        let mut packet = Packet::new();
        packet.put_uint16(payload.len() as u16);
        packet.append_bytes(payload);
        packet.to_bytes().to_vec()
    }

    #[test]
    fn test_fixed_length_two_frames_in_one_feed() {
        let mut framer = StreamFramer::with_strategy(Strategy::fixed_length(5));
        framer.feed(b"ABCDEFGHIJ");

        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"ABCDE");
        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"FGHIJ");
        assert!(framer.try_extract_frame().unwrap().is_none());
        assert!(framer.is_empty());
    }

    #[test]
    fn test_partial_data_retained() {
        let mut framer = StreamFramer::with_strategy(Strategy::fixed_length(5));

        framer.feed(b"AB");
        assert!(framer.try_extract_frame().unwrap().is_none());
        assert_eq!(framer.len(), 2);

        framer.feed(b"CDE");
        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"ABCDE");
        assert!(framer.try_extract_frame().unwrap().is_none());
    }

    #[test]
    fn test_delimiter_across_feeds() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));

        framer.feed(b"GET / HTTP/1.1\r\n");
        assert_eq!(
            &framer.try_extract_frame().unwrap().unwrap()[..],
            b"GET / HTTP/1.1\r\n"
        );
        assert!(framer.try_extract_frame().unwrap().is_none());

        framer.feed(b"extra");
        assert!(framer.try_extract_frame().unwrap().is_none());
        assert_eq!(framer.buffer().as_slice(), b"extra");

        framer.feed(b"\r\n");
        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"extra\r\n");
    }

    #[test]
    fn test_delimiter_split_across_feeds() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
        assert!(framer.push(b"line\r").unwrap().is_empty());
        let frames = framer.push(b"\nnext").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"line\r\n");
        assert_eq!(framer.len(), 4);
    }

    #[test]
    fn test_no_strategy_is_misconfigured() {
        let mut framer = StreamFramer::new();
        framer.feed(b"data");
        let err = framer.try_extract_frame().unwrap_err();
        assert!(matches!(err, PacketError::StrategyMisconfigured(_)));
        assert_eq!(framer.len(), 4);
    }

    #[test]
    fn test_strategy_attached_after_construction() {
        let mut framer = StreamFramer::new();
        framer.feed(b"abcd");
        framer.set_strategy(Strategy::fixed_length(2));
        assert_eq!(framer.push(b"").unwrap().len(), 2);
    }

    #[test]
    fn test_replacing_strategy_keeps_buffer() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\n"));
        framer.feed(b"abc");
        assert!(framer.try_extract_frame().unwrap().is_none());

        framer.set_strategy(Strategy::fixed_length(2));
        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"ab");
        assert_eq!(framer.buffer().as_slice(), b"c");
    }

    #[test]
    fn test_push_multiple_frames_and_remainder() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b";"));
        let frames = framer.push(b"a;bb;ccc;dd").unwrap();
        let frames: Vec<&[u8]> = frames.iter().map(|f| &f[..]).collect();
        assert_eq!(frames, vec![&b"a;"[..], &b"bb;"[..], &b"ccc;"[..]]);
        assert_eq!(framer.buffer().as_slice(), b"dd");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut framer = StreamFramer::with_strategy(Strategy::length_prefixed(LengthWidth::U16));
        let bytes = make_prefixed(b"hi");

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(framer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(&all_frames[0][..], &[0, 2, b'h', b'i']);
    }

    #[test]
    fn test_length_prefixed_frames() {
        let mut framer = StreamFramer::with_strategy(Strategy::length_prefixed(LengthWidth::U16));
        let mut data = make_prefixed(b"first");
        data.extend(make_prefixed(b""));
        data.extend(make_prefixed(b"third"));

        let mut frames = framer.push(&data).unwrap();
        assert_eq!(frames.len(), 3);

        let mut first = Packet::from(frames.remove(0));
        assert_eq!(first.shift_uint16().unwrap(), 5);
        assert_eq!(first.as_slice(), b"first");
        assert_eq!(&frames[0][..], &[0, 0]);
    }

    #[test]
    fn test_predicate_out_of_window_leaves_buffer() {
        let strategy = Strategy::predicate(1, |buf| Some(buf.len() + 1));
        let mut framer = StreamFramer::with_strategy(strategy);
        framer.feed(b"abc");
        let err = framer.try_extract_frame().unwrap_err();
        assert!(matches!(err, PacketError::StrategyMisconfigured(_)));
        assert_eq!(framer.buffer().as_slice(), b"abc");
    }

    #[test]
    fn test_frame_too_large() {
        let limits = FramingLimits {
            initial_capacity: 0,
            max_buffered: 8,
        };
        let mut framer = StreamFramer::with_limits(limits);
        framer.set_strategy(Strategy::delimiter(b"\n"));

        assert!(framer.push(b"12345678").unwrap().is_empty());
        let err = framer.push(b"9").unwrap_err();
        assert!(matches!(
            err,
            PacketError::FrameTooLarge {
                buffered: 9,
                limit: 8
            }
        ));
        assert_eq!(framer.len(), 9);
    }

    #[test]
    fn test_limit_does_not_block_complete_frames() {
        let limits = FramingLimits {
            initial_capacity: 0,
            max_buffered: 4,
        };
        let mut framer = StreamFramer::with_limits(limits);
        framer.set_strategy(Strategy::fixed_length(2));
        let frames = framer.push(b"aabbccdd").unwrap();
        assert_eq!(frames.len(), 4);
    }

    #[test]
    fn test_frames_iterator_restarts_after_feed() {
        let mut framer = StreamFramer::with_strategy(Strategy::fixed_length(3));
        framer.feed(b"abcdefg");
        assert_eq!(framer.frames().count(), 2);
        assert_eq!(framer.frames().count(), 0);

        framer.feed(b"hi");
        let frames: Vec<Bytes> = framer.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames, vec![Bytes::from_static(b"ghi")]);
    }

    #[test]
    fn test_frames_iterator_stops_after_error() {
        let mut framer = StreamFramer::new();
        framer.feed(b"abc");
        let mut frames = framer.frames();
        assert!(frames.next().unwrap().is_err());
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_take_remaining_and_clear() {
        let mut framer = StreamFramer::with_strategy(Strategy::fixed_length(4));
        framer.feed(b"abcdef");
        framer.try_extract_frame().unwrap();
        assert_eq!(&framer.take_remaining()[..], b"ef");
        assert!(framer.is_empty());

        framer.feed(b"xyz");
        framer.clear();
        assert!(framer.is_empty());
        assert!(framer.strategy().is_some());
    }

    #[test]
    fn test_feed_text_uses_config_encoding() {
        let config = FramerConfig {
            strategy: Some(StrategyConfig::FixedLength {
                length: 4,
                min_bytes: None,
            }),
            encoding: TextEncoding::Latin1,
            limits: FramingLimits::default(),
        };
        let mut framer = StreamFramer::from_config(&config);
        framer.feed_text("café").unwrap();
        assert_eq!(
            &framer.try_extract_frame().unwrap().unwrap()[..],
            &[b'c', b'a', b'f', 0xE9]
        );
        assert!(framer.feed_text("☃").is_err());
        assert!(framer.is_empty());
    }

    #[test]
    fn test_frames_are_exactly_the_fed_bytes() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\n"));
        let input = b"one\ntwo\nthree\nfour";
        let frames = framer.push(input).unwrap();

        let mut rebuilt: Vec<u8> = frames.iter().flat_map(|f| f.iter().copied()).collect();
        rebuilt.extend_from_slice(framer.buffer().as_slice());
        assert_eq!(&rebuilt[..], &input[..]);
    }

    #[test]
    fn test_resumed_scan_finds_split_delimiter() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
        for chunk in [&b"GET / HT"[..], b"TP/1.1", b"\r"] {
            assert!(framer.push(chunk).unwrap().is_empty());
        }
        let frames = framer.push(b"\nHost").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"GET / HTTP/1.1\r\n");

        let frames = framer.push(b": a\r\n").unwrap();
        assert_eq!(&frames[0][..], b"Host: a\r\n");
        assert!(framer.is_empty());
    }

    #[test]
    fn test_resumed_scan_long_delimiter_one_byte_at_a_time() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b"--END--"));
        let input = b"payload-with-dashes---END--tail";

        let mut frames = Vec::new();
        for byte in input.iter() {
            frames.extend(framer.push(&[*byte]).unwrap());
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"payload-with-dashes---END--");
        assert_eq!(framer.buffer().as_slice(), b"tail");
    }

    #[test]
    fn test_scan_waits_for_raised_min_bytes() {
        let strategy = Strategy::delimiter(b"\n").with_min_bytes(4);
        let mut framer = StreamFramer::with_strategy(strategy);
        assert!(framer.push(b"a\nb").unwrap().is_empty());
        let frames = framer.push(b"c").unwrap();
        assert_eq!(&frames[0][..], b"a\n");
    }

    #[test]
    fn test_scan_restarts_after_strategy_change_and_clear() {
        let mut framer = StreamFramer::with_strategy(Strategy::delimiter(b";"));
        assert!(framer.push(b"ab|cd").unwrap().is_empty());

        framer.set_strategy(Strategy::delimiter(b"|"));
        assert_eq!(&framer.push(b"").unwrap()[0][..], b"ab|");

        framer.set_strategy(Strategy::delimiter(b";"));
        assert!(framer.push(b"efgh").unwrap().is_empty());
        framer.clear();
        assert_eq!(&framer.push(b";").unwrap()[0][..], b";");

        assert!(framer.push(b"xyz").unwrap().is_empty());
        assert_eq!(&framer.take_remaining()[..], b"xyz");
        assert_eq!(&framer.push(b"q;").unwrap()[0][..], b"q;");
    }

    #[test]
    fn test_limit_not_applied_below_min_bytes() {
        let limits = FramingLimits {
            initial_capacity: 0,
            max_buffered: 4,
        };
        let mut framer = StreamFramer::with_limits(limits);
        framer.set_strategy(Strategy::fixed_length(8));

        framer.feed(b"ABCDEF");
        assert!(framer.try_extract_frame().unwrap().is_none());
        assert_eq!(framer.len(), 6);

        framer.feed(b"GH");
        assert_eq!(&framer.try_extract_frame().unwrap().unwrap()[..], b"ABCDEFGH");
    }

    #[test]
    fn test_limit_applies_once_min_bytes_reached() {
        let limits = FramingLimits {
            initial_capacity: 0,
            max_buffered: 4,
        };
        let mut framer = StreamFramer::with_limits(limits);
        framer.set_strategy(Strategy::predicate(6, |_| None));

        assert!(framer.push(b"abcde").unwrap().is_empty());
        let err = framer.push(b"f").unwrap_err();
        assert!(matches!(
            err,
            PacketError::FrameTooLarge {
                buffered: 6,
                limit: 4
            }
        ));
    }
}
