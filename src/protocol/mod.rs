//! Protocol module - framing strategies and the stream framer.
//!
//! This module turns a continuous byte stream into discrete frames:
//! - [`Strategy`]: where does a frame end (fixed length, delimiter, predicate)
//! - [`StreamFramer`]: accumulation buffer plus strategy, yields frames
//! - [`FramerConfig`]: serde-backed configuration

mod config;
mod framer;
mod strategy;

pub use config::{
    DelimiterConfig, FramerConfig, FramingLimits, StrategyConfig, DEFAULT_INITIAL_CAPACITY,
    DEFAULT_MAX_BUFFERED,
};
pub use framer::{Frames, StreamFramer};
pub use strategy::{BoundaryFn, LengthWidth, Rule, Strategy, Window};
