//! Board-agnostic playback engine for Kineto videos
//!
//! This crate contains everything between "a file on storage" and "pixels
//! on the panel" that does not depend on a specific board:
//!
//! - Frame index cache (rolling window over the file's frame directory)
//! - Segmented stream decoder (bounded-memory fetch/decode/transfer)
//! - Playback scheduler (bus handoff, deadline pacing, drop accounting)
//! - Player configuration
//!
//! It runs single-threaded and allocation-free: every buffer is borrowed
//! from the caller for the length of one playback session.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod decoder;
pub mod error;
pub mod index;
pub mod metrics;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use config::PlayerConfig;
pub use decoder::{SegmentLayout, SegmentSpan, SessionBuffers, StreamDecoder};
pub use error::{ConfigError, PlaybackError};
pub use index::{FrameIndexCache, INDEX_CACHE_FRAMES};
pub use metrics::{PlaybackMetrics, PlaybackReport};
pub use scheduler::{FramePacer, Pacing, Scheduler};
