//! Playback errors
//!
//! Every variant here ends the session; lateness is reported through
//! [`crate::metrics::PlaybackMetrics`] instead.

use core::fmt;

use kineto_format::FormatError;
use kineto_hal::{BusError, DisplayError, StorageError};

/// Configuration errors detected before or at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Segment buffer cannot hold a single row of the video
    SegmentTooSmall { width: u16, capacity_pixels: u32 },
    /// A buffer budget is zero
    ZeroBuffer,
    /// Segment byte budget is not a whole number of pixels
    OddSegmentBudget,
    /// Video path is empty
    EmptyPath,
    /// Video would be drawn past the 16-bit coordinate range
    OriginOutOfRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::SegmentTooSmall {
                width,
                capacity_pixels,
            } => write!(
                f,
                "segment buffer of {} pixels cannot hold a {}-pixel row",
                capacity_pixels, width
            ),
            ConfigError::ZeroBuffer => f.write_str("buffer budget is zero"),
            ConfigError::OddSegmentBudget => f.write_str("segment budget is not a multiple of 2"),
            ConfigError::EmptyPath => f.write_str("video path is empty"),
            ConfigError::OriginOutOfRange => f.write_str("draw origin out of range"),
        }
    }
}

/// Fatal playback errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// Header rejected at open
    Format(FormatError),
    /// Buffers or origin unusable for this video
    Config(ConfigError),
    /// Storage read, open or seek failed
    Storage(StorageError),
    /// Display sink rejected a block
    Display(DisplayError),
    /// Bus handover failed
    Bus(BusError),
    /// Storage returned fewer bytes than requested
    ShortRead { offset: u32, expected: u32, actual: u32 },
    /// Frame number at or beyond the frame count
    FrameOutOfRange { frame: u32, frame_count: u32 },
    /// Index table position does not fit a 32-bit offset
    IndexOverflow { frame: u32 },
    /// Compressed frame larger than the compressed buffer
    FrameTooLarge { frame: u32, length: u32, capacity: u32 },
    /// Segment decoded to the wrong number of pixels
    Corrupt {
        frame: u32,
        segment: u16,
        expected: u32,
        decoded: u32,
    },
    /// Render requested before any frame was fetched
    NoFrameLoaded,
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Format(e) => write!(f, "format error: {}", e),
            PlaybackError::Config(e) => write!(f, "config error: {}", e),
            PlaybackError::Storage(e) => write!(f, "storage error: {}", e),
            PlaybackError::Display(e) => write!(f, "display error: {}", e),
            PlaybackError::Bus(e) => write!(f, "bus error: {}", e),
            PlaybackError::ShortRead {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "short read at offset {}: {} of {} bytes",
                offset, actual, expected
            ),
            PlaybackError::FrameOutOfRange { frame, frame_count } => {
                write!(f, "frame {} out of range ({} frames)", frame, frame_count)
            }
            PlaybackError::IndexOverflow { frame } => {
                write!(f, "index entry for frame {} beyond 4 GiB", frame)
            }
            PlaybackError::FrameTooLarge {
                frame,
                length,
                capacity,
            } => write!(
                f,
                "frame {} is {} bytes, buffer holds {}",
                frame, length, capacity
            ),
            PlaybackError::Corrupt {
                frame,
                segment,
                expected,
                decoded,
            } => write!(
                f,
                "frame {} segment {} decoded {} of {} pixels",
                frame, segment, decoded, expected
            ),
            PlaybackError::NoFrameLoaded => f.write_str("no frame loaded"),
        }
    }
}

impl From<FormatError> for PlaybackError {
    fn from(e: FormatError) -> Self {
        PlaybackError::Format(e)
    }
}

impl From<ConfigError> for PlaybackError {
    fn from(e: ConfigError) -> Self {
        PlaybackError::Config(e)
    }
}

impl From<StorageError> for PlaybackError {
    fn from(e: StorageError) -> Self {
        PlaybackError::Storage(e)
    }
}

impl From<DisplayError> for PlaybackError {
    fn from(e: DisplayError) -> Self {
        PlaybackError::Display(e)
    }
}

impl From<BusError> for PlaybackError {
    fn from(e: BusError) -> Self {
        PlaybackError::Bus(e)
    }
}
