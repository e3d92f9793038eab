//! Kineto Video Container Format
//!
//! This crate defines the on-disk layout of a Kineto video and the
//! run-length pixel codec its frames are compressed with. Everything here
//! is pure byte-buffer work so it can be shared by the firmware and by
//! host-side tools.
//!
//! # File Layout
//!
//! ```text
//! ┌────────────┬──────────────────────────┬─────────┬─────────┬─────┐
//! │ HEADER     │ INDEX TABLE              │ FRAME 0 │ FRAME 1 │ ... │
//! │ 20B        │ frame_count × 8B         │ RLE     │ RLE     │     │
//! └────────────┴──────────────────────────┴─────────┴─────────┴─────┘
//! ```
//!
//! Each index entry is `{offset: u32, length: u32}` pointing at one
//! compressed frame. All integers are little-endian.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod header;
pub mod pixel;
pub mod rle;
#[cfg(feature = "std")]
pub mod writer;

pub use header::{
    FormatError, FrameIndexEntry, VideoHeader, COMPRESSION_RLE, HEADER_SIZE, INDEX_ENTRY_SIZE,
    MAGIC,
};
pub use pixel::{rgb888_to_rgb565, to_wire_order};
pub use rle::{
    decode_all, decode_segment, encode, max_encoded_len, size_of_decoded, CodecError,
    SegmentCursor,
};
#[cfg(feature = "std")]
pub use writer::ContainerWriter;
