//! Container header and frame index entries.
//!
//! Header format (20 bytes, little-endian):
//! - MAGIC (4 bytes): `VID0`
//! - FRAME COUNT (4 bytes)
//! - WIDTH (2 bytes), HEIGHT (2 bytes): pixels
//! - FPS (1 byte)
//! - COMPRESSION (1 byte): only [`COMPRESSION_RLE`] is defined
//! - RESERVED (2 bytes): ignored on read, written as zero
//! - INDEX OFFSET (4 bytes): 0 means "directly after the header"

use core::fmt;

/// Format tag at the start of every file
pub const MAGIC: [u8; 4] = *b"VID0";

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 20;

/// Size of one frame index entry in bytes
pub const INDEX_ENTRY_SIZE: usize = 8;

/// Compression id of the run-length scheme in [`crate::rle`]
pub const COMPRESSION_RLE: u8 = 1;

/// Errors that can occur while parsing a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Fewer bytes than the structure needs
    Truncated,
    /// Format tag is not [`MAGIC`]
    BadMagic([u8; 4]),
    /// Compression id other than [`COMPRESSION_RLE`]
    UnsupportedCompression(u8),
    /// Width or height is zero
    InvalidDimensions { width: u16, height: u16 },
    /// Frame rate is zero
    InvalidFrameRate,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Truncated => f.write_str("truncated header"),
            FormatError::BadMagic(tag) => write!(f, "bad format tag {:02x?}", tag),
            FormatError::UnsupportedCompression(id) => {
                write!(f, "unsupported compression id {}", id)
            }
            FormatError::InvalidDimensions { width, height } => {
                write!(f, "invalid frame size {}x{}", width, height)
            }
            FormatError::InvalidFrameRate => f.write_str("frame rate is zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}

/// Parsed video header
///
/// Immutable once parsed; a header that exists has passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VideoHeader {
    /// Total frames in the file
    pub frame_count: u32,
    /// Pixels per row
    pub width: u16,
    /// Rows per frame
    pub height: u16,
    /// Target playback rate
    pub fps: u8,
    /// Codec id (always [`COMPRESSION_RLE`] after parsing)
    pub compression: u8,
    /// Byte offset of the frame index table
    pub index_offset: u32,
}

impl VideoHeader {
    /// Header for a new RLE file with the index directly after the header
    pub const fn new(frame_count: u32, width: u16, height: u16, fps: u8) -> Self {
        Self {
            frame_count,
            width,
            height,
            fps,
            compression: COMPRESSION_RLE,
            index_offset: HEADER_SIZE as u32,
        }
    }

    /// Parse and validate a header from the first bytes of a file
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated);
        }

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }

        let frame_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let width = u16::from_le_bytes([bytes[8], bytes[9]]);
        let height = u16::from_le_bytes([bytes[10], bytes[11]]);
        let fps = bytes[12];
        let compression = bytes[13];
        // bytes[14..16] reserved
        let index_offset = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);

        if compression != COMPRESSION_RLE {
            return Err(FormatError::UnsupportedCompression(compression));
        }
        if width == 0 || height == 0 {
            return Err(FormatError::InvalidDimensions { width, height });
        }
        if fps == 0 {
            return Err(FormatError::InvalidFrameRate);
        }

        Ok(Self {
            frame_count,
            width,
            height,
            fps,
            compression,
            index_offset: if index_offset == 0 {
                HEADER_SIZE as u32
            } else {
                index_offset
            },
        })
    }

    /// Encode this header
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.frame_count.to_le_bytes());
        out[8..10].copy_from_slice(&self.width.to_le_bytes());
        out[10..12].copy_from_slice(&self.height.to_le_bytes());
        out[12] = self.fps;
        out[13] = self.compression;
        out[16..20].copy_from_slice(&self.index_offset.to_le_bytes());
        out
    }

    /// Decoded pixels in one frame
    pub fn pixels_per_frame(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// File offset of the index entry for `frame`
    ///
    /// `None` if the position does not fit a 32-bit file offset.
    pub fn index_entry_offset(&self, frame: u32) -> Option<u32> {
        let pos = self.index_offset as u64 + frame as u64 * INDEX_ENTRY_SIZE as u64;
        u32::try_from(pos).ok()
    }
}

/// Locator for one compressed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameIndexEntry {
    /// Byte offset of the compressed payload
    pub offset: u32,
    /// Compressed payload length in bytes
    pub length: u32,
}

impl FrameIndexEntry {
    /// Parse one entry
    pub fn parse(bytes: &[u8; INDEX_ENTRY_SIZE]) -> Self {
        Self {
            offset: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Encode this entry
    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut out = [0u8; INDEX_ENTRY_SIZE];
        out[0..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out
    }
}
