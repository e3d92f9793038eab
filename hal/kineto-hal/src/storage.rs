//! Storage reader abstractions
//!
//! Provides the file-read interface the player consumes. Implementations
//! sit on top of whatever block device the board has (SPI NOR flash,
//! SD card, an in-memory image on the host).

use core::fmt;

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No file with the requested name
    NotFound,
    /// Offset lies at or beyond the end of the file
    OutOfBounds,
    /// Underlying device or bus transaction failed
    Io,
    /// The handle was closed or never opened
    NotOpen,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound => f.write_str("file not found"),
            StorageError::OutOfBounds => f.write_str("offset beyond end of file"),
            StorageError::Io => f.write_str("storage I/O failure"),
            StorageError::NotOpen => f.write_str("file not open"),
        }
    }
}

/// Storage reader trait
///
/// All operations are blocking. A read returns the number of bytes
/// actually placed in the buffer; a value smaller than the buffer length
/// means the file ended first. Callers decide whether a short read is fatal.
pub trait StorageReader {
    /// Handle for a file opened for sequential reading
    type Handle;

    /// Read `buf.len()` bytes starting at `offset` of the file at `path`
    ///
    /// Opens and closes the file internally. Used for one-off reads
    /// (header, index table windows).
    fn read_range(&mut self, path: &str, buf: &mut [u8], offset: u32)
        -> Result<usize, StorageError>;

    /// Open a file for repeated reads
    fn open(&mut self, path: &str) -> Result<Self::Handle, StorageError>;

    /// Read `buf.len()` bytes at `offset` through an open handle
    fn read_at(
        &mut self,
        handle: &mut Self::Handle,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError>;

    /// Close a handle previously returned by [`StorageReader::open`]
    fn close(&mut self, handle: Self::Handle);
}
