//! Display sink abstraction

use core::fmt;

/// Display sink errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transaction with the controller failed
    Communication,
    /// Block does not fit on the panel
    InvalidCoordinates,
    /// Pixel buffer length does not match `width * height`
    BufferMismatch,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Communication => f.write_str("display communication failed"),
            DisplayError::InvalidCoordinates => f.write_str("block outside panel area"),
            DisplayError::BufferMismatch => f.write_str("pixel buffer does not match block size"),
        }
    }
}

/// Destination for decoded pixel blocks
///
/// Pixels arrive in wire order: each `u16` is laid out in memory exactly as
/// the bytes must go out on the bus (big-endian RGB565), so an
/// implementation streams `to_ne_bytes()` of every word without touching it.
pub trait DisplaySink {
    /// Write a `width` x `height` block with its top-left corner at `(x, y)`
    ///
    /// Blocking, no retries. The whole block is written while the caller
    /// holds the bus; an implementation may split it into several
    /// chip-select-framed transfers within that ownership.
    fn write_block(
        &mut self,
        x: u16,
        y: u16,
        pixels: &[u16],
        width: u16,
        height: u16,
    ) -> Result<(), DisplayError>;

    /// Panel dimensions in pixels (width, height)
    fn dimensions(&self) -> (u16, u16);
}
