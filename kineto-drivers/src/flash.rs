//! Read-only SPI NOR flash volume
//!
//! Videos are flashed at fixed offsets and described by a static table
//! generated at build time; there is no filesystem on the chip. Reads use
//! the plain READ command (0x03, 24-bit address), which every 25-series
//! part supports at the clock rates the bus runs at.

use embedded_hal::spi::{Operation, SpiDevice};
use kineto_hal::{StorageError, StorageReader};

/// Flash command opcodes
pub mod cmd {
    /// Read data bytes
    pub const READ: u8 = 0x03;
    /// Read JEDEC id
    pub const JEDEC_ID: u8 = 0x9F;
}

/// Highest address reachable with 3-byte addressing
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;

/// A named region of the flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashFile {
    pub name: &'static str,
    /// Absolute flash address of the first byte
    pub offset: u32,
    pub len: u32,
}

/// Open file on a [`SpiFlashVolume`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashHandle {
    file: FlashFile,
}

/// [`StorageReader`] over a SPI NOR flash with a static file table
pub struct SpiFlashVolume<SPI> {
    spi: SPI,
    files: &'static [FlashFile],
}

impl<SPI: SpiDevice> SpiFlashVolume<SPI> {
    pub fn new(spi: SPI, files: &'static [FlashFile]) -> Self {
        Self { spi, files }
    }

    pub fn files(&self) -> &'static [FlashFile] {
        self.files
    }

    /// Read the 3-byte JEDEC id (manufacturer, type, capacity)
    pub fn jedec_id(&mut self) -> Result<[u8; 3], StorageError> {
        let mut id = [0u8; 3];
        self.spi
            .transaction(&mut [Operation::Write(&[cmd::JEDEC_ID]), Operation::Read(&mut id)])
            .map_err(|_| StorageError::Io)?;
        Ok(id)
    }

    fn find(&self, path: &str) -> Result<FlashFile, StorageError> {
        self.files
            .iter()
            .find(|f| f.name == path)
            .copied()
            .ok_or(StorageError::NotFound)
    }

    fn read_file(
        &mut self,
        file: &FlashFile,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError> {
        if offset >= file.len {
            return Err(StorageError::OutOfBounds);
        }
        let n = buf.len().min((file.len - offset) as usize);
        if n == 0 {
            return Ok(0);
        }

        let address = file
            .offset
            .checked_add(offset)
            .filter(|a| a.saturating_add(n as u32 - 1) <= MAX_ADDRESS)
            .ok_or(StorageError::OutOfBounds)?;
        let [_, a2, a1, a0] = address.to_be_bytes();

        self.spi
            .transaction(&mut [
                Operation::Write(&[cmd::READ, a2, a1, a0]),
                Operation::Read(&mut buf[..n]),
            ])
            .map_err(|_| StorageError::Io)?;
        Ok(n)
    }
}

impl<SPI: SpiDevice> StorageReader for SpiFlashVolume<SPI> {
    type Handle = FlashHandle;

    fn read_range(
        &mut self,
        path: &str,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError> {
        let file = self.find(path)?;
        self.read_file(&file, buf, offset)
    }

    fn open(&mut self, path: &str) -> Result<Self::Handle, StorageError> {
        Ok(FlashHandle {
            file: self.find(path)?,
        })
    }

    fn read_at(
        &mut self,
        handle: &mut Self::Handle,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError> {
        let file = handle.file;
        self.read_file(&file, buf, offset)
    }

    fn close(&mut self, _handle: Self::Handle) {}
}
