//! MIPI-DCS SPI panel
//!
//! Works with the common 4-wire SPI controllers (ILI9341, ST7789, ILI9488
//! in 16-bit mode). A D/C pin selects command (low) or data (high).
//!
//! Drawing a block is CASET + RASET to open an address window, then RAMWR
//! followed by the pixel stream. Pixels arrive already in wire order, so
//! each `u16` goes out as its in-memory bytes.
//!
//! The D/C pin has to change between a command byte and its parameters, so
//! a block is not one SPI transaction: every command byte, parameter list
//! and pixel chunk is its own chip-select-framed write. A block costs
//! 5 + (pixel chunks) transactions, all inside one display bus ownership.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use kineto_hal::{DisplayError, DisplaySink};

/// MIPI-DCS command opcodes
pub mod dcs {
    /// Software reset
    pub const SWRESET: u8 = 0x01;
    /// Exit sleep mode
    pub const SLPOUT: u8 = 0x11;
    /// Display inversion on
    pub const INVON: u8 = 0x21;
    /// Display on
    pub const DISPON: u8 = 0x29;
    /// Column address set
    pub const CASET: u8 = 0x2A;
    /// Row address set
    pub const RASET: u8 = 0x2B;
    /// Memory write
    pub const RAMWR: u8 = 0x2C;
    /// Memory access control (orientation, RGB/BGR)
    pub const MADCTL: u8 = 0x36;
    /// Interface pixel format
    pub const COLMOD: u8 = 0x3A;
}

/// COLMOD value for 16 bits per pixel
const PIXEL_FORMAT_RGB565: u8 = 0x55;

/// Bytes staged per bulk write
pub const CHUNK_BYTES: usize = 512;

/// How pixel data is pushed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    /// Stage pixels into a chunk buffer and write whole chunks
    #[default]
    Bulk,
    /// One two-byte write per pixel, for buses without bulk transfers
    PerPixel,
}

/// Panel geometry and controller options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
    /// MADCTL value (orientation and colour order)
    pub madctl: u8,
    /// Send INVON during init (most ST7789 modules need it)
    pub invert: bool,
    pub mode: TransferMode,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            madctl: 0x48,
            invert: false,
            mode: TransferMode::Bulk,
        }
    }
}

/// [`DisplaySink`] for a MIPI-DCS controller on SPI
pub struct SpiPanel<SPI, DC> {
    spi: SPI,
    dc: DC,
    config: PanelConfig,
    chunk: [u8; CHUNK_BYTES],
}

impl<SPI, DC> SpiPanel<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, config: PanelConfig) -> Self {
        Self {
            spi,
            dc,
            config,
            chunk: [0; CHUNK_BYTES],
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Minimal power-up sequence: reset, wake, 16-bit colour, display on
    ///
    /// Needs the bus for the whole sequence.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.command(dcs::SWRESET, &[])?;
        delay.delay_ms(120);
        self.command(dcs::SLPOUT, &[])?;
        delay.delay_ms(120);
        self.command(dcs::COLMOD, &[PIXEL_FORMAT_RGB565])?;
        self.command(dcs::MADCTL, &[self.config.madctl])?;
        if self.config.invert {
            self.command(dcs::INVON, &[])?;
        }
        self.command(dcs::DISPON, &[])?;
        delay.delay_ms(20);
        Ok(())
    }

    /// Send a command byte followed by its parameters
    pub fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|_| DisplayError::Communication)?;
        self.spi
            .write(&[cmd])
            .map_err(|_| DisplayError::Communication)?;
        self.dc.set_high().map_err(|_| DisplayError::Communication)?;
        if !params.is_empty() {
            self.spi
                .write(params)
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    /// Open the address window `[x0, x1] x [y0, y1]` (inclusive)
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        let [xs_hi, xs_lo] = x0.to_be_bytes();
        let [xe_hi, xe_lo] = x1.to_be_bytes();
        self.command(dcs::CASET, &[xs_hi, xs_lo, xe_hi, xe_lo])?;
        let [ys_hi, ys_lo] = y0.to_be_bytes();
        let [ye_hi, ye_lo] = y1.to_be_bytes();
        self.command(dcs::RASET, &[ys_hi, ys_lo, ye_hi, ye_lo])
    }

    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        match self.config.mode {
            TransferMode::Bulk => {
                for group in pixels.chunks(CHUNK_BYTES / 2) {
                    for (dst, px) in self.chunk.chunks_exact_mut(2).zip(group) {
                        dst.copy_from_slice(&px.to_ne_bytes());
                    }
                    self.spi
                        .write(&self.chunk[..group.len() * 2])
                        .map_err(|_| DisplayError::Communication)?;
                }
            }
            TransferMode::PerPixel => {
                for px in pixels {
                    self.spi
                        .write(&px.to_ne_bytes())
                        .map_err(|_| DisplayError::Communication)?;
                }
            }
        }
        Ok(())
    }
}

impl<SPI, DC> DisplaySink for SpiPanel<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    fn write_block(
        &mut self,
        x: u16,
        y: u16,
        pixels: &[u16],
        width: u16,
        height: u16,
    ) -> Result<(), DisplayError> {
        if pixels.len() != width as usize * height as usize {
            return Err(DisplayError::BufferMismatch);
        }
        if width == 0 || height == 0 {
            return Ok(());
        }
        let x1 = x as u32 + width as u32 - 1;
        let y1 = y as u32 + height as u32 - 1;
        if x1 >= self.config.width as u32 || y1 >= self.config.height as u32 {
            return Err(DisplayError::InvalidCoordinates);
        }

        self.set_window(x, y, x1 as u16, y1 as u16)?;
        self.command(dcs::RAMWR, &[])?;
        self.write_pixels(pixels)
    }

    fn dimensions(&self) -> (u16, u16) {
        (self.config.width, self.config.height)
    }
}
