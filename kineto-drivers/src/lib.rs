//! Hardware driver implementations
//!
//! Concrete implementations of the kineto-hal traits on top of
//! `embedded-hal` 1.0 SPI and GPIO:
//!
//! - Shared SPI bus with explicit storage/display ownership
//! - MIPI-DCS panel controllers (ILI9341, ST7789 and friends)
//! - Read-only SPI NOR flash volume with a static file table

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod flash;
pub mod panel;

#[cfg(test)]
mod mock;

pub use bus::{BusDevice, DeviceError, SharedSpiBus};
pub use flash::{FlashFile, FlashHandle, SpiFlashVolume};
pub use panel::{PanelConfig, SpiPanel, TransferMode};
