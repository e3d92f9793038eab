//! Kineto - RLE video player firmware
//!
//! Main firmware binary for RP2040-based boards with an SPI panel and an
//! SPI NOR flash on the same bus. Streams a pre-encoded video from flash
//! and draws it frame by frame, paced to the file's frame rate.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::{self, Spi};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use kineto_drivers::SharedSpiBus;

mod clock;
mod config;
mod tasks;

use tasks::PlayerBus;

/// SPI clock shared by panel and flash
const SPI_FREQUENCY_HZ: u32 = 32_000_000;

// Working buffers live in .bss, not on the stack
static COMPRESSED: ConstStaticCell<[u8; config::COMPRESSED_BUFFER_BYTES]> =
    ConstStaticCell::new([0; config::COMPRESSED_BUFFER_BYTES]);
static SEGMENT: ConstStaticCell<[u16; config::SEGMENT_BUFFER_PIXELS]> =
    ConstStaticCell::new([0; config::SEGMENT_BUFFER_PIXELS]);

static BUS: StaticCell<PlayerBus> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Kineto firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Pin assignments are board-specific:
    // SCK=GPIO18, MOSI=GPIO19, MISO=GPIO16, flash CS=GPIO17, panel CS=GPIO21, D/C=GPIO20
    let mut spi_config = spi::Config::default();
    spi_config.frequency = SPI_FREQUENCY_HZ;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);

    let flash_cs = Output::new(p.PIN_17, Level::High);
    let panel_cs = Output::new(p.PIN_21, Level::High);
    let dc = Output::new(p.PIN_20, Level::High);

    let bus = match SharedSpiBus::new(spi, flash_cs, panel_cs) {
        Ok(bus) => BUS.init(bus),
        Err(e) => {
            error!("Shared SPI bus setup failed: {}", e);
            return;
        }
    };
    info!("SPI0 initialized at {} Hz", SPI_FREQUENCY_HZ);

    let compressed = COMPRESSED.take();
    let segment = SEGMENT.take();
    info!(
        "Buffers: {} bytes compressed, {} pixels per segment",
        compressed.len(),
        segment.len()
    );

    spawner
        .spawn(tasks::playback_task(bus, dc, compressed, segment))
        .unwrap();
    info!("Playback task spawned");
}
