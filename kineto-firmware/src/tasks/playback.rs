//! Playback task
//!
//! Brings up the panel and flash, then plays the configured video in a
//! loop. Decoding, SPI transfers and the frame wait are all blocking; this
//! task is the only thing running, so nothing else is starved.
//!
//! A failed session is logged and ends playback: the same file would fail
//! the same way again.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Delay, Duration, Timer};
use kineto_core::{
    PlaybackError, PlaybackMetrics, PlaybackReport, PlayerConfig, Scheduler, SessionBuffers,
    StreamDecoder,
};
use kineto_drivers::{BusDevice, PanelConfig, SharedSpiBus, SpiFlashVolume, SpiPanel};
use kineto_hal::BusOwner;

use crate::clock::EmbassyClock;
use crate::config::{self, FLASH_FILES};

/// SPI0 shared by flash (storage chip-select) and panel (display chip-select)
pub type PlayerBus = SharedSpiBus<Spi<'static, SPI0, Blocking>, Output<'static>, Output<'static>>;

type Volume = SpiFlashVolume<BusDevice<'static, Spi<'static, SPI0, Blocking>, Output<'static>, Output<'static>>>;
type Panel = SpiPanel<BusDevice<'static, Spi<'static, SPI0, Blocking>, Output<'static>, Output<'static>>, Output<'static>>;
type PlayerScheduler = Scheduler<&'static PlayerBus, EmbassyClock, Delay>;

/// Pause between loops of the video
const REPLAY_PAUSE: Duration = Duration::from_millis(500);

#[embassy_executor::task]
pub async fn playback_task(
    bus: &'static PlayerBus,
    dc: Output<'static>,
    compressed: &'static mut [u8],
    segment: &'static mut [u16],
) {
    info!("Playback task started");

    let config = config::player_config();
    let mut panel = SpiPanel::new(
        bus.display(),
        dc,
        PanelConfig {
            width: config.screen_width,
            height: config.screen_height,
            ..Default::default()
        },
    );
    let mut volume = SpiFlashVolume::new(bus.storage(), &FLASH_FILES);

    if let Err(e) = bring_up(bus, &mut panel, &mut volume) {
        error!("Hardware bring-up failed: {}", e);
        return;
    }

    let mut scheduler = Scheduler::new(bus, EmbassyClock, Delay);
    let mut metrics = PlaybackMetrics::new();
    let mut session: u32 = 0;

    loop {
        session += 1;
        let result = play_once(
            bus,
            &config,
            &mut volume,
            &mut panel,
            compressed,
            segment,
            &mut scheduler,
            &mut metrics,
        );
        // Open may fail before the scheduler owns the bus
        if let Err(e) = bus.hand_over(BusOwner::Idle) {
            warn!("Bus release after session {} failed: {}", session, e);
        }

        match result {
            Ok(report) => {
                info!(
                    "Session {}: {} frames, {} dropped, {} ms",
                    session, report.frames_played, report.dropped_frames, report.elapsed_ms
                );
                info!(
                    "Totals: read={}ms transform={}ms draw={}ms wait={}ms worst_late={}ms busy/frame={}ms",
                    metrics.read_ms,
                    metrics.transform_ms,
                    metrics.draw_ms,
                    metrics.wait_ms,
                    metrics.max_late_ms,
                    metrics.average_busy_ms()
                );
                if report.dropped_frames > 0 {
                    warn!(
                        "{} of {} frames finished more than one interval late",
                        report.dropped_frames, report.frames_played
                    );
                }
                if report.frames_played == 0 {
                    warn!("Video has no frames, stopping");
                    return;
                }
            }
            Err(e) => {
                error!("Session {} failed: {}", session, e);
                return;
            }
        }

        Timer::after(REPLAY_PAUSE).await;
    }
}

/// Initialise the panel and probe the flash
fn bring_up(
    bus: &'static PlayerBus,
    panel: &mut Panel,
    volume: &mut Volume,
) -> Result<(), PlaybackError> {
    bus.hand_over(BusOwner::Display)?;
    panel.init(&mut Delay)?;
    info!("Panel initialised");

    bus.hand_over(BusOwner::Storage)?;
    let id = volume.jedec_id()?;
    info!("Flash JEDEC id: {:02x}", id);

    bus.hand_over(BusOwner::Idle)?;
    Ok(())
}

/// Open the video and play it through once
#[allow(clippy::too_many_arguments)]
fn play_once(
    bus: &'static PlayerBus,
    config: &PlayerConfig,
    volume: &mut Volume,
    panel: &mut Panel,
    compressed: &mut [u8],
    segment: &mut [u16],
    scheduler: &mut PlayerScheduler,
    metrics: &mut PlaybackMetrics,
) -> Result<PlaybackReport, PlaybackError> {
    bus.hand_over(BusOwner::Storage)?;
    let buffers = SessionBuffers {
        compressed,
        segment,
    };
    let mut decoder =
        StreamDecoder::<_, _>::open(volume, panel, config.video_path.as_str(), buffers)?;

    let header = *decoder.header();
    let (x, y) = config.centered_origin(&header);
    info!(
        "Playing {}: {}x{} @ {} fps, {} frames, {} rows/segment, origin ({}, {})",
        config.video_path.as_str(),
        header.width,
        header.height,
        header.fps,
        header.frame_count,
        decoder.layout().rows_per_segment(),
        x,
        y
    );

    scheduler.run(&mut decoder, x, y, metrics)
}
