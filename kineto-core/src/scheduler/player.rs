//! Playback loop
//!
//! The only place bus ownership changes and the only component that ends a
//! session. Each frame:
//!
//! 1. Hand the bus to storage and fetch the compressed frame
//! 2. Hand the bus to the display and draw every segment
//! 3. Judge the finish time against the frame's deadline: sleep if early,
//!    count a dropped frame if more than one interval late
//!
//! Late frames are still drawn; nothing is ever skipped. Any error aborts the
//! session, and the bus is returned to idle on every exit path.

use embedded_hal::delay::DelayNs;
use kineto_hal::{BusArbiter, BusOwner, Clock, DisplaySink, StorageReader};

use super::pacer::{FramePacer, Pacing};
use crate::decoder::StreamDecoder;
use crate::error::PlaybackError;
use crate::metrics::{PlaybackMetrics, PlaybackReport};

/// Frame scheduler owning the bus arbiter, clock and delay provider
pub struct Scheduler<B, C, T> {
    bus: B,
    clock: C,
    delay: T,
}

impl<B, C, T> Scheduler<B, C, T>
where
    B: BusArbiter,
    C: Clock,
    T: DelayNs,
{
    pub fn new(bus: B, clock: C, delay: T) -> Self {
        Self { bus, clock, delay }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_parts(self) -> (B, C, T) {
        (self.bus, self.clock, self.delay)
    }

    /// Play every frame of `decoder`'s video at `(x, y)`
    ///
    /// Deadlines are anchored to the time this call starts. `metrics` keeps
    /// accumulating across sessions; the returned report covers only this one.
    pub fn run<S, D, const N: usize>(
        &mut self,
        decoder: &mut StreamDecoder<'_, S, D, N>,
        x: u16,
        y: u16,
        metrics: &mut PlaybackMetrics,
    ) -> Result<PlaybackReport, PlaybackError>
    where
        S: StorageReader,
        D: DisplaySink,
    {
        let result = self.play_all(decoder, x, y, metrics);
        let released = self.bus.release();
        let report = result?;
        released?;
        Ok(report)
    }

    fn play_all<S, D, const N: usize>(
        &mut self,
        decoder: &mut StreamDecoder<'_, S, D, N>,
        x: u16,
        y: u16,
        metrics: &mut PlaybackMetrics,
    ) -> Result<PlaybackReport, PlaybackError>
    where
        S: StorageReader,
        D: DisplaySink,
    {
        let header = *decoder.header();
        let pacer = FramePacer::new(header.fps, self.clock.now_ms());
        let mut report = PlaybackReport {
            frames_played: 0,
            dropped_frames: 0,
            elapsed_ms: 0,
        };

        for frame in 0..header.frame_count {
            self.bus.hand_over(BusOwner::Storage)?;
            let t0 = self.clock.now_ms();
            decoder.fetch(frame)?;
            metrics.read_ms += self.clock.now_ms().saturating_sub(t0);

            self.bus.hand_over(BusOwner::Display)?;
            decoder.render_timed(x, y, &self.clock, metrics)?;
            report.frames_played += 1;
            metrics.frames_played += 1;

            let now = self.clock.now_ms();
            let late = now.saturating_sub(pacer.deadline_ms(frame));
            metrics.max_late_ms = metrics.max_late_ms.max(late);

            match pacer.judge(frame, now) {
                Pacing::Wait(ms) => {
                    self.delay.delay_ms(ms.min(u32::MAX as u64) as u32);
                    metrics.wait_ms += ms;
                }
                Pacing::OnTime => {}
                Pacing::Late { .. } => {
                    report.dropped_frames += 1;
                    metrics.dropped_frames += 1;
                }
            }
        }

        report.elapsed_ms = self.clock.now_ms().saturating_sub(pacer.start_ms());
        Ok(report)
    }
}
