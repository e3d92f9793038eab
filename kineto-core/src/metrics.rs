//! Playback instrumentation
//!
//! Purely observational: nothing in the playback path branches on these
//! values. The caller owns the metrics object and passes it into a session.

/// Accumulated timing and drop statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackMetrics {
    /// Frames fully drawn
    pub frames_played: u32,
    /// Frames that finished more than one interval past their deadline
    pub dropped_frames: u32,
    /// Time spent fetching compressed frames (ms)
    pub read_ms: u64,
    /// Time spent decoding and reordering segments (ms)
    pub transform_ms: u64,
    /// Time spent in display writes (ms)
    pub draw_ms: u64,
    /// Time spent sleeping until deadlines (ms)
    pub wait_ms: u64,
    /// Worst distance past a deadline seen so far (ms)
    pub max_late_ms: u64,
}

impl PlaybackMetrics {
    /// Create zeroed metrics
    pub const fn new() -> Self {
        Self {
            frames_played: 0,
            dropped_frames: 0,
            read_ms: 0,
            transform_ms: 0,
            draw_ms: 0,
            wait_ms: 0,
            max_late_ms: 0,
        }
    }

    /// Zero all counters
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Mean busy time (read + transform + draw) per played frame
    pub fn average_busy_ms(&self) -> u64 {
        if self.frames_played == 0 {
            return 0;
        }
        (self.read_ms + self.transform_ms + self.draw_ms) / self.frames_played as u64
    }
}

/// Summary of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackReport {
    /// Frames drawn in this session
    pub frames_played: u32,
    /// Frames flagged late in this session
    pub dropped_frames: u32,
    /// Wall time from session start to the end of the last wait (ms)
    pub elapsed_ms: u64,
}
