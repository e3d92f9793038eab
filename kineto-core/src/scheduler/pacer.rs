//! Frame deadlines

/// Outcome of comparing a finished frame against its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pacing {
    /// Finished early; sleep this many milliseconds
    Wait(u64),
    /// Finished at or after the deadline, within one interval
    OnTime,
    /// Finished more than one interval past the deadline
    Late {
        /// Distance past the deadline (ms)
        behind_ms: u64,
    },
}

/// Deadline calculator for one session
///
/// Deadlines are `start + frame * interval`, anchored to the session start
/// so a late frame never pushes back the ones after it. The interval is
/// whole milliseconds, the same spacing the late threshold uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramePacer {
    fps: u8,
    start_ms: u64,
}

impl FramePacer {
    /// Pacer for a session starting at `start_ms`
    ///
    /// An `fps` of 0 is treated as 1.
    pub const fn new(fps: u8, start_ms: u64) -> Self {
        Self {
            fps: if fps == 0 { 1 } else { fps },
            start_ms,
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Nominal frame interval, rounded down
    pub fn interval_ms(&self) -> u64 {
        1000 / self.fps as u64
    }

    /// Absolute deadline of `frame`
    pub fn deadline_ms(&self, frame: u32) -> u64 {
        self.start_ms + frame as u64 * self.interval_ms()
    }

    /// Judge a frame that finished rendering at `now_ms`
    pub fn judge(&self, frame: u32, now_ms: u64) -> Pacing {
        let deadline = self.deadline_ms(frame);
        if now_ms < deadline {
            Pacing::Wait(deadline - now_ms)
        } else if now_ms > deadline + self.interval_ms() {
            Pacing::Late {
                behind_ms: now_ms - deadline,
            }
        } else {
            Pacing::OnTime
        }
    }
}
