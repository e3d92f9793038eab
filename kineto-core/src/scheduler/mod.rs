//! Playback scheduler
//!
//! Drives a decoder through every frame of a video, handing the shared bus
//! between storage and display and pacing frames against deadlines anchored
//! to the session start.

pub mod pacer;
pub mod player;

pub use pacer::{FramePacer, Pacing};
pub use player::Scheduler;
