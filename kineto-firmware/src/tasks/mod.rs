//! Embassy tasks

pub mod playback;

pub use playback::{playback_task, PlayerBus};
