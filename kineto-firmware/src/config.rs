//! Player configuration
//!
//! The values come from player.toml, validated and turned into constants
//! by build.rs.

use heapless::String;
use kineto_core::PlayerConfig;
use kineto_drivers::FlashFile;

include!(concat!(env!("OUT_DIR"), "/player_config.rs"));

/// Rebuild the validated configuration from the generated constants
pub fn player_config() -> PlayerConfig {
    let mut video_path = String::new();
    // Length already checked by build.rs
    let _ = video_path.push_str(VIDEO_PATH);
    PlayerConfig {
        video_path,
        screen_width: SCREEN_WIDTH,
        screen_height: SCREEN_HEIGHT,
        compressed_buffer_bytes: COMPRESSED_BUFFER_BYTES as u32,
        segment_buffer_bytes: (SEGMENT_BUFFER_PIXELS * 2) as u32,
    }
}
