//! Player configuration
//!
//! The firmware embeds this as TOML and validates it at build time.

use heapless::String;
use kineto_format::VideoHeader;

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum video path length
pub const MAX_PATH_LEN: usize = 64;

/// Default compressed-frame buffer budget
pub const DEFAULT_COMPRESSED_BYTES: u32 = 100 * 1024;

/// Default segment buffer budget
pub const DEFAULT_SEGMENT_BYTES: u32 = 100 * 1024;

/// Player configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Path of the video on storage
    pub video_path: String<MAX_PATH_LEN>,
    /// Panel width in pixels
    pub screen_width: u16,
    /// Panel height in pixels
    pub screen_height: u16,
    /// Largest compressed frame the player accepts (bytes)
    pub compressed_buffer_bytes: u32,
    /// Decoded segment budget (bytes, two per pixel)
    pub segment_buffer_bytes: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let mut video_path = String::new();
        let _ = video_path.push_str("/video.vid");
        Self {
            video_path,
            screen_width: 240,
            screen_height: 320,
            compressed_buffer_bytes: DEFAULT_COMPRESSED_BYTES,
            segment_buffer_bytes: DEFAULT_SEGMENT_BYTES,
        }
    }
}

impl PlayerConfig {
    /// Check the configuration for values the player cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video_path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.compressed_buffer_bytes == 0 || self.segment_buffer_bytes == 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        if self.segment_buffer_bytes % 2 != 0 {
            return Err(ConfigError::OddSegmentBudget);
        }
        Ok(())
    }

    /// Segment buffer capacity in pixels
    pub fn segment_pixels(&self) -> usize {
        self.segment_buffer_bytes as usize / 2
    }

    /// Origin that centers the video on the screen
    ///
    /// An axis where the video is larger than the screen starts at 0.
    pub fn centered_origin(&self, header: &VideoHeader) -> (u16, u16) {
        (
            self.screen_width.saturating_sub(header.width) / 2,
            self.screen_height.saturating_sub(header.height) / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.segment_pixels(), 51_200);
    }

    #[test]
    fn test_validation() {
        let mut config = PlayerConfig::default();
        config.segment_buffer_bytes = 1001;
        assert_eq!(config.validate(), Err(ConfigError::OddSegmentBudget));

        config.segment_buffer_bytes = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBuffer));

        config = PlayerConfig::default();
        config.video_path.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPath));
    }

    #[test]
    fn test_centered_origin() {
        let config = PlayerConfig::default();

        let header = VideoHeader::new(1, 240, 180, 30);
        assert_eq!(config.centered_origin(&header), (0, 70));

        let header = VideoHeader::new(1, 100, 400, 30);
        assert_eq!(config.centered_origin(&header), (70, 0));
    }

    #[test]
    fn test_parse_toml() {
        let config: PlayerConfig = toml::from_str(
            r#"
            video_path = "/bad_apple.vid"
            segment_buffer_bytes = 32768
            "#,
        )
        .unwrap();

        assert_eq!(config.video_path.as_str(), "/bad_apple.vid");
        assert_eq!(config.segment_buffer_bytes, 32768);
        assert_eq!(config.screen_width, 240);
        assert_eq!(config.validate(), Ok(()));
    }
}
