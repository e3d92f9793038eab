//! Rolling frame index cache
//!
//! Only a window of the file's index table lives in RAM. Sequential
//! playback walks through the window and refills it with one bounded read
//! when it steps past the end.

use kineto_format::{FrameIndexEntry, VideoHeader, INDEX_ENTRY_SIZE};
use kineto_hal::StorageReader;

use crate::error::PlaybackError;

/// Default number of index entries held in memory
pub const INDEX_CACHE_FRAMES: usize = 50;

/// Window of `N` consecutive index entries
///
/// Entries are kept as raw bytes so a refill is a single read straight into
/// the window.
#[derive(Debug, Clone)]
pub struct FrameIndexCache<const N: usize = INDEX_CACHE_FRAMES> {
    window: [[u8; INDEX_ENTRY_SIZE]; N],
    /// Frame number of `window[0]`
    start: u32,
    /// Valid entries in the window
    len: usize,
    /// Successful refills since creation
    refills: u32,
}

impl<const N: usize> Default for FrameIndexCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameIndexCache<N> {
    const NON_EMPTY: () = assert!(N > 0, "index cache window must hold at least one entry");

    /// Create an empty cache
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            window: [[0; INDEX_ENTRY_SIZE]; N],
            start: 0,
            len: 0,
            refills: 0,
        }
    }

    /// Window capacity in entries
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Check whether `frame` is inside the current window
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && ((frame - self.start) as usize) < self.len
    }

    /// Make sure `frame` is inside the window, refilling it if not
    ///
    /// A refill loads `min(N, frame_count - frame)` entries starting at
    /// `frame` with one storage read. A failed refill leaves the cache
    /// empty.
    pub fn ensure<S: StorageReader>(
        &mut self,
        storage: &mut S,
        path: &str,
        header: &VideoHeader,
        frame: u32,
    ) -> Result<(), PlaybackError> {
        if frame >= header.frame_count {
            return Err(PlaybackError::FrameOutOfRange {
                frame,
                frame_count: header.frame_count,
            });
        }
        if self.contains(frame) {
            return Ok(());
        }

        let count = N.min((header.frame_count - frame) as usize);
        let offset = header
            .index_entry_offset(frame)
            .ok_or(PlaybackError::IndexOverflow { frame })?;
        let bytes = self.window[..count].as_flattened_mut();

        self.len = 0;
        let read = storage.read_range(path, bytes, offset)?;
        if read < bytes.len() {
            return Err(PlaybackError::ShortRead {
                offset,
                expected: bytes.len() as u32,
                actual: read as u32,
            });
        }

        self.start = frame;
        self.len = count;
        self.refills += 1;
        Ok(())
    }

    /// Entry for `frame`, if it is inside the window
    pub fn lookup(&self, frame: u32) -> Option<FrameIndexEntry> {
        if !self.contains(frame) {
            return None;
        }
        Some(FrameIndexEntry::parse(
            &self.window[(frame - self.start) as usize],
        ))
    }

    /// First frame and length of the current window
    pub fn window(&self) -> (u32, usize) {
        (self.start, self.len)
    }

    /// Number of successful refills so far
    pub fn refills(&self) -> u32 {
        self.refills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{video_file, MemoryStorage};
    use proptest::prelude::*;

    const PATH: &str = "/clip.vid";

    fn storage_with_frames(frames: u32) -> (MemoryStorage, VideoHeader) {
        let pixels: Vec<Vec<u16>> = (0..frames).map(|i| vec![i as u16; 4]).collect();
        let bytes = video_file(2, 2, 10, &pixels);
        let header = VideoHeader::parse(&bytes).unwrap();
        (MemoryStorage::with_file(PATH, bytes), header)
    }

    #[test]
    fn test_first_ensure_loads_window() {
        let (mut storage, header) = storage_with_frames(12);
        let mut cache = FrameIndexCache::<5>::new();

        cache.ensure(&mut storage, PATH, &header, 0).unwrap();
        assert_eq!(cache.window(), (0, 5));
        assert_eq!(cache.refills(), 1);
        assert_eq!(storage.range_reads(), 1);

        // Frames inside the window never touch storage
        for frame in 0..5 {
            cache.ensure(&mut storage, PATH, &header, frame).unwrap();
            assert!(cache.lookup(frame).is_some());
        }
        assert_eq!(storage.range_reads(), 1);
    }

    #[test]
    fn test_refill_is_clamped_to_remaining_frames() {
        let (mut storage, header) = storage_with_frames(12);
        let mut cache = FrameIndexCache::<5>::new();

        cache.ensure(&mut storage, PATH, &header, 10).unwrap();
        assert_eq!(cache.window(), (10, 2));
        assert!(cache.lookup(11).is_some());
        assert!(cache.lookup(12).is_none());
        assert!(cache.lookup(9).is_none());
    }

    #[test]
    fn test_lookup_matches_table() {
        let (mut storage, header) = storage_with_frames(3);
        let mut cache = FrameIndexCache::<4>::new();
        cache.ensure(&mut storage, PATH, &header, 0).unwrap();

        let e0 = cache.lookup(0).unwrap();
        let e1 = cache.lookup(1).unwrap();
        assert_eq!(e1.offset, e0.offset + e0.length);
        // Four equal pixels compress to a single run token
        assert_eq!(e0.length, 3);
    }

    #[test]
    fn test_out_of_range() {
        let (mut storage, header) = storage_with_frames(3);
        let mut cache = FrameIndexCache::<4>::new();

        assert_eq!(
            cache.ensure(&mut storage, PATH, &header, 3),
            Err(PlaybackError::FrameOutOfRange {
                frame: 3,
                frame_count: 3
            })
        );
        assert_eq!(storage.range_reads(), 0);
    }

    #[test]
    fn test_short_read_empties_window() {
        let (mut storage, mut header) = storage_with_frames(3);
        let mut cache = FrameIndexCache::<4>::new();
        cache.ensure(&mut storage, PATH, &header, 0).unwrap();

        // Claim more frames than the table holds so frame 5's entry straddles EOF
        header.frame_count = 10;
        header.index_offset = storage.file_len(PATH) as u32 - 4 - 5 * INDEX_ENTRY_SIZE as u32;
        let result = cache.ensure(&mut storage, PATH, &header, 5);

        assert!(matches!(result, Err(PlaybackError::ShortRead { .. })));
        assert_eq!(cache.window().1, 0);
        assert!(cache.lookup(0).is_none());
    }

    #[test]
    fn test_backwards_jump_refills_from_requested_frame() {
        let (mut storage, header) = storage_with_frames(20);
        let mut cache = FrameIndexCache::<8>::new();

        cache.ensure(&mut storage, PATH, &header, 12).unwrap();
        cache.ensure(&mut storage, PATH, &header, 3).unwrap();
        assert_eq!(cache.window(), (3, 8));
        assert_eq!(cache.refills(), 2);
    }

    proptest! {
        #[test]
        fn prop_sequential_access_refill_bound(frames in 1u32..200, step in 1u32..4) {
            let (mut storage, header) = storage_with_frames(frames);
            let mut cache = FrameIndexCache::<7>::new();

            let mut frame = 0;
            while frame < frames {
                cache.ensure(&mut storage, PATH, &header, frame).unwrap();
                prop_assert!(cache.lookup(frame).is_some());
                frame += step;
            }
            prop_assert!(cache.refills() <= frames.div_ceil(7));
        }
    }
}
