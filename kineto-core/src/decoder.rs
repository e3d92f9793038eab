//! Segmented stream decoder
//!
//! Plays one frame at a time through two fixed buffers: the whole
//! compressed frame is fetched into the compressed buffer, then decoded a
//! band of rows at a time into the segment buffer and handed to the
//! display. No full decoded frame ever exists in memory.
//!
//! Per frame:
//! 1. Resolve the index entry through the rolling cache
//! 2. Reject entries larger than the compressed buffer
//! 3. Fetch the compressed bytes with one read through the open handle
//! 4. Decode, reorder and draw each segment; a segment that decodes to the
//!    wrong pixel count stops the frame before it reaches the display
//!
//! A failure part way through a frame leaves the earlier segments on the
//! panel. There is no second buffer to stage a clean redraw from.

use kineto_format::{
    to_wire_order, FrameIndexEntry, FormatError, SegmentCursor, VideoHeader, HEADER_SIZE,
};
use kineto_hal::{Clock, DisplaySink, StorageError, StorageReader};

use crate::error::{ConfigError, PlaybackError};
use crate::index::{FrameIndexCache, INDEX_CACHE_FRAMES};
use crate::metrics::PlaybackMetrics;

/// Caller-owned working memory for one session
pub struct SessionBuffers<'a> {
    /// Holds one compressed frame; its length is the largest frame accepted
    pub compressed: &'a mut [u8],
    /// Holds one decoded segment; its length fixes the segment height
    pub segment: &'a mut [u16],
}

/// How a frame is cut into horizontal bands
///
/// Fixed for the whole session: every segment has the same height except
/// possibly the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentLayout {
    width: u16,
    height: u16,
    rows_per_segment: u16,
}

impl SegmentLayout {
    /// Largest band of whole rows that fits `capacity_pixels`
    ///
    /// Clamped to the frame height. A capacity that cannot hold one row is a
    /// configuration error.
    pub fn new(width: u16, height: u16, capacity_pixels: usize) -> Result<Self, ConfigError> {
        let rows = match width {
            0 => 0,
            w => (capacity_pixels / w as usize).min(height as usize) as u16,
        };
        if rows == 0 {
            return Err(ConfigError::SegmentTooSmall {
                width,
                capacity_pixels: capacity_pixels.min(u32::MAX as usize) as u32,
            });
        }
        Ok(Self {
            width,
            height,
            rows_per_segment: rows,
        })
    }

    pub fn rows_per_segment(&self) -> u16 {
        self.rows_per_segment
    }

    /// `ceil(height / rows_per_segment)`
    pub fn segment_count(&self) -> u16 {
        self.height.div_ceil(self.rows_per_segment)
    }

    /// Pixels in a full-height segment
    pub fn segment_pixels(&self) -> usize {
        self.rows_per_segment as usize * self.width as usize
    }

    /// Segments of one frame, top to bottom
    pub fn segments(self) -> Segments {
        Segments {
            layout: self,
            index: 0,
            next_row: 0,
        }
    }
}

/// One band of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentSpan {
    pub index: u16,
    pub start_row: u16,
    pub rows: u16,
    /// First pixel of the band within the frame
    pub start_pixel: usize,
    pub pixel_count: usize,
}

/// Iterator over the segments of a frame
#[derive(Debug, Clone)]
pub struct Segments {
    layout: SegmentLayout,
    index: u16,
    next_row: u16,
}

impl Iterator for Segments {
    type Item = SegmentSpan;

    fn next(&mut self) -> Option<SegmentSpan> {
        let layout = &self.layout;
        if self.next_row >= layout.height {
            return None;
        }
        let rows = layout.rows_per_segment.min(layout.height - self.next_row);
        let span = SegmentSpan {
            index: self.index,
            start_row: self.next_row,
            rows,
            start_pixel: self.next_row as usize * layout.width as usize,
            pixel_count: rows as usize * layout.width as usize,
        };
        self.index += 1;
        self.next_row += rows;
        Some(span)
    }
}

#[derive(Debug, Clone, Copy)]
struct LoadedFrame {
    frame: u32,
    length: usize,
}

/// Clock for untimed rendering
struct NoClock;

impl Clock for NoClock {
    fn now_ms(&self) -> u64 {
        0
    }
}

/// Frame-by-frame decoder for one open video
///
/// Borrows storage, display and buffers for the length of the session.
/// The sequential-read handle is closed when the decoder is dropped, on
/// every exit path.
pub struct StreamDecoder<'a, S, D, const N: usize = INDEX_CACHE_FRAMES>
where
    S: StorageReader,
    D: DisplaySink,
{
    storage: &'a mut S,
    display: &'a mut D,
    path: &'a str,
    handle: Option<S::Handle>,
    header: VideoHeader,
    index: FrameIndexCache<N>,
    compressed: &'a mut [u8],
    segment: &'a mut [u16],
    layout: SegmentLayout,
    loaded: Option<LoadedFrame>,
}

impl<'a, S, D, const N: usize> StreamDecoder<'a, S, D, N>
where
    S: StorageReader,
    D: DisplaySink,
{
    /// Open `path` and prepare a playback session
    ///
    /// Reads and validates the header, derives the segment layout from the
    /// segment buffer, warms the index cache with frame 0 and opens the
    /// file for sequential reads. Nothing is left open on failure.
    pub fn open(
        storage: &'a mut S,
        display: &'a mut D,
        path: &'a str,
        buffers: SessionBuffers<'a>,
    ) -> Result<Self, PlaybackError> {
        let mut raw = [0u8; HEADER_SIZE];
        let read = storage.read_range(path, &mut raw, 0)?;
        if read < HEADER_SIZE {
            return Err(FormatError::Truncated.into());
        }
        let header = VideoHeader::parse(&raw)?;

        if buffers.compressed.is_empty() {
            return Err(ConfigError::ZeroBuffer.into());
        }
        let layout = SegmentLayout::new(header.width, header.height, buffers.segment.len())?;

        let mut index = FrameIndexCache::new();
        if header.frame_count > 0 {
            index.ensure(storage, path, &header, 0)?;
        }

        let handle = storage.open(path)?;

        Ok(Self {
            storage,
            display,
            path,
            handle: Some(handle),
            header,
            index,
            compressed: buffers.compressed,
            segment: buffers.segment,
            layout,
            loaded: None,
        })
    }

    pub fn header(&self) -> &VideoHeader {
        &self.header
    }

    pub fn layout(&self) -> SegmentLayout {
        self.layout
    }

    pub fn index(&self) -> &FrameIndexCache<N> {
        &self.index
    }

    /// Resolve, bound-check and read frame `frame` into the compressed buffer
    ///
    /// Only touches storage; the caller must own the bus for storage.
    pub fn fetch(&mut self, frame: u32) -> Result<FrameIndexEntry, PlaybackError> {
        self.loaded = None;

        self.index
            .ensure(&mut *self.storage, self.path, &self.header, frame)?;
        let entry = self
            .index
            .lookup(frame)
            .ok_or(PlaybackError::FrameOutOfRange {
                frame,
                frame_count: self.header.frame_count,
            })?;

        let length = entry.length as usize;
        if length > self.compressed.len() {
            return Err(PlaybackError::FrameTooLarge {
                frame,
                length: entry.length,
                capacity: self.compressed.len().min(u32::MAX as usize) as u32,
            });
        }

        if length > 0 {
            let handle = self
                .handle
                .as_mut()
                .ok_or(PlaybackError::Storage(StorageError::NotOpen))?;
            let buf = &mut self.compressed[..length];
            let read = self.storage.read_at(handle, buf, entry.offset)?;
            if read < length {
                return Err(PlaybackError::ShortRead {
                    offset: entry.offset,
                    expected: entry.length,
                    actual: read as u32,
                });
            }
        }

        self.loaded = Some(LoadedFrame { frame, length });
        Ok(entry)
    }

    /// Decode the fetched frame and draw it with its top-left corner at `(x, y)`
    ///
    /// Only touches the display; the caller must own the bus for it.
    pub fn render(&mut self, x: u16, y: u16) -> Result<(), PlaybackError> {
        let mut scratch = PlaybackMetrics::new();
        self.render_timed(x, y, &NoClock, &mut scratch)
    }

    /// [`render`](Self::render), accumulating transform and draw time
    pub fn render_timed<C: Clock>(
        &mut self,
        x: u16,
        y: u16,
        clock: &C,
        metrics: &mut PlaybackMetrics,
    ) -> Result<(), PlaybackError> {
        let loaded = self.loaded.ok_or(PlaybackError::NoFrameLoaded)?;
        let stream = &self.compressed[..loaded.length];
        let width = self.header.width;
        let mut cursor = SegmentCursor::new();

        for span in self.layout.segments() {
            let t0 = clock.now_ms();
            let out = &mut self.segment[..span.pixel_count];
            let decoded = cursor.decode(stream, out, span.start_pixel, span.pixel_count);
            if decoded != span.pixel_count {
                return Err(PlaybackError::Corrupt {
                    frame: loaded.frame,
                    segment: span.index,
                    expected: span.pixel_count as u32,
                    decoded: decoded as u32,
                });
            }
            to_wire_order(out);

            let row = y
                .checked_add(span.start_row)
                .ok_or(ConfigError::OriginOutOfRange)?;
            let t1 = clock.now_ms();
            self.display.write_block(x, row, out, width, span.rows)?;
            let t2 = clock.now_ms();

            metrics.transform_ms += t1.saturating_sub(t0);
            metrics.draw_ms += t2.saturating_sub(t1);
        }

        Ok(())
    }

    /// Fetch and render frame `frame`
    ///
    /// For callers that do not share a bus between storage and display.
    pub fn play_frame(&mut self, frame: u32, x: u16, y: u16) -> Result<(), PlaybackError> {
        self.fetch(frame)?;
        self.render(x, y)
    }
}

impl<S, D, const N: usize> Drop for StreamDecoder<'_, S, D, N>
where
    S: StorageReader,
    D: DisplaySink,
{
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.storage.close(handle);
        }
    }
}
