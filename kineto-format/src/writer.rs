//! Container writer for host-side tools.
//!
//! Writes the header and a zeroed index table up front, appends frames as
//! they are encoded, then patches the index and header on [`ContainerWriter::finish`].

use std::io::{self, Seek, SeekFrom, Write};

use crate::header::{FrameIndexEntry, VideoHeader, HEADER_SIZE, INDEX_ENTRY_SIZE};
use crate::rle::{encode, max_encoded_len};

/// Streaming writer for a Kineto video file
pub struct ContainerWriter<W: Write + Seek> {
    inner: W,
    header: VideoHeader,
    entries: Vec<FrameIndexEntry>,
    scratch: Vec<u8>,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Start a file with room for `frame_count` index entries
    pub fn new(mut inner: W, frame_count: u32, width: u16, height: u16, fps: u8) -> io::Result<Self> {
        let header = VideoHeader::new(frame_count, width, height, fps);
        if width == 0 || height == 0 || fps == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "width, height and fps must be non-zero",
            ));
        }

        inner.seek(SeekFrom::Start(0))?;
        inner.write_all(&header.to_bytes())?;
        let table = vec![0u8; frame_count as usize * INDEX_ENTRY_SIZE];
        inner.write_all(&table)?;

        Ok(Self {
            inner,
            header,
            entries: Vec::with_capacity(frame_count as usize),
            scratch: vec![0u8; max_encoded_len(header.pixels_per_frame())],
        })
    }

    /// Encode and append one frame of `width * height` RGB565 pixels
    pub fn push_frame(&mut self, pixels: &[u16]) -> io::Result<FrameIndexEntry> {
        if pixels.len() != self.header.pixels_per_frame() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} pixels, expected {}",
                    pixels.len(),
                    self.header.pixels_per_frame()
                ),
            ));
        }
        if self.entries.len() as u32 >= self.header.frame_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "more frames than declared",
            ));
        }

        let len = encode(pixels, &mut self.scratch)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let offset = self.inner.stream_position()?;
        self.inner.write_all(&self.scratch[..len])?;

        let entry = FrameIndexEntry {
            offset: u32::try_from(offset)
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "file exceeds 4 GiB"))?,
            length: len as u32,
        };
        self.entries.push(entry);
        Ok(entry)
    }

    /// Frames written so far
    pub fn frames_written(&self) -> usize {
        self.entries.len()
    }

    /// Patch the index table and header, returning the inner writer
    ///
    /// If fewer frames were pushed than declared, the header's frame count
    /// is lowered to match.
    pub fn finish(mut self) -> io::Result<W> {
        self.header.frame_count = self.entries.len() as u32;

        self.inner.seek(SeekFrom::Start(0))?;
        self.inner.write_all(&self.header.to_bytes())?;

        self.inner.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        for entry in &self.entries {
            self.inner.write_all(&entry.to_bytes())?;
        }

        self.inner.seek(SeekFrom::End(0))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rle::decode_all;
    use std::io::Cursor;

    #[test]
    fn test_writer_layout() {
        let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), 2, 4, 2, 10).unwrap();
        let first = writer.push_frame(&[0x1234; 8]).unwrap();
        let second = writer.push_frame(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let header = VideoHeader::parse(&bytes).unwrap();
        assert_eq!(header.frame_count, 2);
        assert_eq!(header.index_offset, HEADER_SIZE as u32);

        // Payloads start right after the two index entries
        assert_eq!(first.offset as usize, HEADER_SIZE + 2 * INDEX_ENTRY_SIZE);
        assert_eq!(second.offset, first.offset + first.length);

        let mut raw = [0u8; INDEX_ENTRY_SIZE];
        raw.copy_from_slice(&bytes[HEADER_SIZE + INDEX_ENTRY_SIZE..HEADER_SIZE + 16]);
        assert_eq!(FrameIndexEntry::parse(&raw), second);

        let payload = &bytes[second.offset as usize..(second.offset + second.length) as usize];
        let mut out = [0u16; 8];
        assert_eq!(decode_all(payload, &mut out, 8), 8);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_writer_rejects_wrong_frame_size() {
        let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), 1, 4, 2, 10).unwrap();
        assert!(writer.push_frame(&[0u16; 7]).is_err());
    }

    #[test]
    fn test_writer_lowers_frame_count_when_short() {
        let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), 5, 2, 2, 10).unwrap();
        writer.push_frame(&[7u16; 4]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert_eq!(VideoHeader::parse(&bytes).unwrap().frame_count, 1);
    }
}
