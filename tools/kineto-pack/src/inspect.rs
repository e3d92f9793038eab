//! Header, index and decode check for an existing file

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use anyhow::{Context, Result};
use kineto_format::{
    size_of_decoded, FrameIndexEntry, VideoHeader, HEADER_SIZE, INDEX_ENTRY_SIZE,
};

/// What [`inspect`] found
#[derive(Debug, Clone)]
pub struct Inspection {
    pub header: VideoHeader,
    pub entries: Vec<FrameIndexEntry>,
    /// Frames whose stream does not decode to exactly `width * height` pixels
    pub bad_frames: Vec<u32>,
    pub largest_frame: u32,
    pub encoded_bytes: u64,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        let raw_bytes = h.pixels_per_frame() as u64 * 2 * self.entries.len() as u64;
        let ratio = if raw_bytes == 0 {
            0.0
        } else {
            (1.0 - self.encoded_bytes as f64 / raw_bytes as f64) * 100.0
        };
        let seconds = h.frame_count as f64 / h.fps as f64;

        writeln!(f, "Frames:      {} ({:.1} s at {} fps)", h.frame_count, seconds, h.fps)?;
        writeln!(f, "Resolution:  {}x{}", h.width, h.height)?;
        writeln!(f, "Index at:    {}", h.index_offset)?;
        writeln!(f, "Encoded:     {} bytes ({:.1}% reduction)", self.encoded_bytes, ratio)?;
        writeln!(
            f,
            "Largest:     {} bytes (minimum compressed_buffer_bytes)",
            self.largest_frame
        )?;
        write!(f, "Bad frames:  {}", self.bad_frames.len())
    }
}

/// Read the whole index and decode-count every frame
pub fn inspect<R: Read + Seek>(mut reader: R) -> Result<Inspection> {
    let mut raw = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut raw)
        .context("file too short for a header")?;
    let header = VideoHeader::parse(&raw).context("invalid header")?;

    reader.seek(SeekFrom::Start(header.index_offset as u64))?;
    let mut entries = Vec::with_capacity(header.frame_count as usize);
    for frame in 0..header.frame_count {
        let mut bytes = [0u8; INDEX_ENTRY_SIZE];
        reader
            .read_exact(&mut bytes)
            .with_context(|| format!("index table ends before frame {}", frame))?;
        entries.push(FrameIndexEntry::parse(&bytes));
    }

    let mut inspection = Inspection {
        header,
        entries: Vec::new(),
        bad_frames: Vec::new(),
        largest_frame: 0,
        encoded_bytes: 0,
    };

    let mut stream = Vec::new();
    for (frame, entry) in entries.iter().enumerate() {
        stream.resize(entry.length as usize, 0);
        reader.seek(SeekFrom::Start(entry.offset as u64))?;
        let decoded = match reader.read_exact(&mut stream) {
            Ok(()) => size_of_decoded(&stream),
            Err(_) => 0,
        };
        if decoded != header.pixels_per_frame() {
            inspection.bad_frames.push(frame as u32);
        }
        inspection.largest_frame = inspection.largest_frame.max(entry.length);
        inspection.encoded_bytes += entry.length as u64;
    }

    inspection.entries = entries;
    Ok(inspection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kineto_format::ContainerWriter;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), 2, 4, 2, 10).unwrap();
        writer.push_frame(&[0x1234; 8]).unwrap();
        writer.push_frame(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_clean_file() {
        let report = inspect(Cursor::new(sample())).unwrap();
        assert_eq!(report.header.frame_count, 2);
        assert_eq!(report.entries.len(), 2);
        assert!(report.bad_frames.is_empty());
        assert_eq!(report.largest_frame, 17);
        assert_eq!(report.encoded_bytes, 20);
    }

    #[test]
    fn test_detects_short_frame() {
        let mut bytes = sample();
        let entry_at = HEADER_SIZE;
        let offset = u32::from_le_bytes(bytes[entry_at..entry_at + 4].try_into().unwrap());
        // Run of 8 becomes a run of 7
        bytes[offset as usize] = 0x86;

        let report = inspect(Cursor::new(bytes)).unwrap();
        assert_eq!(report.bad_frames, [0]);
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut bytes = sample();
        bytes[..4].copy_from_slice(b"AVI0");
        assert!(inspect(Cursor::new(bytes)).is_err());
        assert!(inspect(Cursor::new(vec![0u8; 10])).is_err());
    }
}
