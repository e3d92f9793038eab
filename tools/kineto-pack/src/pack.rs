//! Raw frames in, video file out

use std::fmt;
use std::io::{self, Read, Seek, Write};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use kineto_format::{rgb888_to_rgb565, ContainerWriter};

/// Pixel layout of the raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PixelFormat {
    /// 16-bit RGB565, little-endian
    Rgb565le,
    /// 24-bit packed RGB
    Rgb888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565le => 2,
            PixelFormat::Rgb888 => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackOptions {
    pub width: u16,
    pub height: u16,
    pub fps: u8,
    pub format: PixelFormat,
}

impl PackOptions {
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Whole frames in an input of `len` bytes
    pub fn frames_in(&self, len: u64) -> Result<u32> {
        let frame_bytes = self.frame_bytes() as u64;
        if frame_bytes == 0 {
            bail!("width and height must be non-zero");
        }
        if len % frame_bytes != 0 {
            eprintln!(
                "warning: input is not a whole number of {}x{} frames, ignoring {} trailing bytes",
                self.width,
                self.height,
                len % frame_bytes
            );
        }
        u32::try_from(len / frame_bytes).context("too many frames for one file")
    }
}

/// Totals for a finished pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub frames: u32,
    pub raw_bytes: u64,
    pub encoded_bytes: u64,
    pub largest_frame: u32,
    pub file_bytes: u64,
}

impl fmt::Display for PackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratio = if self.raw_bytes == 0 {
            0.0
        } else {
            (1.0 - self.encoded_bytes as f64 / self.raw_bytes as f64) * 100.0
        };
        writeln!(f, "Packed {} frames", self.frames)?;
        writeln!(
            f,
            "RGB565 size: {} bytes, encoded: {} bytes ({:.1}% reduction)",
            self.raw_bytes, self.encoded_bytes, ratio
        )?;
        writeln!(f, "Largest frame: {} bytes", self.largest_frame)?;
        write!(f, "File size: {} bytes", self.file_bytes)
    }
}

fn to_rgb565(raw: &[u8], format: PixelFormat, out: &mut Vec<u16>) {
    out.clear();
    match format {
        PixelFormat::Rgb565le => {
            out.extend(raw.chunks_exact(2).map(|p| u16::from_le_bytes([p[0], p[1]])))
        }
        PixelFormat::Rgb888 => {
            out.extend(raw.chunks_exact(3).map(|p| rgb888_to_rgb565(p[0], p[1], p[2])))
        }
    }
}

/// Read up to `frame_count` frames from `input` and write a video to `output`
///
/// An input that ends early produces a shorter file with a matching header.
pub fn pack<R, W>(mut input: R, output: W, frame_count: u32, options: &PackOptions) -> Result<PackSummary>
where
    R: Read,
    W: Write + Seek,
{
    let mut writer = ContainerWriter::new(
        output,
        frame_count,
        options.width,
        options.height,
        options.fps,
    )
    .context("failed to start video file")?;

    let mut raw = vec![0u8; options.frame_bytes()];
    let mut pixels = Vec::with_capacity(options.width as usize * options.height as usize);
    let mut summary = PackSummary {
        frames: 0,
        raw_bytes: 0,
        encoded_bytes: 0,
        largest_frame: 0,
        file_bytes: 0,
    };

    for frame in 0..frame_count {
        match input.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                eprintln!("warning: input ended after {} frames", frame);
                break;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to read frame {}", frame)),
        }

        to_rgb565(&raw, options.format, &mut pixels);
        let entry = writer
            .push_frame(&pixels)
            .with_context(|| format!("failed to write frame {}", frame))?;

        summary.frames += 1;
        summary.raw_bytes += pixels.len() as u64 * 2;
        summary.encoded_bytes += entry.length as u64;
        summary.largest_frame = summary.largest_frame.max(entry.length);
    }

    let mut output = writer.finish().context("failed to finish video file")?;
    summary.file_bytes = output.stream_position()?;
    output.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kineto_format::{decode_all, FrameIndexEntry, VideoHeader, HEADER_SIZE, INDEX_ENTRY_SIZE};
    use std::io::Cursor;

    fn options(format: PixelFormat) -> PackOptions {
        PackOptions {
            width: 2,
            height: 2,
            fps: 24,
            format,
        }
    }

    #[test]
    fn test_frames_in() {
        let opts = options(PixelFormat::Rgb888);
        assert_eq!(opts.frame_bytes(), 12);
        assert_eq!(opts.frames_in(36).unwrap(), 3);
        assert_eq!(opts.frames_in(40).unwrap(), 3);

        let empty = PackOptions {
            width: 0,
            ..opts
        };
        assert!(empty.frames_in(100).is_err());
    }

    #[test]
    fn test_pack_rgb888() {
        // Frame 0 all red, frame 1 red/green/blue/white
        let mut raw = Vec::new();
        for _ in 0..4 {
            raw.extend([255, 0, 0]);
        }
        raw.extend([255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);

        let mut out = Cursor::new(Vec::new());
        let summary = pack(Cursor::new(raw), &mut out, 2, &options(PixelFormat::Rgb888)).unwrap();
        let file = out.into_inner();

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.raw_bytes, 16);
        assert_eq!(summary.file_bytes, file.len() as u64);

        let header = VideoHeader::parse(&file).unwrap();
        assert_eq!((header.frame_count, header.width, header.height, header.fps), (2, 2, 2, 24));

        let at = HEADER_SIZE + INDEX_ENTRY_SIZE;
        let entry = FrameIndexEntry::parse(file[at..at + INDEX_ENTRY_SIZE].try_into().unwrap());
        let stream = &file[entry.offset as usize..(entry.offset + entry.length) as usize];
        let mut pixels = [0u16; 4];
        assert_eq!(decode_all(stream, &mut pixels, 4), 4);
        assert_eq!(pixels, [0xF800, 0x07E0, 0x001F, 0xFFFF]);
    }

    #[test]
    fn test_short_input_lowers_frame_count() {
        let raw: Vec<u8> = [0x34, 0x12].repeat(4 + 2);
        let mut out = Cursor::new(Vec::new());

        let summary = pack(Cursor::new(raw), &mut out, 3, &options(PixelFormat::Rgb565le)).unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.largest_frame, 3);

        let header = VideoHeader::parse(out.get_ref()).unwrap();
        assert_eq!(header.frame_count, 1);
    }
}
