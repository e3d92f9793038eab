//! Run-length pixel codec.
//!
//! Token format:
//! - HEADER (1 byte): bit 7 = run flag, bits 0-6 = pixel count - 1 (1-128)
//! - Run: HEADER followed by one RGB565 value (2 bytes, little-endian),
//!   repeated `count` times
//! - Literal: HEADER followed by `count` RGB565 values
//!
//! The stream is variable-length, so locating pixel N means walking every
//! token before it. Decoding never reads past the end of the input: a token
//! whose payload is cut short ends the stream (a literal still yields the
//! complete pixels it carries).

use core::fmt;

/// Header bit marking a run token
pub const RUN_FLAG: u8 = 0x80;

/// Most pixels a single token can describe
pub const MAX_TOKEN_PIXELS: usize = 128;

/// Shortest stretch of equal pixels the encoder emits as a run
pub const MIN_RUN: usize = 2;

/// Errors from the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Output buffer cannot hold the encoded stream
    BufferTooSmall,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::BufferTooSmall => f.write_str("encode buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// One decoded token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Run { count: usize, value: u16 },
    /// `pixels` holds `count` little-endian values
    Literal { count: usize, pixels: &'a [u8] },
}

impl Token<'_> {
    fn len(&self) -> usize {
        match *self {
            Token::Run { count, .. } | Token::Literal { count, .. } => count,
        }
    }

    /// Write pixels `[skip, skip + out.len())` of this token into `out`
    fn emit(&self, skip: usize, out: &mut [u16]) {
        match *self {
            Token::Run { value, .. } => out.fill(value),
            Token::Literal { pixels, .. } => {
                let src = pixels[skip * 2..].chunks_exact(2);
                for (dst, bytes) in out.iter_mut().zip(src) {
                    *dst = u16::from_le_bytes([bytes[0], bytes[1]]);
                }
            }
        }
    }
}

/// Walks a compressed stream token by token
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let header = *self.data.get(self.pos)?;
        let count = (header & !RUN_FLAG) as usize + 1;
        let body = self.pos + 1;
        let remaining = self.data.len().saturating_sub(body);

        if header & RUN_FLAG != 0 {
            if remaining < 2 {
                self.pos = self.data.len();
                return None;
            }
            let value = u16::from_le_bytes([self.data[body], self.data[body + 1]]);
            self.pos = body + 2;
            Some(Token::Run { count, value })
        } else {
            let available = count.min(remaining / 2);
            if available == 0 {
                self.pos = self.data.len();
                return None;
            }
            let pixels = &self.data[body..body + available * 2];
            // A cut-short literal is the last token of the stream
            self.pos = if available == count {
                body + count * 2
            } else {
                self.data.len()
            };
            Some(Token::Literal {
                count: available,
                pixels,
            })
        }
    }
}

/// Decode from the start of the stream into `output`
///
/// Stops when the stream ends or `max_pixels` (capped at `output.len()`)
/// pixels have been written. Returns the number of pixels written.
pub fn decode_all(compressed: &[u8], output: &mut [u16], max_pixels: usize) -> usize {
    let limit = max_pixels.min(output.len());
    let mut written = 0;

    for token in Tokens::at(compressed, 0) {
        if written == limit {
            break;
        }
        let n = token.len().min(limit - written);
        token.emit(0, &mut output[written..written + n]);
        written += n;
    }

    written
}

/// Resume point for decoding consecutive segments of one stream
///
/// Remembers the token where the previous segment stopped so that the next
/// segment starting at or after that pixel does not rescan from the start.
/// Must be reset (or recreated) when switching to a different stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentCursor {
    /// First pixel of the remembered token
    pixel: usize,
    /// Byte offset of the remembered token's header
    offset: usize,
}

impl SegmentCursor {
    /// Cursor at the start of a stream
    pub const fn new() -> Self {
        Self {
            pixel: 0,
            offset: 0,
        }
    }

    /// Rewind to the start of the stream
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decode pixels `[start_pixel, start_pixel + pixel_count)` into `output`
    ///
    /// Returns the number of pixels written. A result smaller than
    /// `pixel_count` means the stream ended early or `output` was too short.
    pub fn decode(
        &mut self,
        compressed: &[u8],
        output: &mut [u16],
        start_pixel: usize,
        pixel_count: usize,
    ) -> usize {
        if pixel_count == 0 {
            return 0;
        }
        if start_pixel < self.pixel {
            self.reset();
        }

        let end_pixel = start_pixel.saturating_add(pixel_count);
        let mut tokens = Tokens::at(compressed, self.offset);
        let mut pixel = self.pixel;
        let mut written = 0;

        loop {
            let token_offset = tokens.pos;
            let Some(token) = tokens.next() else {
                break;
            };
            let token_end = pixel + token.len();

            if token_end <= start_pixel {
                pixel = token_end;
                continue;
            }

            self.pixel = pixel;
            self.offset = token_offset;

            let copy_start = pixel.max(start_pixel);
            let copy_end = token_end.min(end_pixel);
            let n = (copy_end - copy_start).min(output.len() - written);
            token.emit(copy_start - pixel, &mut output[written..written + n]);
            written += n;

            pixel = token_end;
            if pixel >= end_pixel || written == output.len() {
                break;
            }
        }

        written
    }
}

/// Decode only pixels `[start_pixel, start_pixel + pixel_count)` into `output`
///
/// Scans the stream from its beginning to find the first token covering
/// `start_pixel`; tokens straddling either edge contribute only their
/// overlapping part. A `pixel_count` of 0 returns 0.
pub fn decode_segment(
    compressed: &[u8],
    output: &mut [u16],
    start_pixel: usize,
    pixel_count: usize,
) -> usize {
    SegmentCursor::new().decode(compressed, output, start_pixel, pixel_count)
}

/// Count the pixels the stream decodes to, without writing them
pub fn size_of_decoded(compressed: &[u8]) -> usize {
    Tokens::at(compressed, 0).map(|t| t.len()).sum()
}

/// Worst-case encoded size for `pixels` pixels
///
/// All-literal output: two bytes per pixel plus one header per 128 pixels.
pub const fn max_encoded_len(pixels: usize) -> usize {
    pixels * 2 + pixels.div_ceil(MAX_TOKEN_PIXELS)
}

/// Count equal pixels starting at `start`, up to one token's worth
fn run_length(pixels: &[u16], start: usize) -> usize {
    let value = pixels[start];
    pixels[start..]
        .iter()
        .take(MAX_TOKEN_PIXELS)
        .take_while(|&&p| p == value)
        .count()
}

struct ByteWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl ByteWriter<'_> {
    fn push(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let end = self.pos + bytes.len();
        self.out
            .get_mut(self.pos..end)
            .ok_or(CodecError::BufferTooSmall)?
            .copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

/// Encode `pixels` into `out`
///
/// Stretches of at least [`MIN_RUN`] equal pixels become run tokens;
/// everything else is grouped into literal tokens. Returns the encoded
/// length. Fails rather than truncating when `out` is too small;
/// [`max_encoded_len`] always suffices.
pub fn encode(pixels: &[u16], out: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = ByteWriter { out, pos: 0 };
    let mut i = 0;

    while i < pixels.len() {
        let run = run_length(pixels, i);
        if run >= MIN_RUN {
            w.push(&[RUN_FLAG | (run - 1) as u8])?;
            w.push(&pixels[i].to_le_bytes())?;
            i += run;
            continue;
        }

        let start = i;
        while i < pixels.len() && i - start < MAX_TOKEN_PIXELS {
            if run_length(pixels, i) >= MIN_RUN {
                break;
            }
            i += 1;
        }

        w.push(&[(i - start - 1) as u8])?;
        for px in &pixels[start..i] {
            w.push(&px.to_le_bytes())?;
        }
    }

    Ok(w.pos)
}
