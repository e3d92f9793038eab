//! RGB565 pixel helpers

/// Pack 8-bit RGB into RGB565
///
/// Keeps the top 5/6/5 bits of each channel.
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Convert decoded pixels to display wire order in place
///
/// The codec yields native `u16` values; SPI panels expect each pixel
/// big-endian on the wire. After this call every word's in-memory bytes are
/// the wire bytes, on any host.
pub fn to_wire_order(pixels: &mut [u16]) {
    for px in pixels.iter_mut() {
        *px = px.to_be();
    }
}
