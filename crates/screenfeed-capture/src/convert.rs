//! CPU-side pixel work: pitch-aware row packing and cursor compositing.

use crate::frame::CaptureGeometry;

/// Pack a mapped staging surface into a tight BGRA buffer.
///
/// The mapped region reports a row pitch that may exceed `width * 4` bytes
/// because of hardware alignment, so rows are copied one at a time using the
/// reported pitch as the source stride. A single bulk copy would interleave
/// padding bytes into the image whenever the pitches differ.
pub fn pack_rows(mapped: &[u8], row_pitch: usize, geometry: CaptureGeometry) -> Vec<u8> {
    let row_bytes = geometry.width as usize * 4;
    let mut packed = vec![0u8; geometry.packed_size()];

    for row in 0..geometry.height as usize {
        let src = row * row_pitch;
        let dst = row * row_bytes;
        packed[dst..dst + row_bytes].copy_from_slice(&mapped[src..src + row_bytes]);
    }

    packed
}

/// A decoded pointer shape, ready to composite onto a BGRA frame.
///
/// Built from the duplication interface's pointer shape buffer. Color and
/// masked-color shapes carry per-pixel alpha; monochrome shapes are decoded
/// from their AND/XOR mask pair. Pixels flagged for inversion XOR the
/// destination instead of blending.
#[derive(Debug, Clone)]
pub struct CursorSprite {
    pub width: u32,
    pub height: u32,
    bgra: Vec<u8>,
    invert: Vec<bool>,
}

impl CursorSprite {
    /// Decode a color shape (`DXGI_OUTDUPL_POINTER_SHAPE_TYPE_COLOR`): BGRA
    /// rows at the reported pitch, straight alpha.
    pub fn from_color(buf: &[u8], width: u32, height: u32, pitch: usize) -> Self {
        let mut bgra = vec![0u8; (width * height) as usize * 4];
        for row in 0..height as usize {
            let src = row * pitch;
            let dst = row * width as usize * 4;
            let len = width as usize * 4;
            bgra[dst..dst + len].copy_from_slice(&buf[src..src + len]);
        }
        let invert = vec![false; (width * height) as usize];
        Self {
            width,
            height,
            bgra,
            invert,
        }
    }

    /// Decode a masked-color shape: the alpha byte is a mask, not coverage.
    /// A mask of 0xFF means XOR with the screen; anything else is an opaque
    /// color pixel.
    pub fn from_masked_color(buf: &[u8], width: u32, height: u32, pitch: usize) -> Self {
        let mut sprite = Self::from_color(buf, width, height, pitch);
        for (i, px) in sprite.bgra.chunks_exact_mut(4).enumerate() {
            if px[3] == 0xFF {
                sprite.invert[i] = true;
                px[3] = 0;
            } else {
                px[3] = 0xFF;
            }
        }
        sprite
    }

    /// Decode a monochrome shape: `height` rows of a 1-bpp AND mask followed
    /// by `height` rows of a 1-bpp XOR mask, so the visible sprite is
    /// `height / 2` tall.
    ///
    /// AND 0 draws the XOR bit as opaque black or white; AND 1 with XOR 1
    /// inverts the destination; AND 1 with XOR 0 is transparent.
    pub fn from_monochrome(buf: &[u8], width: u32, height: u32, pitch: usize) -> Self {
        let visible_height = height / 2;
        let pixels = (width * visible_height) as usize;
        let mut bgra = vec![0u8; pixels * 4];
        let mut invert = vec![false; pixels];

        for y in 0..visible_height as usize {
            for x in 0..width as usize {
                let byte = x / 8;
                let bit = 7 - (x % 8) as u32;
                let and_bit = (buf[y * pitch + byte] >> bit) & 1;
                let xor_bit = (buf[(y + visible_height as usize) * pitch + byte] >> bit) & 1;

                let i = y * width as usize + x;
                let px = &mut bgra[i * 4..i * 4 + 4];
                match (and_bit, xor_bit) {
                    (0, 0) => px.copy_from_slice(&[0x00, 0x00, 0x00, 0xFF]),
                    (0, 1) => px.copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]),
                    (1, 1) => invert[i] = true,
                    _ => {} // transparent
                }
            }
        }

        Self {
            width,
            height: visible_height,
            bgra,
            invert,
        }
    }
}

/// Composite the cursor sprite onto a packed BGRA frame.
///
/// `(x, y)` is the sprite's top-left corner relative to the output's
/// top-left, as reported by the duplication interface. The sprite is clipped
/// against all four frame edges.
pub fn overlay_cursor(
    frame: &mut [u8],
    geometry: CaptureGeometry,
    sprite: &CursorSprite,
    x: i32,
    y: i32,
) {
    for sy in 0..sprite.height as i32 {
        let fy = y + sy;
        if fy < 0 || fy >= geometry.height as i32 {
            continue;
        }
        for sx in 0..sprite.width as i32 {
            let fx = x + sx;
            if fx < 0 || fx >= geometry.width as i32 {
                continue;
            }

            let si = (sy * sprite.width as i32 + sx) as usize;
            let di = (fy as usize * geometry.width as usize + fx as usize) * 4;
            let dst = &mut frame[di..di + 4];

            if sprite.invert[si] {
                dst[0] = !dst[0];
                dst[1] = !dst[1];
                dst[2] = !dst[2];
                continue;
            }

            let src = &sprite.bgra[si * 4..si * 4 + 4];
            let a = src[3] as u32;
            if a == 0 {
                continue;
            }
            for c in 0..3 {
                let s = src[c] as u32;
                let d = dst[c] as u32;
                dst[c] = ((s * a + d * (255 - a)) / 255) as u8;
            }
        }
    }
}
