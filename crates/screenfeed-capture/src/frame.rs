//! Encoded frame types.

use bytes::Bytes;
use image::codecs::bmp::BmpEncoder;
use image::ExtendedColorType;

use crate::error::CaptureError;
use crate::CaptureResult;

/// Pixel dimensions of the captured output.
///
/// Derived from the output's desktop bounds at initialization time and fixed
/// for the lifetime of one capture device; changing display requires full
/// reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGeometry {
    pub width: u32,
    pub height: u32,
}

impl CaptureGeometry {
    /// Size in bytes of one packed BGRA frame of this geometry.
    pub fn packed_size(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// One captured frame, encoded as an uncompressed 32-bit BMP.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Encoded image bytes.
    pub data: Bytes,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Monotonically increasing sequence number within one session.
    pub sequence: u64,
}

impl EncodedFrame {
    /// Encode a packed BGRA pixel buffer into a BMP frame.
    ///
    /// `bgra` must hold exactly `geometry.packed_size()` bytes.
    pub fn encode_bgra(
        bgra: &[u8],
        geometry: CaptureGeometry,
        sequence: u64,
    ) -> CaptureResult<Self> {
        debug_assert_eq!(bgra.len(), geometry.packed_size());

        // The BMP codec wants RGBA channel order.
        let mut rgba = bgra.to_vec();
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }

        let mut out = Vec::with_capacity(rgba.len() + 138);
        BmpEncoder::new(&mut out)
            .encode(&rgba, geometry.width, geometry.height, ExtendedColorType::Rgba8)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        Ok(Self {
            data: Bytes::from(out),
            width: geometry.width,
            height: geometry.height,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frame_decodes_to_exact_geometry() {
        let geometry = CaptureGeometry {
            width: 5,
            height: 3,
        };
        let bgra = vec![0x80u8; geometry.packed_size()];
        let frame = EncodedFrame::encode_bgra(&bgra, geometry, 0).unwrap();

        let decoded =
            image::load_from_memory_with_format(&frame.data, image::ImageFormat::Bmp).unwrap();
        assert_eq!(decoded.width(), 5);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn bmp_header_is_present() {
        let geometry = CaptureGeometry {
            width: 2,
            height: 2,
        };
        let bgra = vec![0u8; geometry.packed_size()];
        let frame = EncodedFrame::encode_bgra(&bgra, geometry, 1).unwrap();
        assert_eq!(&frame.data[..2], b"BM");
        assert_eq!(frame.sequence, 1);
    }

    #[test]
    fn channel_order_survives_round_trip() {
        let geometry = CaptureGeometry {
            width: 1,
            height: 1,
        };
        // One pure-blue BGRA pixel.
        let bgra = [0xFF, 0x00, 0x00, 0xFF];
        let frame = EncodedFrame::encode_bgra(&bgra, geometry, 0).unwrap();

        let decoded =
            image::load_from_memory_with_format(&frame.data, image::ImageFormat::Bmp).unwrap();
        let rgba = decoded.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [0x00, 0x00, 0xFF, 0xFF]);
    }
}
