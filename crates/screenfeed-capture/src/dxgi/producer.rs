//! The DXGI frame producer: acquire, stage, pack, composite, encode.

use std::slice;

use tracing::{instrument, trace};
use windows::Win32::Graphics::Direct3D11::{D3D11_MAPPED_SUBRESOURCE, D3D11_MAP_READ};

use super::device::CaptureDevice;
use super::duplication::{DuplicationSource, FramePoll};
use crate::convert::{overlay_cursor, pack_rows};
use crate::frame::{CaptureGeometry, EncodedFrame};
use crate::{CaptureResult, FrameProducer, ACQUIRE_TIMEOUT_MS};

/// Produces encoded frames for one display output.
///
/// Owns the capture device and the duplication interface; both live and die
/// together. A lost duplication invalidates the whole producer.
pub struct DxgiProducer {
    device: CaptureDevice,
    duplication: DuplicationSource,
    sequence: u64,
}

impl DxgiProducer {
    /// Initialize GPU resources and open duplication for the display at the
    /// given adapter/output indices. All failure modes surface here, before
    /// any capture thread exists.
    #[instrument(name = "dxgi_producer_new")]
    pub fn new(adapter_index: u32, output_index: u32) -> CaptureResult<Self> {
        let device = CaptureDevice::new(adapter_index, output_index)?;
        let duplication = DuplicationSource::open(&device)?;
        Ok(Self {
            device,
            duplication,
            sequence: 0,
        })
    }

    /// Copy the acquired texture into the staging surface, read it back with
    /// the reported row pitch, composite the cursor, and encode.
    fn process(
        &mut self,
        texture: &windows::Win32::Graphics::Direct3D11::ID3D11Texture2D,
    ) -> CaptureResult<EncodedFrame> {
        let geometry = self.device.geometry();
        let context = self.device.context();
        let staging = self.device.staging();

        unsafe {
            context.CopyResource(staging, texture);
        }

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            context.Map(staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped))?;
        }

        // Pack while mapped, then unmap before anything fallible runs so the
        // surface is released on every path.
        let row_pitch = mapped.RowPitch as usize;
        let mapped_bytes = unsafe {
            slice::from_raw_parts(mapped.pData as *const u8, row_pitch * geometry.height as usize)
        };
        let mut packed = pack_rows(mapped_bytes, row_pitch, geometry);

        unsafe {
            context.Unmap(staging, 0);
        }

        if let Some((sprite, x, y)) = self.duplication.cursor() {
            overlay_cursor(&mut packed, geometry, sprite, x, y);
        }

        let frame = EncodedFrame::encode_bgra(&packed, geometry, self.sequence)?;
        self.sequence += 1;
        trace!(sequence = frame.sequence, "frame encoded");
        Ok(frame)
    }
}

impl FrameProducer for DxgiProducer {
    fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
        match self.duplication.acquire(ACQUIRE_TIMEOUT_MS)? {
            FramePoll::NoFrameYet => Ok(None),
            FramePoll::Frame(texture) => self.process(&texture).map(Some),
        }
    }

    fn geometry(&self) -> CaptureGeometry {
        self.device.geometry()
    }
}
