//! Non-Windows stubs (CI and cross-compilation checks).

use screenfeed_ipc::DisplayInfo;

use crate::error::CaptureError;
use crate::frame::{CaptureGeometry, EncodedFrame};
use crate::{CaptureResult, FrameProducer};

/// There are no DXGI adapters off Windows; an empty list is the honest
/// enumeration result.
pub fn enumerate_displays() -> CaptureResult<Vec<DisplayInfo>> {
    tracing::debug!("display enumeration stub (non-Windows): no adapters");
    Ok(Vec::new())
}

/// Stub producer; construction always fails.
pub struct DxgiProducer;

impl DxgiProducer {
    pub fn new(_adapter_index: u32, _output_index: u32) -> CaptureResult<Self> {
        Err(CaptureError::NotSupported)
    }
}

impl FrameProducer for DxgiProducer {
    fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
        Err(CaptureError::NotSupported)
    }

    fn geometry(&self) -> CaptureGeometry {
        CaptureGeometry {
            width: 0,
            height: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_enumeration_is_empty() {
        assert!(enumerate_displays().unwrap().is_empty());
    }

    #[test]
    fn stub_producer_reports_unsupported() {
        assert!(matches!(
            DxgiProducer::new(0, 0),
            Err(CaptureError::NotSupported)
        ));
    }
}
