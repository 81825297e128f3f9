//! DXGI Output Duplication screen capture.
//!
//! This crate acquires frames from one display output through the DXGI
//! Desktop Duplication API, stages them into CPU-readable memory, composites
//! the pointer shape, and encodes each frame as an uncompressed BMP.
//!
//! On non-Windows targets a stub is compiled so the workspace builds and the
//! platform-neutral pixel logic stays testable.

mod convert;
mod error;
mod frame;

pub use convert::{overlay_cursor, pack_rows, CursorSprite};
pub use error::CaptureError;
pub use frame::{CaptureGeometry, EncodedFrame};

#[cfg(target_os = "windows")]
mod dxgi;
#[cfg(target_os = "windows")]
pub use dxgi::display::enumerate_displays;
#[cfg(target_os = "windows")]
pub use dxgi::producer::DxgiProducer;

#[cfg(not(target_os = "windows"))]
mod stub;
#[cfg(not(target_os = "windows"))]
pub use stub::{enumerate_displays, DxgiProducer};

use screenfeed_ipc::DisplayInfo;

/// Acquisition timeout handed to the duplication interface, in milliseconds.
///
/// Kept short so the capture loop observes its stop flag promptly; a timeout
/// is the expected outcome whenever the desktop has not changed.
pub const ACQUIRE_TIMEOUT_MS: u32 = 5;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A source of encoded frames for one display.
///
/// The DXGI implementation composes the duplication interface with the
/// staging/encode pipeline; tests drive the capture loop through synthetic
/// implementations of this trait.
pub trait FrameProducer: Send {
    /// Poll for the next frame.
    ///
    /// `Ok(None)` means no new frame was available within the acquisition
    /// timeout; the caller retries. `Err(CaptureError::DuplicationLost)` is
    /// fatal to this producer and requires full reconstruction.
    fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>>;

    /// Dimensions of the captured output.
    fn geometry(&self) -> CaptureGeometry;
}

/// Builds a frame producer for the given display.
///
/// Resolves the display's adapter and output, creates the GPU device and
/// staging surface, and opens the duplication interface. All initialization
/// failures surface here, synchronously, before any capture thread exists.
pub fn create_producer(display: &DisplayInfo) -> CaptureResult<DxgiProducer> {
    DxgiProducer::new(display.adapter_index, display.output_index)
}
