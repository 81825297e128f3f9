//! Output duplication wrapper: frame acquisition and pointer tracking.

use tracing::{debug, trace, warn};
use windows::core::Interface;
use windows::Win32::Foundation::E_ACCESSDENIED;
use windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;
use windows::Win32::Graphics::Dxgi::{
    IDXGIOutputDuplication, DXGI_ERROR_ACCESS_LOST, DXGI_ERROR_UNSUPPORTED,
    DXGI_ERROR_WAIT_TIMEOUT, DXGI_OUTDUPL_FRAME_INFO, DXGI_OUTDUPL_POINTER_SHAPE_INFO,
    DXGI_OUTDUPL_POINTER_SHAPE_TYPE_COLOR, DXGI_OUTDUPL_POINTER_SHAPE_TYPE_MASKED_COLOR,
    DXGI_OUTDUPL_POINTER_SHAPE_TYPE_MONOCHROME,
};

use super::device::CaptureDevice;
use crate::convert::CursorSprite;
use crate::error::CaptureError;
use crate::CaptureResult;

/// Outcome of one acquisition attempt.
pub enum FramePoll {
    /// A new desktop frame, as a GPU-resident texture. The frame stays
    /// acquired until the next [`DuplicationSource::acquire`] call releases
    /// it.
    Frame(ID3D11Texture2D),

    /// Nothing changed within the timeout. Not an error; retry.
    NoFrameYet,
}

/// Pointer state accumulated across acquisitions.
///
/// The duplication interface only reports the shape buffer when the shape
/// changes, so the last decoded sprite is cached and reused.
#[derive(Default)]
struct CursorState {
    x: i32,
    y: i32,
    visible: bool,
    sprite: Option<CursorSprite>,
}

/// Wraps `IDXGIOutputDuplication` for one device/output pair.
pub struct DuplicationSource {
    duplication: IDXGIOutputDuplication,
    holding_frame: bool,
    cursor: CursorState,
}

impl DuplicationSource {
    /// Bind a duplication interface to the device's output.
    pub fn open(device: &CaptureDevice) -> CaptureResult<Self> {
        let duplication = unsafe { device.output().DuplicateOutput(device.device()) }.map_err(
            |e| {
                if e.code() == E_ACCESSDENIED || e.code() == DXGI_ERROR_UNSUPPORTED {
                    CaptureError::DuplicationUnavailable(e.message().to_string())
                } else {
                    CaptureError::from(e)
                }
            },
        )?;

        debug!("output duplication opened");
        Ok(Self {
            duplication,
            holding_frame: false,
            cursor: CursorState::default(),
        })
    }

    /// Try to acquire the next desktop frame.
    ///
    /// The previously acquired frame, if any, is released first; the
    /// platform refuses new acquisitions while one is outstanding. A lost
    /// duplication (`DXGI_ERROR_ACCESS_LOST`) is fatal to this source and
    /// the owning device; both must be reconstructed.
    pub fn acquire(&mut self, timeout_ms: u32) -> CaptureResult<FramePoll> {
        if self.holding_frame {
            self.holding_frame = false;
            if let Err(e) = unsafe { self.duplication.ReleaseFrame() } {
                if e.code() == DXGI_ERROR_ACCESS_LOST {
                    return Err(CaptureError::DuplicationLost);
                }
                return Err(e.into());
            }
        }

        let mut frame_info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource = None;
        match unsafe {
            self.duplication
                .AcquireNextFrame(timeout_ms, &mut frame_info, &mut resource)
        } {
            Ok(()) => {}
            Err(e) if e.code() == DXGI_ERROR_WAIT_TIMEOUT => return Ok(FramePoll::NoFrameYet),
            Err(e) if e.code() == DXGI_ERROR_ACCESS_LOST => {
                return Err(CaptureError::DuplicationLost)
            }
            Err(e) => return Err(e.into()),
        }
        self.holding_frame = true;

        self.update_cursor(&frame_info);

        let resource = resource.ok_or_else(|| CaptureError::WindowsApi {
            message: "AcquireNextFrame returned no resource".to_string(),
            source: None,
        })?;
        let texture: ID3D11Texture2D = resource.cast()?;

        trace!(
            accumulated = frame_info.AccumulatedFrames,
            "acquired desktop frame"
        );
        Ok(FramePoll::Frame(texture))
    }

    /// Current cursor sprite and its output-relative position, if the
    /// pointer is visible and a shape has been seen.
    pub fn cursor(&self) -> Option<(&CursorSprite, i32, i32)> {
        if !self.cursor.visible {
            return None;
        }
        self.cursor
            .sprite
            .as_ref()
            .map(|sprite| (sprite, self.cursor.x, self.cursor.y))
    }

    fn update_cursor(&mut self, info: &DXGI_OUTDUPL_FRAME_INFO) {
        // Position and visibility are only meaningful when the mouse was
        // updated as part of this frame.
        if info.LastMouseUpdateTime != 0 {
            self.cursor.x = info.PointerPosition.Position.x;
            self.cursor.y = info.PointerPosition.Position.y;
            self.cursor.visible = info.PointerPosition.Visible.as_bool();
        }

        // A non-empty shape buffer means the shape changed this frame.
        if info.PointerShapeBufferSize == 0 {
            return;
        }

        let mut buf = vec![0u8; info.PointerShapeBufferSize as usize];
        let mut shape_info = DXGI_OUTDUPL_POINTER_SHAPE_INFO::default();
        let mut required = 0u32;
        let fetched = unsafe {
            self.duplication.GetFramePointerShape(
                buf.len() as u32,
                buf.as_mut_ptr().cast(),
                &mut required,
                &mut shape_info,
            )
        };
        if let Err(e) = fetched {
            warn!("failed to fetch pointer shape: {e}");
            return;
        }

        let width = shape_info.Width;
        let height = shape_info.Height;
        let pitch = shape_info.Pitch as usize;
        self.cursor.sprite = match shape_info.Type {
            t if t == DXGI_OUTDUPL_POINTER_SHAPE_TYPE_COLOR.0 as u32 => {
                Some(CursorSprite::from_color(&buf, width, height, pitch))
            }
            t if t == DXGI_OUTDUPL_POINTER_SHAPE_TYPE_MASKED_COLOR.0 as u32 => {
                Some(CursorSprite::from_masked_color(&buf, width, height, pitch))
            }
            t if t == DXGI_OUTDUPL_POINTER_SHAPE_TYPE_MONOCHROME.0 as u32 => {
                Some(CursorSprite::from_monochrome(&buf, width, height, pitch))
            }
            other => {
                warn!(shape_type = other, "unknown pointer shape type");
                None
            }
        };
    }
}

impl Drop for DuplicationSource {
    fn drop(&mut self) {
        if self.holding_frame {
            let _ = unsafe { self.duplication.ReleaseFrame() };
        }
    }
}
