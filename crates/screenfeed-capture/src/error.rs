//! Error types for the capture crate.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Windows API error.
    #[error("Windows API error: {message}")]
    WindowsApi {
        message: String,
        #[cfg(target_os = "windows")]
        #[source]
        source: Option<windows::core::Error>,
    },

    /// The requested (adapter, output) pair does not exist in the current
    /// enumeration snapshot.
    #[error("no display at adapter {adapter_index}, output {output_index}")]
    DisplayOutOfRange {
        adapter_index: u32,
        output_index: u32,
    },

    /// The output does not support duplication, or it is already duplicated
    /// by another consumer.
    #[error("output duplication unavailable: {0}")]
    DuplicationUnavailable(String),

    /// The duplication interface was lost and must be recreated together
    /// with the capture device before capture can resume.
    #[error("output duplication lost")]
    DuplicationLost,

    /// Frame encoding failed.
    #[error("frame encoding failed: {0}")]
    Encode(String),

    /// A capture session is already running.
    #[error("capture session already running")]
    AlreadyRunning,

    /// Screen capture is not supported on this platform.
    #[error("screen capture not supported on this platform")]
    NotSupported,
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for CaptureError {
    fn from(err: windows::core::Error) -> Self {
        Self::WindowsApi {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}
