//! Events sent from the engine to the consumer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::state::{SessionState, StopReason};
use crate::types::DisplayInfo;

/// Events the engine can publish to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaptureEvent {
    /// The engine is up and servicing commands.
    Ready,

    /// One encoded frame. Emitted once per successfully acquired and
    /// processed frame, strictly in acquisition order.
    Frame {
        /// Encoded image bytes (uncompressed 32-bit BMP).
        data: Bytes,

        /// Frame width in pixels.
        width: u32,

        /// Frame height in pixels.
        height: u32,

        /// Monotonically increasing sequence number within one session.
        sequence: u64,
    },

    /// Frames produced during the last measurement window (~1 s).
    Fps(u32),

    /// Result of a [`crate::CaptureCommand::ListDisplays`] query.
    Displays(Vec<DisplayInfo>),

    /// Current session state, in response to a state query.
    State(SessionState),

    /// The capture session ended and the engine is back to idle.
    SessionEnded { reason: StopReason },

    /// A command failed.
    Error { message: String },

    /// The engine has shut down.
    Shutdown,
}
