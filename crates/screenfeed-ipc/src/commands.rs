//! Commands sent from the consumer to the engine.

use serde::{Deserialize, Serialize};

use crate::types::DisplayInfo;

/// Commands the consumer can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaptureCommand {
    /// Start capturing the currently selected display.
    Start,

    /// Stop the running capture, if any.
    Stop,

    /// Change the capture target. Rejected while a session is running.
    SelectDisplay(DisplayInfo),

    /// Request the list of capturable displays.
    ListDisplays,

    /// Request the current session state.
    GetState,

    /// Stop capturing and shut the engine down.
    Shutdown,
}
