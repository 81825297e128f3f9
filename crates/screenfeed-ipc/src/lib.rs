//! Typed consumer<->engine messages for screenfeed.
//!
//! This crate defines the message types exchanged between a front-end
//! consumer and the capture engine, plus the bounded channels that carry
//! them.

mod commands;
mod events;
mod state;
mod types;

pub use commands::CaptureCommand;
pub use events::CaptureEvent;
pub use state::{SessionState, StopReason};
pub use types::DisplayInfo;

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (consumer → engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (engine → consumer).
///
/// Events include full frame payloads, so the buffer is kept small: a
/// consumer that falls behind misses frames instead of accumulating them.
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<CaptureCommand>, Receiver<CaptureCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<CaptureEvent>, Receiver<CaptureEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
