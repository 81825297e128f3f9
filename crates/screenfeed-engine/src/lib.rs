//! Capture engine: session lifecycle, the frame pump, and the
//! command loop that drives both over channels.

pub mod capture_loop;
pub mod fps;
pub mod runner;
pub mod session;

pub use capture_loop::{run_capture_loop, LoopConfig, MAX_CONSECUTIVE_FAILURES};
pub use fps::FpsMeter;
pub use runner::Engine;
pub use session::{CaptureSession, ProducerFactory};

use screenfeed_capture::EncodedFrame;
use screenfeed_ipc::StopReason;

/// Sink for everything a running capture session produces.
///
/// Callbacks are invoked from the capture thread, so implementations
/// must be cheap or hand off to a channel.
pub trait CaptureObserver: Send + Sync {
    fn on_frame(&self, frame: EncodedFrame);

    /// Frames delivered over the last sampling window.
    fn on_fps_sample(&self, fps: u32);

    /// The session exited; exactly one call per started session.
    fn on_session_ended(&self, reason: StopReason);
}
