use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use screenfeed_capture::{
    create_producer, enumerate_displays, CaptureError, CaptureResult, FrameProducer,
};
use screenfeed_ipc::{DisplayInfo, SessionState, StopReason};

use crate::capture_loop::{run_capture_loop, LoopConfig};
use crate::CaptureObserver;

/// Builds a boxed producer for a display; the seam through which
/// tests substitute synthetic frame sources for the DXGI backend.
pub type ProducerFactory =
    Box<dyn Fn(&DisplayInfo) -> CaptureResult<Box<dyn FrameProducer>> + Send + Sync>;

/// One capture session: owns the target display selection, the capture
/// thread, and the state machine visible to callers.
///
/// States move `Idle -> Running` on [`CaptureSession::start`] and
/// `Running -> Stopping -> Idle` on [`CaptureSession::stop`]. A session
/// that loses its duplication interface returns to `Idle` on its own
/// and reports the reason through the observer.
pub struct CaptureSession {
    observer: Arc<dyn CaptureObserver>,
    state: Arc<RwLock<SessionState>>,
    selected: DisplayInfo,
    producer_factory: ProducerFactory,
    should_stop: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
    fps_window: Duration,
}

impl CaptureSession {
    /// Session bound to the platform capture backend.
    pub fn new(display: DisplayInfo, observer: Arc<dyn CaptureObserver>) -> Self {
        Self::with_producer_factory(
            display,
            observer,
            Box::new(|display| {
                let producer = create_producer(display)?;
                Ok(Box::new(producer) as Box<dyn FrameProducer>)
            }),
        )
    }

    /// Session with a caller-supplied producer factory. Lets tests run
    /// the full lifecycle against synthetic frame sources.
    pub fn with_producer_factory(
        display: DisplayInfo,
        observer: Arc<dyn CaptureObserver>,
        producer_factory: ProducerFactory,
    ) -> Self {
        Self {
            observer,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            selected: display,
            producer_factory,
            should_stop: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            fps_window: Duration::from_secs(1),
        }
    }

    /// Override the fps sampling window. Tests shrink it so rate
    /// samples arrive within a few hundred milliseconds.
    pub fn set_fps_window(&mut self, window: Duration) {
        self.fps_window = window;
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn selected_display(&self) -> &DisplayInfo {
        &self.selected
    }

    /// Attached displays, as reported by the capture backend.
    pub fn list_displays(&self) -> CaptureResult<Vec<DisplayInfo>> {
        enumerate_displays()
    }

    /// Builds the producer for the selected display on the caller's
    /// thread, so initialization failures surface synchronously, then
    /// hands it to a freshly spawned capture thread.
    #[instrument(skip(self), fields(display = %self.selected))]
    pub fn start(&mut self) -> CaptureResult<()> {
        // A loop that exited on its own (lost duplication, repeated
        // failures) already flipped the state to Idle but its handle is
        // still stored; reap it so the session can be restarted without
        // an explicit stop().
        if self.state().is_idle() {
            if let Some(handle) = self.capture_thread.take() {
                if handle.join().is_err() {
                    warn!("capture thread panicked");
                }
            }
        }

        if !self.state().is_idle() || self.capture_thread.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        let producer = (self.producer_factory)(&self.selected)?;

        self.should_stop.store(false, Ordering::SeqCst);
        *self.state.write() = SessionState::Running;

        let observer = Arc::clone(&self.observer);
        let state = Arc::clone(&self.state);
        let should_stop = Arc::clone(&self.should_stop);
        let config = LoopConfig {
            fps_window: self.fps_window,
        };
        self.capture_thread = Some(std::thread::spawn(move || {
            let reason = run_capture_loop(producer, observer.as_ref(), &should_stop, config);
            *state.write() = SessionState::Idle;
            observer.on_session_ended(reason);
        }));

        info!("capture session started");
        Ok(())
    }

    /// Signals the capture thread and waits for it to exit. Idempotent;
    /// a no-op when nothing is running.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        let Some(handle) = self.capture_thread.take() else {
            return;
        };

        if self.state().is_running() {
            *self.state.write() = SessionState::Stopping;
        }
        self.should_stop.store(true, Ordering::SeqCst);
        if handle.join().is_err() {
            warn!("capture thread panicked");
        }
        *self.state.write() = SessionState::Idle;
        info!("capture session stopped");
    }

    /// Retargets the session to another display. Rejected while a
    /// capture is running, and the new target must exist; on any error
    /// the current selection is left untouched.
    pub fn select_display(&mut self, display: DisplayInfo) -> CaptureResult<()> {
        if !self.state().is_idle() {
            return Err(CaptureError::AlreadyRunning);
        }

        let known = self.list_displays()?;
        let exists = known.iter().any(|d| {
            d.adapter_index == display.adapter_index && d.output_index == display.output_index
        });
        if !exists {
            return Err(CaptureError::DisplayOutOfRange {
                adapter_index: display.adapter_index,
                output_index: display.output_index,
            });
        }

        self.selected = display;
        info!(display = %self.selected, "display selected");
        Ok(())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
