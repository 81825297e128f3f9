use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{info, instrument, warn};

use screenfeed_capture::{enumerate_displays, EncodedFrame};
use screenfeed_ipc::{CaptureCommand, CaptureEvent, DisplayInfo, StopReason};

use crate::session::{CaptureSession, ProducerFactory};
use crate::CaptureObserver;

/// Forwards capture output onto the event channel. Events are dropped
/// rather than blocking the capture thread when the consumer lags.
struct ChannelForwarder {
    event_tx: Sender<CaptureEvent>,
}

impl ChannelForwarder {
    fn publish(&self, event: CaptureEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl CaptureObserver for ChannelForwarder {
    fn on_frame(&self, frame: EncodedFrame) {
        self.publish(CaptureEvent::Frame {
            data: frame.data,
            width: frame.width,
            height: frame.height,
            sequence: frame.sequence,
        });
    }

    fn on_fps_sample(&self, fps: u32) {
        self.publish(CaptureEvent::Fps(fps));
    }

    fn on_session_ended(&self, reason: StopReason) {
        self.publish(CaptureEvent::SessionEnded { reason });
    }
}

/// Command loop that owns a [`CaptureSession`] and talks to a consumer
/// over a command/event channel pair.
pub struct Engine {
    command_rx: Receiver<CaptureCommand>,
    event_tx: Sender<CaptureEvent>,
    session: CaptureSession,
}

impl Engine {
    /// Engine targeting the first enumerated display, falling back to
    /// adapter 0, output 0 when none can be listed yet.
    pub fn new(command_rx: Receiver<CaptureCommand>, event_tx: Sender<CaptureEvent>) -> Self {
        let initial = match enumerate_displays() {
            Ok(displays) => displays.into_iter().next(),
            Err(err) => {
                warn!(error = %err, "display enumeration failed, defaulting to adapter 0, output 0");
                None
            }
        }
        .unwrap_or_else(|| DisplayInfo::new(0, 0, "primary"));
        let observer = Arc::new(ChannelForwarder {
            event_tx: event_tx.clone(),
        });
        let session = CaptureSession::new(initial, observer);
        Self {
            command_rx,
            event_tx,
            session,
        }
    }

    /// Engine whose session uses a caller-supplied producer factory.
    pub fn with_producer_factory(
        command_rx: Receiver<CaptureCommand>,
        event_tx: Sender<CaptureEvent>,
        factory: ProducerFactory,
    ) -> Self {
        let observer = Arc::new(ChannelForwarder {
            event_tx: event_tx.clone(),
        });
        let session = CaptureSession::with_producer_factory(
            DisplayInfo::new(0, 0, "primary"),
            observer,
            factory,
        );
        Self {
            command_rx,
            event_tx,
            session,
        }
    }

    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    /// Blocks servicing commands until [`CaptureCommand::Shutdown`]
    /// arrives or every command sender is dropped. Any session still
    /// running is stopped on the way out.
    pub fn run(&mut self) {
        info!("engine started");
        self.send_event(CaptureEvent::Ready);

        while let Ok(command) = self.command_rx.recv() {
            if !self.handle_command(command) {
                break;
            }
        }

        self.session.stop();
        self.send_event(CaptureEvent::Shutdown);
        info!("engine stopped");
    }

    /// Returns `false` when the engine should exit its loop.
    #[instrument(skip(self))]
    fn handle_command(&mut self, command: CaptureCommand) -> bool {
        match command {
            CaptureCommand::Start => {
                if let Err(err) = self.session.start() {
                    warn!(error = %err, "failed to start capture");
                    self.send_event(CaptureEvent::Error {
                        message: err.to_string(),
                    });
                }
            }
            CaptureCommand::Stop => {
                self.session.stop();
            }
            CaptureCommand::SelectDisplay(display) => {
                if let Err(err) = self.session.select_display(display) {
                    warn!(error = %err, "failed to select display");
                    self.send_event(CaptureEvent::Error {
                        message: err.to_string(),
                    });
                }
            }
            CaptureCommand::ListDisplays => match self.session.list_displays() {
                Ok(displays) => self.send_event(CaptureEvent::Displays(displays)),
                Err(err) => self.send_event(CaptureEvent::Error {
                    message: err.to_string(),
                }),
            },
            CaptureCommand::GetState => {
                self.send_event(CaptureEvent::State(self.session.state()));
            }
            CaptureCommand::Shutdown => {
                info!("shutdown requested");
                return false;
            }
        }
        true
    }

    fn send_event(&self, event: CaptureEvent) {
        if let Err(TrySendError::Full(event)) = self.event_tx.try_send(event) {
            warn!(?event, "event channel full, dropping event");
        }
    }
}
