//! Session state machine types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a capture session.
///
/// Transitions: `Idle → Running` on start, `Running → Stopping` when the
/// stop flag is raised, `Stopping → Idle` once the capture thread has
/// released its GPU resources and exited. A session that dies on its own
/// (lost duplication, repeated capture failures) goes straight back to
/// `Idle` after notifying the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No capture thread is running.
    #[default]
    Idle,

    /// The capture loop is producing frames.
    Running,

    /// The stop flag is set; the capture thread is tearing down.
    Stopping,
}

impl SessionState {
    /// Returns true if no capture thread is running.
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if the capture loop is active.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if teardown is in progress.
    pub fn is_stopping(self) -> bool {
        matches!(self, Self::Stopping)
    }

    /// Simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }
}

/// Why a capture session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The consumer called stop.
    UserRequested,

    /// The duplication interface was lost (device removed, display mode
    /// change, exclusive-access conflict). The session must be restarted
    /// explicitly.
    DuplicationLost,

    /// Repeated capture failures demoted the session.
    CaptureError { message: String },
}

impl StopReason {
    /// Returns a display message for this reason.
    pub fn message(&self) -> String {
        match self {
            Self::UserRequested => "capture stopped by user".to_string(),
            Self::DuplicationLost => {
                "output duplication lost; restart the session to resume".to_string()
            }
            Self::CaptureError { message } => format!("capture error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_predicates() {
        assert!(SessionState::Idle.is_idle());
        assert!(SessionState::Running.is_running());
        assert!(SessionState::Stopping.is_stopping());
        assert!(!SessionState::Running.is_idle());
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn reason_messages_identify_the_condition() {
        assert!(StopReason::DuplicationLost.message().contains("duplication"));
        let reason = StopReason::CaptureError {
            message: "map failed".into(),
        };
        assert!(reason.message().contains("map failed"));
    }
}
