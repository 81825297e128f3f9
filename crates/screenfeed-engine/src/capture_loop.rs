use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, warn};

use screenfeed_capture::{CaptureError, FrameProducer};
use screenfeed_ipc::StopReason;

use crate::fps::FpsMeter;
use crate::CaptureObserver;

/// Transient failures tolerated before the loop gives up. Only a
/// delivered frame resets the streak; empty polls leave it untouched.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// How long each fps sampling window lasts.
    pub fps_window: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fps_window: Duration::from_secs(1),
        }
    }
}

/// Pumps the producer until stopped or broken, feeding frames and fps
/// samples to the observer. The producer is torn down before the exit
/// reason is returned.
pub fn run_capture_loop(
    mut producer: Box<dyn FrameProducer>,
    observer: &dyn CaptureObserver,
    should_stop: &AtomicBool,
    config: LoopConfig,
) -> StopReason {
    let geometry = producer.geometry();
    debug!(
        width = geometry.width,
        height = geometry.height,
        "capture loop started"
    );

    let mut fps = FpsMeter::new(config.fps_window);
    let mut consecutive_failures: u32 = 0;

    let reason = loop {
        if should_stop.load(Ordering::SeqCst) {
            break StopReason::UserRequested;
        }

        match producer.poll_frame() {
            Ok(Some(frame)) => {
                consecutive_failures = 0;
                observer.on_frame(frame);
                fps.record_frame();
            }
            // Desktop unchanged; the acquire call already waited.
            Ok(None) => {}
            Err(CaptureError::DuplicationLost) => {
                error!("desktop duplication lost; leaving capture loop");
                break StopReason::DuplicationLost;
            }
            Err(err) => {
                consecutive_failures += 1;
                warn!(
                    error = %err,
                    consecutive_failures,
                    "frame capture failed, skipping iteration"
                );
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("too many consecutive capture failures, giving up");
                    break StopReason::CaptureError {
                        message: err.to_string(),
                    };
                }
            }
        }

        if let Some(sample) = fps.sample() {
            observer.on_fps_sample(sample);
        }
    };

    drop(producer);
    debug!(?reason, "capture loop finished");
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::{Arc, Mutex};
    use std::thread;

    use bytes::Bytes;
    use screenfeed_capture::{CaptureGeometry, CaptureResult, EncodedFrame};

    struct SyntheticProducer {
        sequence: u64,
        delay: Duration,
    }

    impl SyntheticProducer {
        fn new(delay: Duration) -> Self {
            Self { sequence: 0, delay }
        }
    }

    impl FrameProducer for SyntheticProducer {
        fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
            thread::sleep(self.delay);
            let frame = EncodedFrame {
                data: Bytes::from_static(b"frame"),
                width: 4,
                height: 4,
                sequence: self.sequence,
            };
            self.sequence += 1;
            Ok(Some(frame))
        }

        fn geometry(&self) -> CaptureGeometry {
            CaptureGeometry {
                width: 4,
                height: 4,
            }
        }
    }

    struct FailingProducer;

    impl FrameProducer for FailingProducer {
        fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
            Err(CaptureError::Encode("synthetic failure".into()))
        }

        fn geometry(&self) -> CaptureGeometry {
            CaptureGeometry {
                width: 0,
                height: 0,
            }
        }
    }

    #[derive(Default)]
    struct Recording {
        sequences: Mutex<Vec<u64>>,
        fps_samples: Mutex<Vec<u32>>,
        ended: Mutex<Vec<StopReason>>,
    }

    impl CaptureObserver for Recording {
        fn on_frame(&self, frame: EncodedFrame) {
            self.sequences.lock().unwrap().push(frame.sequence);
        }

        fn on_fps_sample(&self, fps: u32) {
            self.fps_samples.lock().unwrap().push(fps);
        }

        fn on_session_ended(&self, reason: StopReason) {
            self.ended.lock().unwrap().push(reason);
        }
    }

    #[test]
    fn stop_flag_exits_with_user_requested() {
        let _ = tracing_subscriber::fmt::try_init();
        let observer = Arc::new(Recording::default());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let observer = Arc::clone(&observer);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                run_capture_loop(
                    Box::new(SyntheticProducer::new(Duration::from_millis(1))),
                    observer.as_ref(),
                    &stop,
                    LoopConfig::default(),
                )
            })
        };
        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::SeqCst);
        let reason = handle.join().unwrap();

        assert_eq!(reason, StopReason::UserRequested);
        let sequences = observer.sequences.lock().unwrap();
        assert!(!sequences.is_empty());
        // Frames arrive in submission order with no gaps.
        for (i, seq) in sequences.iter().enumerate() {
            assert_eq!(*seq, i as u64);
        }
    }

    #[test]
    fn fps_samples_track_the_window() {
        let observer = Arc::new(Recording::default());
        let stop = Arc::new(AtomicBool::new(false));
        let config = LoopConfig {
            fps_window: Duration::from_millis(50),
        };

        let handle = {
            let observer = Arc::clone(&observer);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                run_capture_loop(
                    Box::new(SyntheticProducer::new(Duration::from_millis(1))),
                    observer.as_ref(),
                    &stop,
                    config,
                )
            })
        };
        thread::sleep(Duration::from_millis(260));
        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        let samples = observer.fps_samples.lock().unwrap();
        // ~5 windows fit in 260 ms; allow scheduling jitter either way.
        assert!(
            (3..=7).contains(&samples.len()),
            "unexpected sample count {}",
            samples.len()
        );
        for sample in samples.iter() {
            assert!(*sample > 0);
        }
    }

    #[test]
    fn repeated_failures_exit_with_capture_error() {
        let observer = Recording::default();
        let stop = AtomicBool::new(false);

        let reason = run_capture_loop(
            Box::new(FailingProducer),
            &observer,
            &stop,
            LoopConfig::default(),
        );

        match reason {
            StopReason::CaptureError { message } => {
                assert!(message.contains("synthetic failure"));
            }
            other => panic!("expected CaptureError, got {other:?}"),
        }
        assert!(observer.sequences.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_polls_do_not_reset_the_failure_streak() {
        struct TimeoutThenError {
            polls: u32,
        }

        impl FrameProducer for TimeoutThenError {
            fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
                self.polls += 1;
                // Alternate empty poll / failure; no frame ever arrives.
                if self.polls % 2 == 1 {
                    Ok(None)
                } else {
                    Err(CaptureError::Encode("still broken".into()))
                }
            }

            fn geometry(&self) -> CaptureGeometry {
                CaptureGeometry {
                    width: 0,
                    height: 0,
                }
            }
        }

        let observer = Recording::default();
        let stop = AtomicBool::new(false);

        let reason = run_capture_loop(
            Box::new(TimeoutThenError { polls: 0 }),
            &observer,
            &stop,
            LoopConfig::default(),
        );
        assert!(matches!(reason, StopReason::CaptureError { .. }));
    }

    #[test]
    fn duplication_lost_exits_immediately() {
        struct LostProducer;

        impl FrameProducer for LostProducer {
            fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
                Err(CaptureError::DuplicationLost)
            }

            fn geometry(&self) -> CaptureGeometry {
                CaptureGeometry {
                    width: 0,
                    height: 0,
                }
            }
        }

        let observer = Recording::default();
        let stop = AtomicBool::new(false);

        let reason = run_capture_loop(
            Box::new(LostProducer),
            &observer,
            &stop,
            LoopConfig::default(),
        );
        assert_eq!(reason, StopReason::DuplicationLost);
    }

    #[test]
    fn a_success_resets_the_failure_streak() {
        struct Flaky {
            polls: Arc<AtomicU32>,
        }

        impl FrameProducer for Flaky {
            fn poll_frame(&mut self) -> CaptureResult<Option<EncodedFrame>> {
                let n = self.polls.fetch_add(1, Ordering::SeqCst);
                // Fail all but every eighth poll; never eight in a row.
                if n % 8 == 7 {
                    Ok(Some(EncodedFrame {
                        data: Bytes::from_static(b"frame"),
                        width: 1,
                        height: 1,
                        sequence: u64::from(n),
                    }))
                } else {
                    Err(CaptureError::Encode("flaky".into()))
                }
            }

            fn geometry(&self) -> CaptureGeometry {
                CaptureGeometry {
                    width: 1,
                    height: 1,
                }
            }
        }

        let observer = Arc::new(Recording::default());
        let stop = Arc::new(AtomicBool::new(false));
        let polls = Arc::new(AtomicU32::new(0));

        let handle = {
            let observer = Arc::clone(&observer);
            let stop = Arc::clone(&stop);
            let polls = Arc::clone(&polls);
            thread::spawn(move || {
                run_capture_loop(
                    Box::new(Flaky { polls }),
                    observer.as_ref(),
                    &stop,
                    LoopConfig::default(),
                )
            })
        };
        // Enough polls to cross the cap several times over if the
        // streak were not reset by successes.
        while polls.load(Ordering::SeqCst) < 40 {
            thread::sleep(Duration::from_millis(1));
        }
        stop.store(true, Ordering::SeqCst);
        let reason = handle.join().unwrap();

        assert_eq!(reason, StopReason::UserRequested);
        assert!(!observer.sequences.lock().unwrap().is_empty());
    }
}
