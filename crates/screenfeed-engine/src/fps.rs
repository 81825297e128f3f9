use std::time::{Duration, Instant};

/// Windowed frame-rate counter. Counts frames until the window
/// elapses, then reports the total and starts a fresh window.
pub struct FpsMeter {
    window: Duration,
    window_start: Instant,
    frames_in_window: u32,
}

impl FpsMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            frames_in_window: 0,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_in_window += 1;
    }

    /// Returns the count for the current window once it has elapsed,
    /// resetting the counter. `None` while the window is still open.
    pub fn sample(&mut self) -> Option<u32> {
        if self.window_start.elapsed() < self.window {
            return None;
        }
        let fps = self.frames_in_window;
        self.frames_in_window = 0;
        self.window_start = Instant::now();
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn no_sample_before_window_elapses() {
        let mut meter = FpsMeter::new(Duration::from_secs(60));
        meter.record_frame();
        assert_eq!(meter.sample(), None);
    }

    #[test]
    fn sample_reports_count_and_resets() {
        let mut meter = FpsMeter::new(Duration::from_millis(20));
        for _ in 0..7 {
            meter.record_frame();
        }
        thread::sleep(Duration::from_millis(30));
        assert_eq!(meter.sample(), Some(7));

        // New window starts empty.
        meter.record_frame();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(meter.sample(), Some(1));
    }
}
