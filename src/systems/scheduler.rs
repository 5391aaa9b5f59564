//! Fixed-delay frame scheduling
//!
//! Each tick is scheduled a fixed delay after the previous one *finished*,
//! not on a fixed grid, so slow frames push every later frame back. There is
//! no drift compensation and no catch-up.

use web_time::{Duration, Instant};

/// Decides when the next frame is due
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_delay: Duration,
    initial_delay: Duration,
    next: Option<Instant>,
}

impl FrameScheduler {
    /// Scheduler with an explicit delay before the first and between later ticks
    pub fn new(initial_delay: Duration, frame_delay: Duration) -> Self {
        Self {
            frame_delay,
            initial_delay,
            next: None,
        }
    }

    /// Scheduler from millisecond values as found in configuration
    ///
    /// Negative or non-finite values are treated as zero.
    pub fn from_millis(initial_delay_ms: f32, frame_delay_ms: f32) -> Self {
        Self::new(millis(initial_delay_ms), millis(frame_delay_ms))
    }

    /// Begin ticking; the first tick is due after the initial delay
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.initial_delay);
        log::info!(
            "Frame loop started ({:?} between frames)",
            self.frame_delay
        );
    }

    /// Stop ticking; no tick is due until `start` is called again
    pub fn stop(&mut self) {
        if self.next.take().is_some() {
            log::info!("Frame loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// When the next tick is due, if running
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Whether a tick should run at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_some_and(|next| now >= next)
    }

    /// Record that a tick finished at `now` and schedule the next one
    pub fn complete(&mut self, now: Instant) {
        if self.next.is_some() {
            self.next = Some(now + self.frame_delay);
        }
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }
}

fn millis(ms: f32) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f32(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> FrameScheduler {
        FrameScheduler::new(Duration::from_millis(1), Duration::from_millis(16))
    }

    #[test]
    fn test_not_running_until_started() {
        let s = scheduler();
        assert!(!s.is_running());
        assert_eq!(s.deadline(), None);
        assert!(!s.is_due(Instant::now()));
    }

    #[test]
    fn test_first_tick_after_initial_delay() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.start(t0);
        assert!(s.is_running());
        assert!(!s.is_due(t0));
        assert!(s.is_due(t0 + Duration::from_millis(1)));
    }

    #[test]
    fn test_delay_measured_from_completion() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.start(t0);

        // A slow tick finishing 40ms late shifts the next deadline with it
        let finished = t0 + Duration::from_millis(41);
        s.complete(finished);
        assert_eq!(s.deadline(), Some(finished + Duration::from_millis(16)));
        assert!(!s.is_due(finished + Duration::from_millis(15)));
        assert!(s.is_due(finished + Duration::from_millis(16)));
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.start(t0);
        s.stop();
        assert!(!s.is_running());
        assert!(!s.is_due(t0 + Duration::from_secs(1)));

        // Completing after stop does not restart
        s.complete(t0);
        assert!(!s.is_running());
    }

    #[test]
    fn test_from_millis() {
        let s = FrameScheduler::from_millis(1.0, 16.7);
        assert!((s.frame_delay().as_secs_f32() - 0.0167).abs() < 1e-6);
        assert_eq!(FrameScheduler::from_millis(-5.0, f32::NAN).frame_delay(), Duration::ZERO);
    }
}
