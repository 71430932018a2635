use std::time::Duration;

use crate::clock::Clock;

/// Caps the frame loop at a fixed rate by sleeping away the remainder of
/// each frame budget, and records actual frame times for diagnostics.
#[derive(Clone)]
pub struct FrameLimiter<C: Clock> {
    clock: C,
    budget: Duration,
    frame_start: C::Timestamp,
}

impl<C: Clock> FrameLimiter<C> {
    pub fn new(clock: C, target_fps: u32) -> Self {
        let budget = Duration::from_secs(1) / target_fps.max(1);
        let frame_start = clock.now();
        Self {
            clock,
            budget,
            frame_start,
        }
    }

    /// Called once per frame after update and render.
    pub fn wait(&mut self) {
        let elapsed = self.clock.elapsed(self.frame_start);
        if elapsed < self.budget {
            self.clock.sleep(self.budget - elapsed);
        }
        let frame_time = self.clock.elapsed(self.frame_start);
        self.clock.record_frame(frame_time);
        self.frame_start = self.clock.now();
    }

    pub fn stats(&self) -> crate::clock::FrameStats {
        self.clock.frame_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn wait_sleeps_up_to_the_frame_budget() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let mut limiter = FrameLimiter::new(clock, 50); // 20 ms budget

        let start = handle.now();
        handle.advance_ms(5); // frame work took 5 ms
        limiter.wait();
        assert_eq!(handle.elapsed_ms(start), 20);
    }

    #[test]
    fn wait_does_not_sleep_past_an_overrun_frame() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let mut limiter = FrameLimiter::new(clock, 50);

        let start = handle.now();
        handle.advance_ms(30); // already over budget
        limiter.wait();
        assert_eq!(handle.elapsed_ms(start), 30);
    }
}
