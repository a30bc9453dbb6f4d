use std::time::{Duration, Instant};

use crate::shared::constants::FPS_WINDOW_MS;

/// Counts loop iterations over fixed wall-clock windows.
///
/// The published value is the number of iterations completed in the last
/// full window, so it only changes once per window.
#[derive(Debug)]
pub struct FpsCounter {
    window: Duration,
    window_start: Instant,
    count: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), Duration::from_millis(FPS_WINDOW_MS))
    }

    pub fn starting_at(start: Instant, window: Duration) -> Self {
        Self {
            window,
            window_start: start,
            count: 0,
            fps: 0,
        }
    }

    /// Last published rate.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Records one iteration; returns the new rate when a window closes.
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<u32> {
        self.count += 1;
        if now.saturating_duration_since(self.window_start) < self.window {
            return None;
        }
        self.fps = self.count;
        self.count = 0;
        self.window_start = now;
        Some(self.fps)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(FpsCounter::new().fps(), 0);
    }

    #[test]
    fn test_publishes_after_full_window() {
        let t0 = Instant::now();
        let mut counter = FpsCounter::starting_at(t0, SECOND);
        for i in 1..30 {
            assert_eq!(counter.tick_at(t0 + Duration::from_millis(i * 33)), None);
        }
        assert_eq!(counter.tick_at(t0 + SECOND), Some(30));
        assert_eq!(counter.fps(), 30);
    }

    #[test]
    fn test_resets_count_each_window() {
        let t0 = Instant::now();
        let mut counter = FpsCounter::starting_at(t0, SECOND);
        for i in 1..=10 {
            counter.tick_at(t0 + Duration::from_millis(i * 100));
        }
        assert_eq!(counter.fps(), 10);

        // second window starts at t0 + 1s
        let t1 = t0 + SECOND;
        for i in 1..=4 {
            counter.tick_at(t1 + Duration::from_millis(i * 250));
        }
        assert_eq!(counter.fps(), 4);
    }

    #[test]
    fn test_value_holds_between_windows() {
        let t0 = Instant::now();
        let mut counter = FpsCounter::starting_at(t0, SECOND);
        counter.tick_at(t0 + SECOND);
        assert_eq!(counter.fps(), 1);
        counter.tick_at(t0 + SECOND + Duration::from_millis(10));
        assert_eq!(counter.fps(), 1);
    }

    #[test]
    fn test_slow_iteration_reports_one() {
        let t0 = Instant::now();
        let mut counter = FpsCounter::starting_at(t0, SECOND);
        assert_eq!(counter.tick_at(t0 + Duration::from_secs(3)), Some(1));
    }
}
