// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame rate overlay counter.

use std::time::{Duration, Instant};

/// Counts painted frames and reports a rounded rate once per interval.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    interval: Duration,
    frames: u32,
    window_start: Option<Instant>,
    fps: Option<u32>,
}

impl FpsCounter {
    /// Creates a counter that updates every `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            frames: 0,
            window_start: None,
            fps: None,
        }
    }

    /// Records a painted frame at `now`.
    pub fn frame_painted(&mut self, now: Instant) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return;
        };
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.interval {
            let rate = f64::from(self.frames) / elapsed.as_secs_f64();
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "frame rates are small and non-negative"
            )]
            let rounded = rate.round() as u32;
            self.fps = Some(rounded);
            self.frames = 0;
            self.window_start = Some(now);
        }
    }

    /// Returns the last reported rate, or `None` before the first interval
    /// has elapsed.
    #[must_use]
    pub fn fps(&self) -> Option<u32> {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_after_interval() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(Duration::from_secs(1));
        counter.frame_painted(start);
        for i in 1..60 {
            counter.frame_painted(start + Duration::from_millis(i * 10));
            assert_eq!(counter.fps(), None);
        }
        counter.frame_painted(start + Duration::from_secs(1));
        assert_eq!(counter.fps(), Some(60));
    }

    #[test]
    fn rate_holds_until_next_interval() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(Duration::from_millis(500));
        counter.frame_painted(start);
        counter.frame_painted(start + Duration::from_millis(500));
        assert_eq!(counter.fps(), Some(2));
        counter.frame_painted(start + Duration::from_millis(600));
        assert_eq!(counter.fps(), Some(2));
    }
}
