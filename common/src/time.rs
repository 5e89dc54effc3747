//! Time utilities for tally
//!
//! Durations cross the wire as `i32` milliseconds; these helpers do the
//! clamping in one place.

use std::time::{Duration, Instant};

/// Convert a duration to whole milliseconds, saturating at `i32::MAX`.
pub fn duration_to_millis_i32(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

/// Convert a wire delay to a [`Duration`]. Negative delays count as zero.
pub fn millis_i32_to_duration(millis: i32) -> Duration {
    Duration::from_millis(millis.max(0) as u64)
}

/// Wall-clock timer started at construction.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_millis_i32(&self) -> i32 {
        duration_to_millis_i32(self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_millis_saturate() {
        assert_eq!(duration_to_millis_i32(Duration::from_millis(250)), 250);
        assert_eq!(
            duration_to_millis_i32(Duration::from_secs(u64::MAX / 1000)),
            i32::MAX
        );
    }

    #[test]
    fn test_negative_delay_is_zero() {
        assert_eq!(millis_i32_to_duration(-5), Duration::ZERO);
        assert_eq!(millis_i32_to_duration(7), Duration::from_millis(7));
    }

    #[test]
    fn test_stopwatch_advances() {
        let watch = Stopwatch::start();
        thread::sleep(Duration::from_millis(10));

        assert!(watch.elapsed() >= Duration::from_millis(10));
        assert!(watch.elapsed_millis_i32() >= 10);
    }
}
