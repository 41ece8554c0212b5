use std::time::{Duration, Instant};

/// Caps the frame rate by sleeping after present.
///
/// Frames that already took longer than a slightly shorter budget (1/65 s for a
/// 60 fps target) are not delayed, so a frame that narrowly misses vsync does
/// not get pushed out by another full interval.
pub struct FrameLimiter {
    reference: Instant,
    min_time: Option<Duration>,
    min_check_time: Duration,
}

impl FrameLimiter {
    /// `target_fps == 0` disables the limiter.
    pub fn new(target_fps: u32) -> Self {
        let (min_time, min_check_time) = if target_fps == 0 {
            (None, Duration::ZERO)
        } else {
            (
                Some(Duration::from_secs_f64(1.0 / f64::from(target_fps))),
                Duration::from_secs_f64(1.0 / f64::from(target_fps + 5)),
            )
        };

        Self {
            reference: Instant::now(),
            min_time,
            min_check_time,
        }
    }

    /// Blocks until the frame budget has elapsed and returns the frame time.
    pub fn wait(&mut self) -> Duration {
        if let Some(min_time) = self.min_time {
            let elapsed = self.reference.elapsed();
            if elapsed < self.min_check_time {
                while self.reference.elapsed() < min_time {
                    let remaining = min_time.saturating_sub(self.reference.elapsed());
                    std::thread::sleep(remaining.min(Duration::from_millis(1)));
                }
            }
        }

        let now = Instant::now();
        let frame_time = now - self.reference;
        self.reference = now;
        frame_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_are_stretched_to_the_budget() {
        let mut limiter = FrameLimiter::new(100);
        let frame_time = limiter.wait();
        assert!(frame_time >= Duration::from_millis(10), "{frame_time:?}");
    }

    #[test]
    fn long_frames_are_not_delayed() {
        let mut limiter = FrameLimiter::new(100);
        std::thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait();
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn zero_disables_the_limiter() {
        let mut limiter = FrameLimiter::new(0);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
