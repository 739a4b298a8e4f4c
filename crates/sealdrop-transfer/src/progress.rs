//! Throttled progress reporting
//!
//! Callbacks run on the transfer's own thread of control at segment
//! boundaries; a callback that blocks stalls the transfer.

use std::time::{Duration, Instant};

/// Progress callback: percentage (0–100) of total encrypted bytes moved.
pub type ProgressFn = Box<dyn Fn(f64) + Send + Sync>;

/// Minimum interval between progress reports.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(250);

/// Rate limiter: at most one report per interval, plus a guaranteed report
/// at completion.
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a report should fire now. `done` forces the final report.
    pub fn should_report(&mut self, done: bool) -> bool {
        if done {
            self.last = Some(Instant::now());
            return true;
        }
        match self.last {
            Some(last) if last.elapsed() < self.interval => false,
            _ => {
                self.last = Some(Instant::now());
                true
            }
        }
    }
}

/// Percentage of `done` against `total`, clamped to 100.
pub(crate) fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_fires_then_throttles() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(60));
        assert!(throttle.should_report(false));
        assert!(!throttle.should_report(false));
        assert!(!throttle.should_report(false));
    }

    #[test]
    fn completion_always_reports() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(60));
        assert!(throttle.should_report(false));
        assert!(throttle.should_report(true));
    }

    #[test]
    fn elapsed_interval_reopens() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(0));
        assert!(throttle.should_report(false));
        assert!(throttle.should_report(false));
    }

    #[test]
    fn percent_clamps() {
        assert_eq!(percent(0, 100), 0.0);
        assert_eq!(percent(50, 100), 50.0);
        assert_eq!(percent(200, 100), 100.0);
        assert_eq!(percent(0, 0), 100.0);
    }
}
