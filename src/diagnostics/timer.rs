//! Aggregate wall-clock timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Accumulates the total time spent inside timed sections.
///
/// Sections may overlap across threads; each contributes its own elapsed
/// time. The total saturates at `u64::MAX` nanoseconds.
#[derive(Debug, Default)]
pub struct AggregateTimer {
    total_nanos: AtomicU64,
}

impl AggregateTimer {
    /// Creates a timer with a zero total.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_nanos: AtomicU64::new(0),
        }
    }

    /// Starts a timed section that ends when the returned guard is dropped.
    #[must_use = "the section ends as soon as the guard is dropped"]
    pub fn start_timer(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            started: Instant::now(),
        }
    }

    /// Total time accumulated so far.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    fn add(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .total_nanos
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(nanos))
            });
    }
}

/// Guard for one timed section of an [`AggregateTimer`].
pub struct TimerGuard<'a> {
    timer: &'a AggregateTimer,
    started: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.add(self.started.elapsed());
    }
}
