use std::thread;
use std::time::{Duration, Instant};

use crate::shutdown::ControlSignals;

/// Source of time for pacing, backoff and the watchdog heartbeat.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Uninterruptible suspension, used for per-character pacing.
    fn sleep(&self, duration: Duration);

    /// Backoff wait. Implementations may return early once shutdown is requested.
    fn wait(&self, duration: Duration, signals: &ControlSignals);
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    fn wait(&self, duration: Duration, signals: &ControlSignals) {
        signals.wait_timeout(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }

    fn wait(&self, duration: Duration, signals: &ControlSignals) {
        (**self).wait(duration, signals)
    }
}
