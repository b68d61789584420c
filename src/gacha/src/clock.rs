//! Timestamps for history rows.

use std::sync::atomic::{AtomicI64, Ordering};

/// Source of unix timestamps (seconds)
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock that never hands out a timestamp older than one it already
/// returned, even if the system time is stepped back.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        let now = chrono::Utc::now().timestamp();
        let previous = self.last.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn at(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}
