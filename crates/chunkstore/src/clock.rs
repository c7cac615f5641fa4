//! Time source for record freshness.

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of the current time in unix nanoseconds.
#[auto_impl::auto_impl(&, Arc)]
pub trait Clock: Send + Sync {
    /// Current time, nanoseconds since the unix epoch.
    fn now_nanos(&self) -> i64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    /// Clock starting at `nanos`.
    pub fn new(nanos: i64) -> Self {
        Self(Arc::new(AtomicI64::new(nanos)))
    }

    /// Jump to `nanos`.
    pub fn set(&self, nanos: i64) {
        self.0.store(nanos, Ordering::SeqCst);
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(duration_nanos(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// `Duration` as signed nanoseconds, saturating at `i64::MAX`.
pub(crate) fn duration_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(10);
        let other = clock.clone();

        other.advance(Duration::from_nanos(5));
        assert_eq!(clock.now_nanos(), 15);

        clock.set(0);
        assert_eq!(other.now_nanos(), 0);
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(SystemClock.now_nanos() > 0);
    }
}
