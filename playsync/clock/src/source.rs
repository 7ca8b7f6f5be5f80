/*!
    Sources of system time.
*/

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use playsync_types::{SystemTs, Ticks};

/**
    Trait for system-time sources.

    The clock itself never reads the time; producers and consumers pass
    `now` in. A source is how they obtain it. The only requirement is that
    successive readings never decrease.
*/
pub trait TimeSource: Send + Sync {
    /// Current system time in ticks.
    fn now(&self) -> SystemTs;
}

/**
    Host monotonic time, in ticks since the source was created.
*/
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    start: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now(&self) -> SystemTs {
        SystemTs(Ticks::from_duration(self.start.elapsed()).0)
    }
}

/**
    Hand-driven time, for tests.
*/
#[derive(Debug, Default)]
pub struct ManualSource {
    now: AtomicI64,
}

impl ManualSource {
    pub fn new(start: SystemTs) -> Self {
        Self {
            now: AtomicI64::new(start.0),
        }
    }

    /**
        Move to `ts`. Moving backwards is ignored so readings stay monotonic.
    */
    pub fn set(&self, ts: SystemTs) {
        self.now.fetch_max(ts.0, Ordering::AcqRel);
    }

    /**
        Move forward by `by` and return the new time. Negative spans are ignored.
    */
    pub fn advance(&self, by: Ticks) -> SystemTs {
        let by = by.0.max(0);
        SystemTs(self.now.fetch_add(by, Ordering::AcqRel).saturating_add(by))
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> SystemTs {
        SystemTs(self.now.load(Ordering::Acquire))
    }
}

static_assertions::assert_impl_all!(MonotonicSource: Send, Sync, TimeSource);
static_assertions::assert_impl_all!(ManualSource: Send, Sync, TimeSource);
