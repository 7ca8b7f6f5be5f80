use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{trace, warn};

use playsync_clock::{ClockReader, ClockView, MonotonicSource, TimeSource};
use playsync_types::{ClockError, Deadline, StreamTs, SystemTs, Ticks};

use crate::queue::FrameQueue;
use crate::stats::SharedStats;

/// Longest uninterrupted sleep, so stop requests and new deadlines are noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/**
    The render thread: presents queued units at their deadlines plus the
    clock's buffering margin, and drains the queue once `stop` is raised.

    With nothing queued it sleeps toward the clock's wake-up deadline for
    the next expected unit.
*/
pub fn run(
    reader: ClockReader,
    queue: Arc<FrameQueue>,
    bound: Ticks,
    source: MonotonicSource,
    stats: SharedStats,
    stop: Arc<AtomicBool>,
) {
    loop {
        if let Some(ts) = queue.pop() {
            present(&reader, ts, bound, &source, &stats);
            continue;
        }
        if stop.load(Ordering::Acquire) && queue.is_empty() {
            break;
        }

        let generation = reader.generation();
        match reader.wakeup() {
            Deadline::At(deadline) => {
                if wait_for(&reader, &source, deadline, generation) && queue.is_empty() {
                    // the unit the clock expected has not been decoded yet
                    stats.lock().idle_polls += 1;
                    thread::sleep(POLL_INTERVAL);
                }
            }
            Deadline::Indefinite => {
                stats.lock().idle_polls += 1;
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/**
    Wait for the presentation time of one unit, re-converting whenever the
    clock publishes a change, then record how far off the wake-up was.

    Units converting beyond `bound` are dropped.
*/
fn present(
    reader: &ClockReader,
    ts: StreamTs,
    bound: Ticks,
    source: &MonotonicSource,
    stats: &SharedStats,
) {
    loop {
        let generation = reader.generation();
        let conversion = match reader.convert_now(ts, None, Some(bound), source) {
            Ok(conversion) => conversion,
            Err(ClockError::BoundExceeded { deadline, limit }) => {
                warn!(
                    "stream {} would wait until {} (limit {}), dropping",
                    ts.0, deadline.0, limit.0
                );
                stats.lock().bound_exceeded += 1;
                return;
            }
            Err(ClockError::NoReference) => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(e) => {
                warn!("conversion of stream {} failed: {e}", ts.0);
                return;
            }
        };

        let Deadline::At(deadline) = conversion.ts0 else {
            // paused
            stats.lock().idle_polls += 1;
            thread::sleep(POLL_INTERVAL);
            continue;
        };

        let target = deadline + reader.jitter();
        if wait_for(reader, source, target, generation) {
            let woke = source.now();
            trace!("stream {} presented at {} (target {})", ts.0, woke.0, target.0);
            let mut shared = stats.lock();
            shared.conversions += 1;
            shared.record_wakeup(woke - target);
            return;
        }
    }
}

/**
    Sleep until `deadline` in short steps.

    Returns false when woken early because the clock published something
    new, and the caller should re-query.
*/
fn wait_for(
    reader: &ClockReader,
    source: &MonotonicSource,
    deadline: SystemTs,
    generation: u64,
) -> bool {
    loop {
        let remaining = deadline - source.now();
        if remaining <= Ticks::ZERO {
            return true;
        }
        if reader.generation() != generation {
            return false;
        }
        thread::sleep(remaining.to_duration().min(POLL_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;
    use playsync_clock::{ClockConfig, ClockCore, UpdateFlags};
    use playsync_types::Rational;

    fn clock() -> ClockCore {
        let config = ClockConfig::new().with_minimum_delay(Ticks::from_millis(1));
        ClockCore::new(config, Rational::ONE).unwrap()
    }

    #[test]
    fn wait_for_past_deadline_returns_immediately() {
        let clock = clock();
        let reader = clock.reader();
        let source = MonotonicSource::new();
        assert!(wait_for(&reader, &source, SystemTs(0), 0));
    }

    #[test]
    fn wait_for_stops_early_on_new_generation() {
        let clock = clock();
        let reader = clock.reader();
        let source = MonotonicSource::new();
        let far = source.now() + Ticks::from_secs(60);
        assert!(!wait_for(&reader, &source, far, 99));
    }

    #[test]
    fn presents_due_units_and_drops_far_ones() {
        let source = MonotonicSource::new();
        let mut clock = clock();
        clock.update(StreamTs(0), source.now(), UpdateFlags::paced());

        let queue = Arc::new(FrameQueue::new());
        queue.push(StreamTs(0));
        queue.push(StreamTs(0) + Ticks::from_secs(30));
        queue.push(StreamTs(1000));

        let shared = stats::shared();
        let stop = Arc::new(AtomicBool::new(true));
        run(
            clock.reader(),
            queue.clone(),
            Ticks::from_secs(1),
            source,
            shared.clone(),
            stop,
        );

        assert!(queue.is_empty());
        let stats = shared.lock();
        assert_eq!(stats.conversions, 2);
        assert_eq!(stats.bound_exceeded, 1);
        assert_eq!(stats.wakeups, 2);
    }
}
