use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use playsync_clock::{ClockCore, ClockView, MonotonicSource, TimeSource, UpdateFlags};
use playsync_types::{Rational, StreamTs, SystemTs, Ticks};

use crate::queue::FrameQueue;
use crate::stats::SharedStats;

/// How far a corrupted unit's timestamp is pushed into the future.
const CORRUPT_OFFSET: Ticks = Ticks::from_secs(10);

/**
    Settings for the simulated demux/decode thread.
*/
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub frames: u64,
    /// Stream distance between consecutive units.
    pub frame_ticks: Ticks,
    /// Largest timing error added to an observation, in either direction.
    pub jitter: Ticks,
    pub seed: u64,
    /// Pause before feeding this frame.
    pub pause_at: Option<u64>,
    pub pause: Ticks,
    /// Every n-th decoded unit carries a bogus timestamp far in the future.
    pub corrupt_every: Option<u64>,
    pub flags: UpdateFlags,
}

/**
    Feed the clock one unit per frame interval, queue each decoded unit for
    the renderer, then raise `stop`.

    The clock is owned here: this thread is the only writer. It is handed
    back so the caller can read the final counters.
*/
pub fn run(
    mut clock: ClockCore,
    config: ProducerConfig,
    source: MonotonicSource,
    queue: Arc<FrameQueue>,
    stats: SharedStats,
    stop: Arc<AtomicBool>,
) -> ClockCore {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = source.now();
    let mut paused_for = Ticks::ZERO;

    for frame in 0..config.frames {
        if config.pause_at == Some(frame) {
            let at = source.now();
            clock.change_pause(true, at);
            info!("paused at frame {frame}");
            thread::sleep(config.pause.to_duration());
            let resumed = source.now();
            clock.change_pause(false, resumed);
            paused_for += resumed - at;
            info!("resumed after {} us", (resumed - at).0);
        }

        let stream = StreamTs(frame as i64 * config.frame_ticks.0);
        let ideal = start + paused_for + system_span(clock.rate(), stream);
        sleep_until(&source, ideal);

        let noise = if config.jitter > Ticks::ZERO {
            Ticks(rng.gen_range(-config.jitter.0..=config.jitter.0))
        } else {
            Ticks::ZERO
        };
        let observed = source.now() + noise;

        let outcome = clock.update(stream, observed, config.flags);
        queue.push(presented_ts(stream, frame, config.corrupt_every));

        let mut shared = stats.lock();
        shared.frames_fed += 1;
        if outcome.is_late() {
            debug!("frame {frame} late by {} us", outcome.margin().0);
            shared.record_late(outcome.margin());
        }
    }

    stats.lock().record_clock(clock.stats(), clock.jitter());
    stop.store(true, Ordering::Release);
    clock
}

/**
    System time the stream has taken since zero at `rate`.
*/
fn system_span(rate: Rational, stream: StreamTs) -> Ticks {
    rate.unscale_ticks(stream - StreamTs(0))
}

fn presented_ts(stream: StreamTs, frame: u64, corrupt_every: Option<u64>) -> StreamTs {
    match corrupt_every {
        Some(n) if n > 0 && frame > 0 && frame % n == 0 => stream + CORRUPT_OFFSET,
        _ => stream,
    }
}

fn sleep_until(source: &MonotonicSource, target: SystemTs) {
    let remaining = target - source.now();
    if remaining > Ticks::ZERO {
        thread::sleep(remaining.to_duration());
    }
}
