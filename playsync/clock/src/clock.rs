/*!
    The playback clock and its read handles.
*/

use std::sync::Arc;

use log::{debug, trace, warn};

use playsync_types::{
    ClockError, Deadline, Rational, Result, StreamTs, SystemTs, Ticks, TimestampPair,
    UpdateOutcome,
};

use crate::config::ClockConfig;
use crate::drift::DriftModel;
use crate::jitter::JitterEstimator;
use crate::snapshot::{ClockSnapshot, ClockState, Conversion, SnapshotCell};
use crate::source::TimeSource;

/**
    How the source behind an update can be treated.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateFlags {
    /// The source can be held back by the renderer (local files).
    pub can_pace: bool,
    /// The source can be rebuffered, so the jitter estimate may adapt.
    pub buffering_allowed: bool,
}

impl UpdateFlags {
    /**
        A local source: paceable and rebufferable.
    */
    pub const fn paced() -> Self {
        Self {
            can_pace: true,
            buffering_allowed: true,
        }
    }

    /**
        A capture source running at its own pace that cannot be rebuffered.
        The jitter estimate is frozen.
    */
    pub const fn live() -> Self {
        Self {
            can_pace: false,
            buffering_allowed: false,
        }
    }
}

impl Default for UpdateFlags {
    fn default() -> Self {
        Self::paced()
    }
}

/**
    How to move the system timeline.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemOrigin {
    /// The reference's system time becomes exactly this value.
    Absolute(SystemTs),
    /// The reference's system time moves by this much.
    Relative(Ticks),
}

/**
    Writer-side counters, for diagnostics.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockStats {
    pub updates: u64,
    pub late: u64,
    pub discontinuities: u64,
    pub paused_updates: u64,
}

/**
    Read access to a clock.

    Implemented by the writer itself and by every [`ClockReader`]. All
    reads work from one consistent snapshot, so repeating a read without an
    intervening write gives the same answer.
*/
pub trait ClockView {
    /// Consistent copy of the clock's published state.
    fn snapshot(&self) -> ClockSnapshot;

    /**
        Deadline of the next expected unit, or [`Deadline::Indefinite`] while
        paused or before the first update.
    */
    fn wakeup(&self) -> Deadline {
        self.snapshot().wakeup()
    }

    /**
        Convert stream timestamps to system deadlines.

        See [`ClockSnapshot::convert`].
    */
    fn convert(
        &self,
        ts0: StreamTs,
        ts1: Option<StreamTs>,
        bound: Option<Ticks>,
        now: SystemTs,
    ) -> Result<Conversion> {
        self.snapshot().convert(ts0, ts1, bound, now)
    }

    /**
        Like [`ClockView::convert`], reading `now` from a time source.
    */
    fn convert_now(
        &self,
        ts0: StreamTs,
        ts1: Option<StreamTs>,
        bound: Option<Ticks>,
        source: &dyn TimeSource,
    ) -> Result<Conversion> {
        self.convert(ts0, ts1, bound, source.now())
    }

    fn rate(&self) -> Rational {
        self.snapshot().rate
    }

    /// Current buffering margin.
    fn jitter(&self) -> Ticks {
        self.snapshot().delay
    }

    fn state(&self) -> Result<ClockState> {
        self.snapshot().state()
    }

    fn system_origin(&self) -> Result<(SystemTs, Ticks)> {
        self.snapshot().system_origin()
    }

    fn is_paused(&self) -> bool {
        self.snapshot().paused
    }

    fn has_reference(&self) -> bool {
        self.snapshot().reference.is_some()
    }
}

/**
    Playback clock for one group of elementary streams sharing a time base.

    The demux/decode thread owns the `ClockCore` and feeds it timing
    observations. Render threads hold [`ClockReader`]s and ask for deadlines.
    Every mutating method takes `&mut self`, so there is never more than one
    writer; every write publishes a fresh snapshot for the readers.
*/
#[derive(Debug)]
pub struct ClockCore {
    config: ClockConfig,
    jitter: JitterEstimator,
    drift: DriftModel,
    reference: Option<TimestampPair>,
    origin: Option<TimestampPair>,
    rate: Rational,
    paused: bool,
    pause_pivot: SystemTs,
    stats: ClockStats,
    shared: Arc<SnapshotCell>,
}

impl ClockCore {
    /**
        Create an unsynchronized clock.
    */
    pub fn new(config: ClockConfig, rate: Rational) -> Result<Self> {
        config.validate()?;
        if !rate.is_positive() {
            return Err(ClockError::InvalidRate(rate));
        }

        let jitter = JitterEstimator::new(
            config.minimum_delay,
            config.jitter_window,
            config.maximum_delay,
        );
        let initial = ClockSnapshot::initial(rate, jitter.estimated_delay());

        Ok(Self {
            config,
            jitter,
            drift: DriftModel::new(),
            reference: None,
            origin: None,
            rate,
            paused: false,
            pause_pivot: SystemTs(0),
            stats: ClockStats::default(),
            shared: Arc::new(SnapshotCell::new(&initial)),
        })
    }

    /**
        Create an unsynchronized clock with the default configuration.
    */
    pub fn with_rate(rate: Rational) -> Result<Self> {
        Self::new(ClockConfig::default(), rate)
    }

    /**
        A handle for reading this clock from other threads.
    */
    pub fn reader(&self) -> ClockReader {
        ClockReader {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn stats(&self) -> ClockStats {
        self.stats
    }

    /**
        Feed one timing observation: `stream` became current at `system`.

        The observation is compared with the deadline the previous reference
        predicted for it. The difference feeds the jitter estimate when
        buffering is allowed, and the outcome is late when it exceeds the
        margin in force before this observation.

        Stream time going backwards, or jumping forward by more than the
        configured gap, starts a new timeline segment at this observation.

        While paused the observation is accepted but does not move the clock.
        The exception is the very first observation: it synchronizes the
        clock, and the pause is then counted from that observation, so on
        resume the stream continues from it.
    */
    pub fn update(
        &mut self,
        stream: StreamTs,
        system: SystemTs,
        flags: UpdateFlags,
    ) -> UpdateOutcome {
        self.stats.updates += 1;

        if self.paused {
            self.stats.paused_updates += 1;
            if self.reference.is_none() {
                debug!(
                    "clock synchronized while paused at stream={} system={}",
                    stream.0, system.0
                );
                self.pause_pivot = system;
                self.rebase(stream, system);
            } else {
                trace!("clock paused, holding update stream={} system={}", stream.0, system.0);
            }
            return UpdateOutcome::OnTime;
        }

        let Some(previous) = self.reference else {
            debug!("clock synchronized at stream={} system={}", stream.0, system.0);
            self.rebase(stream, system);
            return UpdateOutcome::OnTime;
        };

        let step = stream - previous.stream;
        if step.is_negative() || step > self.config.max_gap {
            self.stats.discontinuities += 1;
            debug!(
                "stream discontinuity: {} -> {} (step {}), rebasing",
                previous.stream.0, stream.0, step.0
            );
            self.rebase(stream, system);
            return UpdateOutcome::OnTime;
        }

        let predicted = DriftModel::to_system(&previous, self.rate, stream);
        let deviation = system - predicted;
        let delay = self.jitter.estimated_delay();
        if flags.buffering_allowed {
            self.jitter.observe(deviation, flags.can_pace);
        }

        self.drift.advance(previous.stream, stream);
        self.reference = Some(TimestampPair::new(stream, system, self.rate));
        self.publish();

        trace!(
            "update stream={} system={} deviation={} delay={}",
            stream.0,
            system.0,
            deviation.0,
            self.jitter.estimated_delay().0
        );

        if deviation > delay {
            self.stats.late += 1;
            UpdateOutcome::Late {
                margin: deviation - delay,
            }
        } else {
            UpdateOutcome::OnTime
        }
    }

    /**
        Return the buffering margin to its minimum and forget jitter history.

        The reference, origin and rate are kept.
    */
    pub fn reset(&mut self) {
        debug!(
            "clock reset, delay {} -> {}",
            self.jitter.estimated_delay().0,
            self.jitter.minimum().0
        );
        self.jitter.reset();
        self.publish();
    }

    /**
        Switch to a new playback rate. Recorded pairs keep the rate they
        were taken at; conversions use the new rate from now on.
    */
    pub fn change_rate(&mut self, rate: Rational) -> Result<()> {
        if !rate.is_positive() {
            warn!("rejecting playback rate {rate}");
            return Err(ClockError::InvalidRate(rate));
        }
        debug!("rate {} -> {}", self.rate, rate);
        self.rate = rate;
        self.publish();
        Ok(())
    }

    /**
        Pause or resume at `system`.

        On resume the timeline moves forward by exactly the time spent
        paused. Asking for the current state again does nothing.
    */
    pub fn change_pause(&mut self, paused: bool, system: SystemTs) {
        if paused == self.paused {
            debug!("clock already {}", if paused { "paused" } else { "running" });
            return;
        }

        if !paused {
            let offset = system - self.pause_pivot;
            self.shift(offset);
            debug!("clock resumed after {} ticks", offset.0);
        } else {
            debug!("clock paused at {}", system.0);
        }

        self.paused = paused;
        self.pause_pivot = system;
        self.publish();
    }

    /**
        Move the system timeline, for example when a new output with a
        different clock domain takes over.
    */
    pub fn change_system_origin(&mut self, origin: SystemOrigin) -> Result<()> {
        let reference = self.reference.ok_or(ClockError::NoReference)?;
        let offset = match origin {
            SystemOrigin::Absolute(system) => system - reference.system,
            SystemOrigin::Relative(offset) => offset,
        };
        debug!("system origin moved by {} ticks", offset.0);
        self.shift(offset);
        self.publish();
        Ok(())
    }

    /**
        Change the buffering floor and the jitter window.

        The margin never drops below what it already reached; use
        [`ClockCore::reset`] for that.
    */
    pub fn set_jitter(&mut self, minimum_delay: Ticks, window: usize) -> Result<()> {
        let config = ClockConfig {
            minimum_delay,
            jitter_window: window,
            ..self.config.clone()
        };
        config.validate()?;

        debug!("jitter reconfigured: minimum={} window={}", minimum_delay.0, window);
        self.jitter
            .reconfigure(config.minimum_delay, config.jitter_window, config.maximum_delay);
        self.config = config;
        self.publish();
        Ok(())
    }

    fn rebase(&mut self, stream: StreamTs, system: SystemTs) {
        let pair = TimestampPair::new(stream, system, self.rate);
        self.reference = Some(pair);
        self.origin = Some(pair);
        self.drift.clear();
        self.publish();
    }

    fn shift(&mut self, offset: Ticks) {
        self.reference = self.reference.map(|pair| pair.shifted(offset));
        self.origin = self.origin.map(|pair| pair.shifted(offset));
    }

    fn current(&self) -> ClockSnapshot {
        ClockSnapshot {
            reference: self.reference,
            origin: self.origin,
            rate: self.rate,
            paused: self.paused,
            pause_pivot: self.pause_pivot,
            delay: self.jitter.estimated_delay(),
            stream_step: self.drift.stream_step(),
        }
    }

    fn publish(&self) {
        self.shared.publish(&self.current());
    }
}

impl ClockView for ClockCore {
    fn snapshot(&self) -> ClockSnapshot {
        self.current()
    }
}

/**
    Read-only handle to a [`ClockCore`], usable from any thread.

    Reads never block. A reader that outlives its clock keeps answering
    from the last published state.
*/
#[derive(Debug, Clone)]
pub struct ClockReader {
    shared: Arc<SnapshotCell>,
}

impl ClockReader {
    /**
        Number of writes published so far. Changes whenever any read could
        give a different answer.
    */
    pub fn generation(&self) -> u64 {
        self.shared.version()
    }
}

impl ClockView for ClockReader {
    fn snapshot(&self) -> ClockSnapshot {
        self.shared.load()
    }
}

static_assertions::assert_impl_all!(ClockCore: Send, ClockView);
static_assertions::assert_impl_all!(ClockReader: Send, Sync, Clone, ClockView);
