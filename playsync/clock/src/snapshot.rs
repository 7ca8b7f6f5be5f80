/*!
    Lock-free publication of clock state.

    The writer owns the authoritative state and, after each mutation, copies
    it into a [`SnapshotCell`] guarded by a sequence counter. Readers copy the
    fields out and retry if the counter moved while they were reading, so a
    reader never sees half of an update and never waits on a mutex.
*/

use std::hint::spin_loop;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering, fence};

use playsync_types::{
    ClockError, Deadline, Rational, Result, StreamTs, SystemTs, Ticks, TimestampPair,
};

use crate::drift::DriftModel;

/**
    Value copy of everything a reader may ask the clock.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSnapshot {
    /// Most recent trusted pair, absent until the first update.
    pub reference: Option<TimestampPair>,
    /// Start of the current timeline segment.
    pub origin: Option<TimestampPair>,
    /// Rate used for conversions from now on.
    pub rate: Rational,
    pub paused: bool,
    /// System time of the last pause or resume.
    pub pause_pivot: SystemTs,
    /// Buffering margin.
    pub delay: Ticks,
    /// Expected stream distance to the next unit.
    pub stream_step: Ticks,
}

/**
    Stream timestamps converted into the system domain.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub ts0: Deadline,
    pub ts1: Option<Deadline>,
    /// Rate the conversion used, for reporting trick-play speed.
    pub rate: Rational,
}

/**
    Start and extent of the current timeline segment.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockState {
    pub stream_start: StreamTs,
    pub system_start: SystemTs,
    pub stream_duration: Ticks,
    pub system_duration: Ticks,
}

impl ClockSnapshot {
    pub(crate) fn initial(rate: Rational, delay: Ticks) -> Self {
        Self {
            reference: None,
            origin: None,
            rate,
            paused: false,
            pause_pivot: SystemTs(0),
            delay,
            stream_step: Ticks::ZERO,
        }
    }

    /**
        When the unit following the reference is due.
    */
    pub fn wakeup(&self) -> Deadline {
        match self.reference {
            Some(reference) if !self.paused => {
                let next = reference.stream + self.stream_step;
                Deadline::At(DriftModel::to_system(&reference, self.rate, next))
            }
            _ => Deadline::Indefinite,
        }
    }

    /**
        Map one or two stream timestamps to system deadlines.

        With a `bound`, a first deadline later than `now + delay + bound`
        is refused and nothing is returned.
    */
    pub fn convert(
        &self,
        ts0: StreamTs,
        ts1: Option<StreamTs>,
        bound: Option<Ticks>,
        now: SystemTs,
    ) -> Result<Conversion> {
        let reference = self.reference.ok_or(ClockError::NoReference)?;

        if self.paused {
            return Ok(Conversion {
                ts0: Deadline::Indefinite,
                ts1: ts1.map(|_| Deadline::Indefinite),
                rate: self.rate,
            });
        }

        let deadline0 = DriftModel::to_system(&reference, self.rate, ts0);
        if let Some(bound) = bound {
            let limit = now + self.delay + bound;
            if deadline0 > limit {
                return Err(ClockError::BoundExceeded {
                    deadline: deadline0,
                    limit,
                });
            }
        }

        Ok(Conversion {
            ts0: Deadline::At(deadline0),
            ts1: ts1.map(|ts| Deadline::At(DriftModel::to_system(&reference, self.rate, ts))),
            rate: self.rate,
        })
    }

    pub fn state(&self) -> Result<ClockState> {
        match (self.origin, self.reference) {
            (Some(origin), Some(reference)) => Ok(ClockState {
                stream_start: origin.stream,
                system_start: origin.system,
                stream_duration: reference.stream - origin.stream,
                system_duration: reference.system - origin.system,
            }),
            _ => Err(ClockError::NoReference),
        }
    }

    /**
        Origin of the system timeline and the buffering margin.
    */
    pub fn system_origin(&self) -> Result<(SystemTs, Ticks)> {
        let origin = self.origin.ok_or(ClockError::NoReference)?;
        Ok((origin.system, self.delay))
    }
}

/**
    Sequence-locked cell holding the latest [`ClockSnapshot`].

    Exactly one thread may call [`SnapshotCell::publish`] at a time; the
    clock guarantees this by only publishing from `&mut` methods.
*/
#[derive(Debug)]
pub(crate) struct SnapshotCell {
    seq: AtomicU64,
    has_reference: AtomicBool,
    ref_stream: AtomicI64,
    ref_system: AtomicI64,
    ref_rate: AtomicU64,
    origin_stream: AtomicI64,
    origin_system: AtomicI64,
    origin_rate: AtomicU64,
    rate: AtomicU64,
    paused: AtomicBool,
    pause_pivot: AtomicI64,
    delay: AtomicI64,
    stream_step: AtomicI64,
}

impl SnapshotCell {
    pub(crate) fn new(initial: &ClockSnapshot) -> Self {
        let cell = Self {
            seq: AtomicU64::new(0),
            has_reference: AtomicBool::new(false),
            ref_stream: AtomicI64::new(0),
            ref_system: AtomicI64::new(0),
            ref_rate: AtomicU64::new(pack_rate(Rational::ONE)),
            origin_stream: AtomicI64::new(0),
            origin_system: AtomicI64::new(0),
            origin_rate: AtomicU64::new(pack_rate(Rational::ONE)),
            rate: AtomicU64::new(pack_rate(Rational::ONE)),
            paused: AtomicBool::new(false),
            pause_pivot: AtomicI64::new(0),
            delay: AtomicI64::new(0),
            stream_step: AtomicI64::new(0),
        };
        cell.store_fields(initial);
        cell
    }

    pub(crate) fn publish(&self, snapshot: &ClockSnapshot) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.store_fields(snapshot);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    pub(crate) fn load(&self) -> ClockSnapshot {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                spin_loop();
                continue;
            }
            let snapshot = self.load_fields();
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return snapshot;
            }
            spin_loop();
        }
    }

    /// Number of completed publications.
    pub(crate) fn version(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    fn store_fields(&self, s: &ClockSnapshot) {
        let r = Ordering::Relaxed;
        self.has_reference.store(s.reference.is_some(), r);
        if let Some(reference) = s.reference {
            self.ref_stream.store(reference.stream.0, r);
            self.ref_system.store(reference.system.0, r);
            self.ref_rate.store(pack_rate(reference.rate), r);
        }
        if let Some(origin) = s.origin {
            self.origin_stream.store(origin.stream.0, r);
            self.origin_system.store(origin.system.0, r);
            self.origin_rate.store(pack_rate(origin.rate), r);
        }
        self.rate.store(pack_rate(s.rate), r);
        self.paused.store(s.paused, r);
        self.pause_pivot.store(s.pause_pivot.0, r);
        self.delay.store(s.delay.0, r);
        self.stream_step.store(s.stream_step.0, r);
    }

    fn load_fields(&self) -> ClockSnapshot {
        let r = Ordering::Relaxed;
        let has_reference = self.has_reference.load(r);
        let reference = has_reference.then(|| TimestampPair {
            stream: StreamTs(self.ref_stream.load(r)),
            system: SystemTs(self.ref_system.load(r)),
            rate: unpack_rate(self.ref_rate.load(r)),
        });
        let origin = has_reference.then(|| TimestampPair {
            stream: StreamTs(self.origin_stream.load(r)),
            system: SystemTs(self.origin_system.load(r)),
            rate: unpack_rate(self.origin_rate.load(r)),
        });
        ClockSnapshot {
            reference,
            origin,
            rate: unpack_rate(self.rate.load(r)),
            paused: self.paused.load(r),
            pause_pivot: SystemTs(self.pause_pivot.load(r)),
            delay: Ticks(self.delay.load(r)),
            stream_step: Ticks(self.stream_step.load(r)),
        }
    }
}

fn pack_rate(rate: Rational) -> u64 {
    ((rate.num as u32 as u64) << 32) | rate.den as u32 as u64
}

fn unpack_rate(bits: u64) -> Rational {
    Rational {
        num: (bits >> 32) as u32 as i32,
        den: bits as u32 as i32,
    }
}
