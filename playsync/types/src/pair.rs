/*!
    Values exchanged between the clock and its producers and consumers.
*/

use crate::{Rational, StreamTs, SystemTs, Ticks};

/**
    One stream-domain instant tied to one system-domain instant.

    Tagged with the playback rate that was in effect when the pair was
    recorded. Pairs are never edited in place; the clock replaces them.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimestampPair {
    pub stream: StreamTs,
    pub system: SystemTs,
    pub rate: Rational,
}

impl TimestampPair {
    pub const fn new(stream: StreamTs, system: SystemTs, rate: Rational) -> Self {
        Self {
            stream,
            system,
            rate,
        }
    }

    /**
        The same pair with its system time shifted by `offset`.
    */
    pub fn shifted(self, offset: Ticks) -> Self {
        Self {
            system: self.system + offset,
            ..self
        }
    }
}

/**
    A presentation deadline in the system domain.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// Present at this system time.
    At(SystemTs),
    /// No useful deadline: the clock is paused or not yet synchronized.
    Indefinite,
}

impl Deadline {
    /**
        The deadline's system time, if there is one.
    */
    pub fn at(self) -> Option<SystemTs> {
        match self {
            Self::At(ts) => Some(ts),
            Self::Indefinite => None,
        }
    }

    pub fn is_indefinite(self) -> bool {
        matches!(self, Self::Indefinite)
    }
}

/**
    Result of feeding one timing observation to the clock.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateOutcome {
    /// The observation arrived within the buffering margin.
    OnTime,
    /**
        The observation arrived later than the buffering margin allows.

        `margin` is how far past the margin it arrived. Decoders use it to
        decide how aggressively to drop frames.
    */
    Late { margin: Ticks },
}

impl UpdateOutcome {
    pub fn is_late(self) -> bool {
        matches!(self, Self::Late { .. })
    }

    /**
        How far past the buffering margin the observation was, zero if on time.
    */
    pub fn margin(self) -> Ticks {
        match self {
            Self::OnTime => Ticks::ZERO,
            Self::Late { margin } => margin,
        }
    }
}
