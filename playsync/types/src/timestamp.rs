/*!
    Tick-based timestamp types for the stream and system domains.
*/

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/**
    Resolution of every timestamp in the ecosystem: one tick is one microsecond.
*/
pub const TICKS_PER_SECOND: i64 = 1_000_000;

/**
    A signed span of time in ticks.

    Durations, deviations and buffering margins are all expressed in
    ticks so that stream and system arithmetic never leaves the integers.
*/
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i64::MAX);

    /**
        Create a span from whole milliseconds, saturating at the `i64` range.
    */
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(TICKS_PER_SECOND / 1000))
    }

    /**
        Create a span from whole seconds, saturating at the `i64` range.
    */
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(TICKS_PER_SECOND))
    }

    /**
        Convert this span to a std Duration.

        Negative values are clamped to zero.
    */
    #[inline]
    pub fn to_duration(self) -> Duration {
        if self.0 <= 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.0 as u64)
    }

    /**
        Create a span from a std Duration, saturating at `i64::MAX` ticks.
    */
    #[inline]
    pub fn from_duration(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_micros()).unwrap_or(i64::MAX))
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Ticks {
    type Output = Ticks;
    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Ticks) {
        *self = *self + rhs;
    }
}

impl Sub for Ticks {
    type Output = Ticks;
    fn sub(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Ticks {
    fn sub_assign(&mut self, rhs: Ticks) {
        *self = *self - rhs;
    }
}

impl Neg for Ticks {
    type Output = Ticks;
    fn neg(self) -> Ticks {
        Ticks(self.0.saturating_neg())
    }
}

impl From<i64> for Ticks {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Ticks> for i64 {
    fn from(ticks: Ticks) -> Self {
        ticks.0
    }
}

macro_rules! instant_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl Sub for $name {
            type Output = Ticks;
            fn sub(self, rhs: $name) -> Ticks {
                Ticks(self.0.saturating_sub(rhs.0))
            }
        }

        impl Add<Ticks> for $name {
            type Output = $name;
            fn add(self, rhs: Ticks) -> $name {
                $name(self.0.saturating_add(rhs.0))
            }
        }

        impl AddAssign<Ticks> for $name {
            fn add_assign(&mut self, rhs: Ticks) {
                *self = *self + rhs;
            }
        }

        impl Sub<Ticks> for $name {
            type Output = $name;
            fn sub(self, rhs: Ticks) -> $name {
                $name(self.0.saturating_sub(rhs.0))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(ts: $name) -> Self {
                ts.0
            }
        }
    };
}

instant_type!(
    /**
        An instant in the elementary stream's own clock domain
        (a presentation timestamp rescaled to ticks).
    */
    StreamTs
);

instant_type!(
    /**
        An instant in the host's monotonic clock domain.
    */
    SystemTs
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_from_millis() {
        assert_eq!(Ticks::from_millis(1), Ticks(1000));
        assert_eq!(Ticks::from_secs(2), Ticks(2_000_000));
    }

    #[test]
    fn ticks_from_large_units_saturate() {
        assert_eq!(Ticks::from_millis(10_000_000_000_000_000), Ticks::MAX);
        assert_eq!(Ticks::from_millis(i64::MIN), Ticks(i64::MIN));
        assert_eq!(Ticks::from_secs(i64::MAX / 2), Ticks::MAX);
    }

    #[test]
    fn ticks_to_duration() {
        assert_eq!(Ticks(1_500_000).to_duration(), Duration::from_millis(1500));
    }

    #[test]
    fn ticks_negative_clamps_to_zero() {
        assert_eq!(Ticks(-100).to_duration(), Duration::ZERO);
    }

    #[test]
    fn ticks_from_duration() {
        assert_eq!(Ticks::from_duration(Duration::from_millis(40)), Ticks(40_000));
        assert_eq!(Ticks::from_duration(Duration::MAX), Ticks::MAX);
    }

    #[test]
    fn ticks_arithmetic_saturates() {
        assert_eq!(Ticks::MAX + Ticks(1), Ticks::MAX);
        assert_eq!(-Ticks(5), Ticks(-5));
        assert_eq!(Ticks(-7).abs(), Ticks(7));
    }

    #[test]
    fn instant_difference_is_ticks() {
        assert_eq!(StreamTs(2000) - StreamTs(1000), Ticks(1000));
        assert_eq!(SystemTs(10) - SystemTs(25), Ticks(-15));
    }

    #[test]
    fn instant_plus_ticks() {
        assert_eq!(SystemTs(5_000_000) + Ticks(1000), SystemTs(5_001_000));
        assert_eq!(StreamTs(100) - Ticks(40), StreamTs(60));
    }

    #[test]
    fn instant_ordering() {
        assert!(StreamTs(100) < StreamTs(200));
        assert!(SystemTs(200) > SystemTs(100));
    }
}
