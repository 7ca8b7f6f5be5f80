/*!
    Exact rational numbers for playback rates.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Ticks;

/**
    A rational number represented as a numerator and denominator.

    Used as the playback rate multiplier: `1/1` is normal speed, `2/1`
    plays twice as fast, `1/2` at half speed. Never converted to a float
    on the timing path, so long sessions do not accumulate rounding drift.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Normal playback speed.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        Returns true if the value is strictly greater than zero.
    */
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.den != 0 && (self.num > 0) == (self.den > 0) && self.num != 0
    }

    /**
        Reduce to lowest terms with a positive denominator.

        Returns `None` when the reduced form does not fit in `i32`, as with
        `i32::MIN / -1`.
    */
    pub fn reduced(self) -> Option<Self> {
        let g = i64::from(gcd(self.num.unsigned_abs(), self.den.unsigned_abs()).max(1));
        let sign = if self.den < 0 { -1 } else { 1 };
        let num = sign * i64::from(self.num) / g;
        let den = sign * i64::from(self.den) / g;
        Some(Self {
            num: i32::try_from(num).ok()?,
            den: i32::try_from(den).ok()?,
        })
    }

    /**
        Convert to f64. For display only.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Multiply a tick count by this rational: `ticks * num / den`.

        The product is formed in 128 bits and truncated toward zero.
        Results outside the `i64` range saturate.
    */
    #[inline]
    pub fn scale_ticks(self, ticks: Ticks) -> Ticks {
        Ticks(mul_div(ticks.0, self.num, self.den))
    }

    /**
        Divide a tick count by this rational: `ticks * den / num`.

        This is how a stream-domain delta becomes a system-domain delta
        at a given playback rate.

        # Panics

        Panics if numerator is zero.
    */
    #[inline]
    pub fn unscale_ticks(self, ticks: Ticks) -> Ticks {
        assert!(self.num != 0, "cannot divide by a zero rate");
        Ticks(mul_div(ticks.0, self.den, self.num))
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ONE
    }
}

fn mul_div(value: i64, mul: i32, div: i32) -> i64 {
    let wide = value as i128 * mul as i128 / div as i128;
    wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}
