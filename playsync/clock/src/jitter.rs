/*!
    Online jitter estimation.

    The estimator sizes the buffering margin from a sliding window of
    lateness samples. The margin is the window's peak lateness plus its
    mean lateness, so a single spike is covered and a consistently noisy
    source gets extra headroom on top. The margin only ever grows until
    [`JitterEstimator::reset`] is called.
*/

use playsync_types::Ticks;

/**
    Windowed estimator of the buffering margin ("PTS delay").
*/
#[derive(Debug, Clone)]
pub struct JitterEstimator {
    /// Ring of the most recent lateness samples, never longer than `window`.
    samples: Vec<Ticks>,
    /// Slot the next sample overwrites once the ring is full.
    next: usize,
    window: usize,
    minimum: Ticks,
    maximum: Ticks,
    delay: Ticks,
}

impl JitterEstimator {
    /// Largest window the estimator keeps samples for.
    pub const MAX_WINDOW: usize = 4096;

    /**
        Create an estimator whose margin starts at `minimum`.

        `window` is clamped to `1..=MAX_WINDOW` and `maximum` to at least
        `minimum`.
    */
    pub fn new(minimum: Ticks, window: usize, maximum: Ticks) -> Self {
        let window = window.clamp(1, Self::MAX_WINDOW);
        Self {
            samples: Vec::with_capacity(window),
            next: 0,
            window,
            minimum,
            maximum: maximum.max(minimum),
            delay: minimum,
        }
    }

    /**
        Record the deviation between a predicted and an observed arrival.

        Positive deviations are late arrivals. When the source can be paced,
        early arrivals cost nothing and count as zero lateness. When it
        cannot, early bursts must be buffered too, so the magnitude counts.

        Returns the margin after the sample was taken into account.
    */
    pub fn observe(&mut self, deviation: Ticks, can_pace: bool) -> Ticks {
        let sample = if can_pace {
            deviation.max(Ticks::ZERO)
        } else {
            deviation.abs()
        };

        if self.samples.len() < self.window {
            self.samples.push(sample);
        } else {
            self.samples[self.next] = sample;
        }
        self.next = (self.next + 1) % self.window;

        let candidate = (self.peak() + self.mean()).clamp(self.minimum, self.maximum);
        if candidate > self.delay {
            self.delay = candidate;
        }
        self.delay
    }

    /**
        Current buffering margin.
    */
    #[inline]
    pub fn estimated_delay(&self) -> Ticks {
        self.delay
    }

    #[inline]
    pub fn minimum(&self) -> Ticks {
        self.minimum
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    /**
        Number of samples currently in the window.
    */
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples.len()
    }

    /**
        Forget every sample and return the margin to its minimum.
    */
    pub fn reset(&mut self) {
        self.samples.clear();
        self.next = 0;
        self.delay = self.minimum;
    }

    /**
        Apply new tuning. Samples are discarded; the margin is raised to the
        new minimum if needed and capped at the new maximum.
    */
    pub fn reconfigure(&mut self, minimum: Ticks, window: usize, maximum: Ticks) {
        let window = window.clamp(1, Self::MAX_WINDOW);
        if window != self.window {
            self.samples = Vec::with_capacity(window);
        } else {
            self.samples.clear();
        }
        self.next = 0;
        self.window = window;
        self.minimum = minimum;
        self.maximum = maximum.max(minimum);
        self.delay = self.delay.clamp(self.minimum, self.maximum);
    }

    fn peak(&self) -> Ticks {
        self.samples.iter().copied().max().unwrap_or(Ticks::ZERO)
    }

    fn mean(&self) -> Ticks {
        if self.samples.is_empty() {
            return Ticks::ZERO;
        }
        let sum: i128 = self.samples.iter().map(|s| s.0 as i128).sum();
        Ticks((sum / self.samples.len() as i128) as i64)
    }
}
