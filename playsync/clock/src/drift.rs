/*!
    Linear extrapolation between the stream and system domains.
*/

use playsync_types::{Rational, StreamTs, SystemTs, Ticks, TimestampPair};

/**
    Extrapolates stream timestamps into system deadlines from a reference pair.

    The model is a straight line through the reference with slope `1 / rate`:
    at rate `2/1`, one second of stream time passes in half a second of
    system time. It also remembers the most recent forward stream step,
    which serves as the expected cadence of the next unit.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftModel {
    stream_step: Ticks,
}

impl DriftModel {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        System deadline for `stream`, extrapolated from `reference` at `rate`.
    */
    #[inline]
    pub fn to_system(reference: &TimestampPair, rate: Rational, stream: StreamTs) -> SystemTs {
        reference.system + rate.unscale_ticks(stream - reference.stream)
    }

    /**
        Note the move from one reference to the next.

        Only forward steps are kept; a stalled or backwards stream leaves
        the previous cadence in place.
    */
    pub fn advance(&mut self, previous: StreamTs, next: StreamTs) {
        let step = next - previous;
        if step > Ticks::ZERO {
            self.stream_step = step;
        }
    }

    /**
        Most recent forward stream step, zero until one has been seen.
    */
    #[inline]
    pub fn stream_step(&self) -> Ticks {
        self.stream_step
    }

    /**
        Forget the cadence, for discontinuities.
    */
    pub fn clear(&mut self) {
        self.stream_step = Ticks::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(rate: Rational) -> TimestampPair {
        TimestampPair::new(StreamTs(1000), SystemTs(5_000_000), rate)
    }

    #[test]
    fn normal_speed_is_identity_offset() {
        let r = reference(Rational::ONE);
        assert_eq!(
            DriftModel::to_system(&r, Rational::ONE, StreamTs(2000)),
            SystemTs(5_001_000)
        );
    }

    #[test]
    fn double_speed_halves_delta() {
        let r = reference(Rational::ONE);
        let fast = Rational::new(2, 1);
        assert_eq!(
            DriftModel::to_system(&r, fast, StreamTs(3000)),
            SystemTs(5_001_000)
        );
    }

    #[test]
    fn half_speed_doubles_delta() {
        let r = reference(Rational::ONE);
        let slow = Rational::new(1, 2);
        assert_eq!(
            DriftModel::to_system(&r, slow, StreamTs(2000)),
            SystemTs(5_002_000)
        );
    }

    #[test]
    fn timestamps_before_reference_map_before() {
        let r = reference(Rational::ONE);
        assert_eq!(
            DriftModel::to_system(&r, Rational::ONE, StreamTs(500)),
            SystemTs(4_999_500)
        );
    }

    #[test]
    fn advance_keeps_forward_steps_only() {
        let mut model = DriftModel::new();
        assert_eq!(model.stream_step(), Ticks::ZERO);

        model.advance(StreamTs(0), StreamTs(40_000));
        assert_eq!(model.stream_step(), Ticks(40_000));

        model.advance(StreamTs(40_000), StreamTs(40_000));
        model.advance(StreamTs(40_000), StreamTs(10_000));
        assert_eq!(model.stream_step(), Ticks(40_000));

        model.clear();
        assert_eq!(model.stream_step(), Ticks::ZERO);
    }
}
