use playsync_clock::{
    ClockConfig, ClockCore, ClockView, ManualSource, SystemOrigin, TimeSource, UpdateFlags,
};
use playsync_types::{ClockError, Deadline, Rational, StreamTs, SystemTs, Ticks};

const FRAME: Ticks = Ticks(40_000);
const START: SystemTs = SystemTs(1_000_000);

/// Deterministic noise in [-3000, 3000] ticks.
struct Noise(u64);

impl Noise {
    fn next(&mut self) -> Ticks {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        Ticks(((self.0 >> 33) % 6001) as i64 - 3000)
    }
}

fn small_clock() -> ClockCore {
    let config = ClockConfig::new()
        .with_minimum_delay(Ticks(1000))
        .with_jitter_window(8);
    ClockCore::new(config, Rational::ONE).unwrap()
}

#[test]
fn converges_under_bounded_noise() {
    let mut clock = small_clock();
    let mut noise = Noise(42);
    let window = clock.config().jitter_window;
    let frames = 300;

    for i in 0..frames {
        let stream = StreamTs(i * FRAME.0);
        let system = START + Ticks(i * FRAME.0) + noise.next();
        let outcome = clock.update(stream, system, UpdateFlags::paced());
        if i as usize > window {
            assert!(!outcome.is_late(), "frame {i} still late: {outcome:?}");
        }
    }

    let delay = clock.jitter();
    assert!(delay > Ticks(1000));
    assert!(delay <= Ticks(12_000));

    let true_next = START + Ticks(frames * FRAME.0);
    let wakeup = clock.wakeup().at().unwrap();
    assert!((wakeup - true_next).abs() <= delay);
}

#[test]
fn repeated_reads_are_identical() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    clock.update(StreamTs(40_000), START + Ticks(43_000), UpdateFlags::paced());
    let reader = clock.reader();

    let first = (
        reader.rate(),
        reader.jitter(),
        reader.state(),
        reader.wakeup(),
    );
    for _ in 0..10 {
        assert_eq!(
            (
                reader.rate(),
                reader.jitter(),
                reader.state(),
                reader.wakeup()
            ),
            first
        );
        assert_eq!(clock.wakeup(), first.3);
    }
}

#[test]
fn double_rate_halves_distance() {
    let mut clock = small_clock();
    clock.update(StreamTs(10_000), START, UpdateFlags::paced());
    clock.change_rate(Rational::new(2, 1)).unwrap();

    let delta = Ticks(90_001);
    let conversion = clock
        .convert(StreamTs(10_000) + delta, None, None, START)
        .unwrap();
    assert_eq!(conversion.ts0, Deadline::At(START + Ticks(45_000)));
    assert_eq!(conversion.rate, Rational::new(2, 1));
}

#[test]
fn pause_yields_no_deadline_and_resume_shifts_exactly() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    clock.update(StreamTs(40_000), START + FRAME, UpdateFlags::paced());
    let reader = clock.reader();

    let before = reader
        .convert(StreamTs(200_000), None, None, START)
        .unwrap()
        .ts0
        .at()
        .unwrap();

    let t = START + Ticks(50_000);
    let t2 = t + Ticks(2_345_678);
    clock.change_pause(true, t);
    for i in 0..5 {
        assert_eq!(reader.wakeup(), Deadline::Indefinite);
        let conversion = reader
            .convert(StreamTs(200_000 + i), Some(StreamTs(0)), None, t)
            .unwrap();
        assert_eq!(conversion.ts0, Deadline::Indefinite);
        assert_eq!(conversion.ts1, Some(Deadline::Indefinite));
    }
    clock.change_pause(false, t2);

    let after = reader
        .convert(StreamTs(200_000), None, None, t2)
        .unwrap()
        .ts0
        .at()
        .unwrap();
    assert_eq!(after - before, t2 - t);
    assert!(!reader.wakeup().is_indefinite());
}

#[test]
fn bound_rejects_far_deadlines() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    let delay = clock.jitter();
    let bound = Ticks::from_millis(500);
    let now = START;
    let limit = now + delay + bound;

    // deadline == limit is inside
    let inside = StreamTs((limit - START).0);
    let ok = clock.convert(inside, Some(StreamTs(5)), Some(bound), now).unwrap();
    assert_eq!(ok.ts0, Deadline::At(limit));
    assert_eq!(ok.ts1, Some(Deadline::At(START + Ticks(5))));

    let outside = inside + Ticks(1);
    let err = clock
        .convert(outside, Some(StreamTs(5)), Some(bound), now)
        .unwrap_err();
    assert_eq!(
        err,
        ClockError::BoundExceeded {
            deadline: limit + Ticks(1),
            limit,
        }
    );

    // without a bound anything converts
    assert!(clock.convert(outside + Ticks::from_secs(100), None, None, now).is_ok());
}

#[test]
fn bound_follows_the_time_source() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    let source = ManualSource::new(START);
    let bound = Ticks::from_millis(100);
    let far = StreamTs(0) + Ticks::from_millis(500);

    // 500 ms out against a 1 ms margin and a 100 ms bound
    assert!(matches!(
        clock.convert_now(far, None, Some(bound), &source),
        Err(ClockError::BoundExceeded { .. })
    ));

    source.advance(Ticks::from_millis(399));
    assert_eq!(source.now(), START + Ticks::from_millis(399));
    let conversion = clock.convert_now(far, None, Some(bound), &source).unwrap();
    assert_eq!(conversion.ts0, Deadline::At(START + Ticks::from_millis(500)));
}

#[test]
fn reset_restores_minimum_delay_and_keeps_start() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    clock.update(StreamTs(40_000), START + Ticks(140_000), UpdateFlags::paced());
    assert!(clock.jitter() > Ticks(1000));

    let state = clock.state().unwrap();
    clock.reset();
    assert_eq!(clock.jitter(), Ticks(1000));

    let after = clock.state().unwrap();
    assert_eq!(after.stream_start, state.stream_start);
    assert_eq!(after.system_start, state.system_start);
}

#[test]
fn concrete_conversion_scenario() {
    let mut clock = ClockCore::with_rate(Rational::new(1, 1)).unwrap();
    clock.update(
        StreamTs(1000),
        SystemTs(5_000_000),
        UpdateFlags {
            can_pace: true,
            buffering_allowed: true,
        },
    );
    let conversion = clock
        .convert(StreamTs(2000), None, None, SystemTs(5_000_000))
        .unwrap();
    assert_eq!(conversion.ts0, Deadline::At(SystemTs(5_001_000)));
}

#[test]
fn accessors_before_first_update() {
    let clock = small_clock();
    let reader = clock.reader();
    assert_eq!(reader.state(), Err(ClockError::NoReference));
    assert_eq!(reader.system_origin(), Err(ClockError::NoReference));
    assert_eq!(
        reader.convert(StreamTs(0), None, Some(Ticks(0)), START),
        Err(ClockError::NoReference)
    );
    assert_eq!(reader.wakeup(), Deadline::Indefinite);
    assert_eq!(reader.jitter(), Ticks(1000));
}

#[test]
fn origin_change_after_update_keeps_durations() {
    let mut clock = small_clock();
    clock.update(StreamTs(0), START, UpdateFlags::paced());
    clock.update(StreamTs(40_000), START + FRAME, UpdateFlags::paced());
    let before = clock.state().unwrap();

    clock
        .change_system_origin(SystemOrigin::Absolute(SystemTs(0)))
        .unwrap();
    let after = clock.state().unwrap();
    assert_eq!(after.system_duration, before.system_duration);
    assert_eq!(after.stream_duration, before.stream_duration);
    assert_eq!(after.system_start, SystemTs(-FRAME.0));
    assert_eq!(clock.system_origin().unwrap().0, SystemTs(-FRAME.0));
}
