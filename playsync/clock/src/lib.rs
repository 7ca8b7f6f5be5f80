/*!
    Playback clock synchronization.

    A [`ClockCore`] relates the timestamps of one group of elementary
    streams to the host's monotonic clock. The decode thread feeds it
    observations with [`ClockCore::update`]; render threads hold
    [`ClockReader`]s and turn stream timestamps into presentation deadlines.

    # Components

    - [`JitterEstimator`] - Sizes the buffering margin from observed lateness
    - [`DriftModel`] - Extrapolates stream time into system time at a rate
    - [`ClockCore`] and [`ClockReader`] - The writer and its lock-free readers
    - [`ClockView`] - Read operations shared by both handles

    # Time Sources

    - [`TimeSource`] - Trait for reading system time
    - [`MonotonicSource`] - Host monotonic time
    - [`ManualSource`] - Hand-driven time for tests and simulation

    # Example

    ```
    use playsync_clock::{ClockCore, ClockView, UpdateFlags};
    use playsync_types::{Deadline, Rational, StreamTs, SystemTs};

    let mut clock = ClockCore::with_rate(Rational::ONE).unwrap();
    clock.update(StreamTs(1000), SystemTs(5_000_000), UpdateFlags::paced());

    let reader = clock.reader();
    let conversion = reader
        .convert(StreamTs(2000), None, None, SystemTs(5_000_000))
        .unwrap();
    assert_eq!(conversion.ts0, Deadline::At(SystemTs(5_001_000)));
    ```
*/

mod clock;
mod config;
mod drift;
mod jitter;
mod snapshot;
mod source;

pub use clock::{ClockCore, ClockReader, ClockStats, ClockView, SystemOrigin, UpdateFlags};
pub use config::ClockConfig;
pub use drift::DriftModel;
pub use jitter::JitterEstimator;
pub use snapshot::{ClockSnapshot, ClockState, Conversion};
pub use source::{ManualSource, MonotonicSource, TimeSource};

pub use playsync_types as types;
