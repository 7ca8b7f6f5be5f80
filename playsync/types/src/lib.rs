/*!
    Shared types for the playsync crates.

    This crate defines the vocabulary of the playback clock: the types that
    cross crate boundaries. It contains no synchronization logic, only exact
    integer and rational arithmetic.

    # Core Types

    - [`Ticks`] - Signed spans in ticks ([`TICKS_PER_SECOND`] per second)
    - [`StreamTs`] and [`SystemTs`] - Instants in the stream and system domains
    - [`Rational`] - Exact playback rate multipliers

    # Clock Values

    - [`TimestampPair`] - A stream instant tied to a system instant
    - [`Deadline`] - A presentation deadline, or none
    - [`UpdateOutcome`] - Whether a timing observation arrived late

    # Error Handling

    - [`ClockError`] and [`Result`] - Common error types
*/

mod error;
mod pair;
mod rational;
mod timestamp;

pub use error::{ClockError, Result};
pub use pair::{Deadline, TimestampPair, UpdateOutcome};
pub use rational::Rational;
pub use timestamp::{StreamTs, SystemTs, TICKS_PER_SECOND, Ticks};
