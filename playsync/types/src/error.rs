/*!
    Error types for the playsync crates.
*/

use thiserror::Error;

use crate::{Rational, SystemTs};

/**
    Error type for clock operations.

    None of these are fatal: callers wait for more data, drop the unit,
    or ask for a seek.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// No timing observation has been accepted yet.
    #[error("clock has no reference point yet")]
    NoReference,

    /// A conversion would produce a deadline too far in the future.
    #[error("deadline {} exceeds limit {}", .deadline.0, .limit.0)]
    BoundExceeded { deadline: SystemTs, limit: SystemTs },

    /// Playback rates must be strictly positive.
    #[error("invalid playback rate: {0}")]
    InvalidRate(Rational),

    /// Configuration values are out of range.
    #[error("invalid clock configuration: {0}")]
    InvalidConfig(String),
}

impl ClockError {
    /**
        Create an invalid configuration error with the given message.
    */
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/**
    Result type alias for the playsync crates.
*/
pub type Result<T> = std::result::Result<T, ClockError>;
