/*!
    Clock tuning parameters.
*/

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use playsync_types::{ClockError, Result, Ticks};

use crate::jitter::JitterEstimator;

const DEFAULT_MINIMUM_DELAY: Ticks = Ticks::from_millis(300);
const DEFAULT_JITTER_WINDOW: usize = 16;
const DEFAULT_MAXIMUM_DELAY: Ticks = Ticks::from_secs(60);
const DEFAULT_MAX_GAP: Ticks = Ticks::from_secs(60);

/**
    Configuration for a playback clock.

    Fixed at construction. Only [`ClockCore::set_jitter`] changes the
    jitter fields afterwards, and it needs exclusive access to the clock.

    [`ClockCore::set_jitter`]: crate::ClockCore::set_jitter
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Floor of the buffering margin.
    pub minimum_delay: Ticks,
    /// Number of recent observations the jitter estimate looks at.
    pub jitter_window: usize,
    /// Ceiling of the buffering margin.
    pub maximum_delay: Ticks,
    /// A stream jump larger than this is a discontinuity, not lateness.
    pub max_gap: Ticks,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            minimum_delay: DEFAULT_MINIMUM_DELAY,
            jitter_window: DEFAULT_JITTER_WINDOW,
            maximum_delay: DEFAULT_MAXIMUM_DELAY,
            max_gap: DEFAULT_MAX_GAP,
        }
    }
}

impl ClockConfig {
    /**
        Create a new config with default settings.
    */
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minimum_delay(mut self, delay: Ticks) -> Self {
        self.minimum_delay = delay;
        self
    }

    pub fn with_jitter_window(mut self, window: usize) -> Self {
        self.jitter_window = window;
        self
    }

    pub fn with_maximum_delay(mut self, delay: Ticks) -> Self {
        self.maximum_delay = delay;
        self
    }

    pub fn with_max_gap(mut self, gap: Ticks) -> Self {
        self.max_gap = gap;
        self
    }

    /**
        Check that every field is within range.
    */
    pub fn validate(&self) -> Result<()> {
        if self.jitter_window == 0 {
            return Err(ClockError::invalid_config(
                "jitter_window must be at least 1",
            ));
        }
        if self.jitter_window > JitterEstimator::MAX_WINDOW {
            return Err(ClockError::invalid_config(format!(
                "jitter_window ({}) exceeds {}",
                self.jitter_window,
                JitterEstimator::MAX_WINDOW
            )));
        }
        if self.minimum_delay.is_negative() {
            return Err(ClockError::invalid_config(
                "minimum_delay must not be negative",
            ));
        }
        if self.minimum_delay > self.maximum_delay {
            return Err(ClockError::invalid_config(format!(
                "minimum_delay ({}) exceeds maximum_delay ({})",
                self.minimum_delay.0, self.maximum_delay.0
            )));
        }
        if self.max_gap <= Ticks::ZERO {
            return Err(ClockError::invalid_config("max_gap must be positive"));
        }
        Ok(())
    }

    /**
        Parse and validate a JSON config document.

        Missing fields take their default values.
    */
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| ClockError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /**
        Load and validate a JSON config file.
    */
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ClockError::invalid_config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ClockConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_rejected() {
        let config = ClockConfig::new().with_jitter_window(0);
        assert!(matches!(
            config.validate(),
            Err(ClockError::InvalidConfig(_))
        ));
    }

    #[test]
    fn minimum_above_maximum_rejected() {
        let config = ClockConfig::new()
            .with_minimum_delay(Ticks::from_secs(2))
            .with_maximum_delay(Ticks::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_minimum_rejected() {
        let config = ClockConfig::new().with_minimum_delay(Ticks(-1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_gap_rejected() {
        let config = ClockConfig::new().with_max_gap(Ticks::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = ClockConfig::from_json_str(r#"{ "minimum_delay": 40000 }"#).unwrap();
        assert_eq!(config.minimum_delay, Ticks(40_000));
        assert_eq!(config.jitter_window, DEFAULT_JITTER_WINDOW);
        assert_eq!(config.max_gap, DEFAULT_MAX_GAP);
    }

    #[test]
    fn json_is_validated() {
        let err = ClockConfig::from_json_str(r#"{ "jitter_window": 0 }"#).unwrap_err();
        assert!(matches!(err, ClockError::InvalidConfig(_)));
    }

    #[test]
    fn json_window_above_cap_rejected() {
        let text = format!(r#"{{ "jitter_window": {} }}"#, usize::MAX / 2);
        let err = ClockConfig::from_json_str(&text).unwrap_err();
        assert!(matches!(err, ClockError::InvalidConfig(_)));

        let at_cap = ClockConfig::new().with_jitter_window(JitterEstimator::MAX_WINDOW);
        assert!(at_cap.validate().is_ok());
    }

    #[test]
    fn json_syntax_error_is_config_error() {
        let err = ClockConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ClockError::InvalidConfig(_)));
    }

    #[test]
    fn json_round_trips_through_serde() {
        let config = ClockConfig::new().with_jitter_window(4);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(ClockConfig::from_json_str(&text).unwrap(), config);
    }
}
