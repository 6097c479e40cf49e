//! Detector configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Grouping and rejection settings for one detector instance
///
/// Immutable for the lifetime of the detector it is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Grouping/debounce width, anchored to a group's first event (default: 500)
    #[serde(default = "default_time_window_millis")]
    pub time_window_millis: u64,

    /// Results below this confidence are treated as noise (default: 0.5)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl DetectorConfig {
    /// Create a validated configuration
    pub fn new(time_window_millis: u64, min_confidence: f64) -> Result<Self> {
        let config = Self {
            time_window_millis,
            min_confidence,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML fragment such as `time_window_millis = 250`
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.time_window_millis == 0 {
            return Err(Error::InvalidConfig(
                "time_window_millis must be greater than zero".to_string(),
            ));
        }

        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "min_confidence must be within 0.0..=1.0, got {}",
                self.min_confidence
            )));
        }

        Ok(())
    }

    /// Window width in the microsecond unit used by event timestamps
    pub fn window_micros(&self) -> u64 {
        self.time_window_millis.saturating_mul(1_000)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            time_window_millis: default_time_window_millis(),
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_time_window_millis() -> u64 {
    500
}

fn default_min_confidence() -> f64 {
    0.5
}
