//! Alert configuration from environment variables.

use thiserror::Error;

/// Environment variable overriding the alert radius in kilometres.
pub const THRESHOLD_ENV: &str = "ALERT_THRESHOLD_KM";

/// Environment variable enabling in-flight insight de-duplication.
pub const DEDUPE_ENV: &str = "ALERT_DEDUPE_INSIGHTS";

/// Alert radius used when none is configured.
pub const DEFAULT_THRESHOLD_KM: f64 = 2.0;

/// Invalid alert configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The threshold is not a finite, non-negative number.
    #[error("Invalid alert threshold '{value}': expected a non-negative number of kilometres")]
    InvalidThreshold {
        /// The rejected value as given.
        value: String,
    },
}

/// Tunables of the proximity alert manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertConfig {
    /// A hazard is in range when its distance is at or below this value.
    pub threshold_km: f64,
    /// Skip issuing a second insight request for a hazard whose first
    /// request has not completed yet.
    pub dedupe_in_flight_insights: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_THRESHOLD_KM,
            dedupe_in_flight_insights: false,
        }
    }
}

impl AlertConfig {
    /// Default configuration with the given threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] for negative or non-finite
    /// values.
    pub fn with_threshold(threshold_km: f64) -> Result<Self, ConfigError> {
        if !threshold_km.is_finite() || threshold_km < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                value: threshold_km.to_string(),
            });
        }
        Ok(Self {
            threshold_km,
            ..Self::default()
        })
    }

    /// Reads `ALERT_THRESHOLD_KM` and `ALERT_DEDUPE_INSIGHTS`, falling back
    /// to the defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] if the threshold is set but
    /// unparseable or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(THRESHOLD_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::with_threshold(parse_threshold(&raw)?)?,
            _ => Self::default(),
        };

        config.dedupe_in_flight_insights = dedupe_from_env();

        log::debug!(
            "Alert config: threshold {} km, dedupe in-flight insights: {}",
            config.threshold_km,
            config.dedupe_in_flight_insights
        );
        Ok(config)
    }

    /// Whether a hazard `distance_km` away is within the alert radius.
    #[must_use]
    pub fn in_range(&self, distance_km: f64) -> bool {
        distance_km <= self.threshold_km
    }
}

/// Whether `ALERT_DEDUPE_INSIGHTS` is set to a truthy value.
#[must_use]
pub fn dedupe_from_env() -> bool {
    std::env::var(DEDUPE_ENV)
        .is_ok_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidThreshold {
            value: raw.to_string(),
        })
}
