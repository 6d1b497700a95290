//! Conductor configuration

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::mode::ModeDescriptor;

/// Settings for assembling a conductor and its view service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConductorConfig {
    /// Mode selected by `select_default_mode`
    pub default_mode: String,

    /// Period of the local clock, e.g. "1s" or "250ms"
    pub clock_period: String,

    /// Width of the default UTC window, e.g. "15m"
    pub utc_window: String,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            default_mode: ModeDescriptor::FIXED.to_string(),
            clock_period: "1s".to_string(),
            utc_window: "15m".to_string(),
        }
    }
}

impl ConductorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ConductorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_mode.is_empty() {
            return Err(Error::Config("default_mode must not be empty".to_string()));
        }
        if self.clock_period()?.is_zero() {
            return Err(Error::Config("clock_period must be positive".to_string()));
        }
        self.utc_window()?;
        Ok(())
    }

    pub fn clock_period(&self) -> Result<Duration> {
        parse_duration("clock_period", &self.clock_period)
    }

    pub fn utc_window(&self) -> Result<Duration> {
        parse_duration("utc_window", &self.utc_window)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", field, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ConductorConfig::from_json_str(r#"{"default_mode":"realtime"}"#).unwrap();

        assert_eq!(config.default_mode, "realtime");
        assert_eq!(config.clock_period().unwrap(), Duration::from_secs(1));
        assert_eq!(config.utc_window().unwrap(), Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_invalid_durations_rejected() {
        assert!(ConductorConfig::from_json_str(r#"{"clock_period":"soon"}"#).is_err());
        assert!(ConductorConfig::from_json_str(r#"{"clock_period":"0s"}"#).is_err());
        assert!(ConductorConfig::from_json_str("not json").is_err());
    }
}
