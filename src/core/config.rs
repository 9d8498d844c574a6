//! Monitor configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

use crate::{Result, SentinelError};

/// Configuration for the depletion model and the refresh scheduler
///
/// These values have been tuned to produce stable forecasts without making
/// the monitor sluggish. Changing them affects forecast noise and the
/// per-cycle refresh cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Exponential smoothing factor applied to instantaneous depletion rates
    ///
    /// Must lie in (0, 1]. At 1.0 each new reading fully replaces the
    /// trend; at the default (0.25) a single noisy sample moves the
    /// smoothed rate only a quarter of the way toward it, so the forecast
    /// settles within a handful of refreshes without wild swings.
    pub smoothing_factor: f64,

    /// Simulation ticks per real-world minute
    ///
    /// Converts tick-denominated elapsed time into per-minute rates. At
    /// 60 ticks per second this is 3600.
    pub ticks_per_minute: f64,

    /// Number of cycles over which one full sweep of the registry completes
    ///
    /// The scheduler spreads the registry across this window so refreshing
    /// N probes never costs more than ceil(N / remaining) per cycle. The
    /// default (300) matches the minimum interval at which a fresh reading
    /// is meaningful for the depletion model.
    pub sweep_window_cycles: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.25,
            ticks_per_minute: 3600.0,
            sweep_window_cycles: 300,
        }
    }
}

impl MonitorConfig {
    /// Parse a config from TOML, falling back to defaults for absent keys
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject values the model and scheduler cannot operate with
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(SentinelError::InvalidConfig(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }
        if self.ticks_per_minute <= 0.0 {
            return Err(SentinelError::InvalidConfig(format!(
                "ticks_per_minute must be positive, got {}",
                self.ticks_per_minute
            )));
        }
        if self.sweep_window_cycles == 0 {
            return Err(SentinelError::InvalidConfig(
                "sweep_window_cycles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.smoothing_factor - 0.25).abs() < 1e-9);
        assert_eq!(config.sweep_window_cycles, 300);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = MonitorConfig::from_toml_str("sweep_window_cycles = 60\n").unwrap();
        assert_eq!(config.sweep_window_cycles, 60);
        // Unspecified keys fall back to defaults
        assert!((config.smoothing_factor - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_smoothing() {
        let mut config = MonitorConfig::default();
        config.smoothing_factor = 0.0;
        assert!(config.validate().is_err());
        config.smoothing_factor = 1.5;
        assert!(config.validate().is_err());
        config.smoothing_factor = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = MonitorConfig::from_toml_str("sweep_window_cycles = 0\n");
        assert!(err.is_err());
    }
}
