//! Engine configuration
//!
//! Tunable parameters for a [`crate::engine::RespiroEngine`]. The defaults
//! reproduce the nominal 50 Hz chest-monitoring deployment; the bandpass
//! coefficients themselves are fixed for that rate and are not reconfigurable.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Nominal sensor sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE_HZ: f32 = 50.0;

/// Default sensitivity for instability detection (threshold is `alpha * sigma`).
pub const DEFAULT_ALPHA: f32 = 2.0;

/// Default apnea timeout: no breath cycle for this long raises the apnea flag.
pub const DEFAULT_APNEA_TIMEOUT_MS: u64 = 10_000;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sensor sample rate in Hz. Affects the phase-velocity time step only;
    /// the breathing bandpass assumes the nominal 50 Hz rate.
    pub sample_rate_hz: f32,
    /// Sensitivity of the phase-memory instability threshold.
    pub alpha: f32,
    /// Milliseconds without a breath cycle before the apnea flag is raised.
    pub apnea_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            alpha: DEFAULT_ALPHA,
            apnea_timeout_ms: DEFAULT_APNEA_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate_hz));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.apnea_timeout_ms == 0 {
            return Err(ConfigError::InvalidApneaTimeout);
        }
        Ok(())
    }

    /// Sample period in seconds.
    pub fn sample_period_s(&self) -> f32 {
        1.0 / self.sample_rate_hz
    }
}
