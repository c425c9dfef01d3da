//! Core configuration for vizij-motion-core.

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

/// Playback and simulation settings.
/// Every field has a default so partial JSON documents load fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Frames per second used to quantize thread clocks.
    pub fps: f64,
    /// Playback speed multiplier applied to the frame delta.
    pub speed: f64,
    /// Spring simulation settings.
    pub spring: SpringSettings,
    /// Whether `deep_lerp` logs a warning for missing or mismatched operands.
    pub warn_on_lerp_mismatch: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringSettings {
    /// Distance and velocity under which a spring counts as settled.
    pub settle_tolerance: f64,
    /// Fixed physical timestep in seconds.
    pub simulation_step: f64,
    /// Simulated seconds after which a spring that never settles is snapped to its target.
    pub max_duration: f64,
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self {
            settle_tolerance: 0.001,
            simulation_step: 1.0 / 1000.0,
            max_duration: 30.0,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            speed: 1.0,
            spring: SpringSettings::default(),
            warn_on_lerp_mismatch: true,
        }
    }
}

impl MotionConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MotionError::Config {
                reason: format!("fps must be positive, got {}", self.fps),
            });
        }
        if !self.speed.is_finite() {
            return Err(MotionError::Config {
                reason: format!("speed must be finite, got {}", self.speed),
            });
        }
        self.spring.validate()
    }
}

impl SpringSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.simulation_step.is_finite() && self.simulation_step > 0.0) {
            return Err(MotionError::Config {
                reason: format!(
                    "spring.simulation_step must be positive, got {}",
                    self.simulation_step
                ),
            });
        }
        if !(self.settle_tolerance >= 0.0) {
            return Err(MotionError::Config {
                reason: "spring.settle_tolerance must not be negative".to_string(),
            });
        }
        if !(self.max_duration.is_finite() && self.max_duration > 0.0) {
            return Err(MotionError::Config {
                reason: format!(
                    "spring.max_duration must be positive, got {}",
                    self.max_duration
                ),
            });
        }
        Ok(())
    }
}
