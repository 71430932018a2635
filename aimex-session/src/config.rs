use std::fs;
use std::path::Path;

use aimex_core::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target radius must be within 1..=200 px, got {0}")]
    TargetRadius(f64),
    #[error("orbit radius ({orbit}) must exceed the target radius ({target})")]
    OrbitRadius { orbit: f64, target: f64 },
    #[error("result display duration must be within 50..=10000 ms, got {0}")]
    DisplayDuration(u64),
    #[error("session needs at least one trial")]
    NoTrials,
    #[error("deviation angle must be within -180..=180 degrees, got {0}")]
    DeviationAngle(f64),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable configuration snapshot for one session.
///
/// The state machine never mutates it; a reload produces a new snapshot
/// that is applied only at a session boundary, after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub circle_center: Point,
    /// Radius of the circle the targets sit on; crossing it ends a trial.
    pub orbit_radius: f64,
    /// Hit radius of the target itself.
    pub target_radius: f64,
    pub result_display_ms: u64,
    pub max_trials: usize,
    /// Trial index from which the deviation stays active.
    pub deviation_start_trial: usize,
    /// Clockwise perturbation of cursor displacement, in degrees.
    pub deviation_angle_deg: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            circle_center: Point::new(960.0, 540.0),
            orbit_radius: 378.0,
            target_radius: 50.0,
            result_display_ms: 500,
            max_trials: 16,
            deviation_start_trial: 8,
            deviation_angle_deg: 15.0,
        }
    }
}

impl SessionConfig {
    /// Recomputes the screen-dependent geometry: circle centered on the
    /// screen, orbit radius at 35% of the smaller dimension.
    pub fn derive_for_screen(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self.circle_center = Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        self.orbit_radius = (f64::from(width.min(height)) * 0.35).floor();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1.0..=200.0).contains(&self.target_radius) {
            return Err(ConfigError::TargetRadius(self.target_radius));
        }
        if self.orbit_radius <= self.target_radius {
            return Err(ConfigError::OrbitRadius {
                orbit: self.orbit_radius,
                target: self.target_radius,
            });
        }
        if !(50..=10_000).contains(&self.result_display_ms) {
            return Err(ConfigError::DisplayDuration(self.result_display_ms));
        }
        if self.max_trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if !(-180.0..=180.0).contains(&self.deviation_angle_deg) {
            return Err(ConfigError::DeviationAngle(self.deviation_angle_deg));
        }
        Ok(())
    }

    /// Loads and validates a configuration snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
