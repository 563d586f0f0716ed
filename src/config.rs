//! Configuration management for rep counting and feedback tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! so thresholds, posture limits and the announcement cooldown can be
//! adjusted per deployment without recompilation. Every section is
//! optional in the file; missing fields fall back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::calibration::{
    RepThresholds, ENGAGE_THRESHOLD_ANGLE, LEARN_TARGET, RECOVERY_THRESHOLD_ANGLE,
};
use crate::feedback::{PostureLimits, COOLDOWN_SECONDS};
use crate::feedback::classifier::{MAX_BACK_ANGLE, MIN_BACK_ANGLE};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "PHYSIO_TRAINER_CONFIG";

/// Config file used when the environment variable is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/physio_trainer.json";

/// Upper bound on `learn_target`; keeps the per-session minima list small
pub const MAX_LEARN_TARGET: u32 = 32;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rep_counting: RepCountingConfig,
    pub feedback: FeedbackConfig,
    pub server: ServerConfig,
}

/// Rep counting state machine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepCountingConfig {
    /// Knee angle at or above which the joint counts as extended
    pub recovery_threshold_angle: f64,
    /// Knee angle below which the joint counts as flexed while learning
    pub engage_threshold_angle: f64,
    /// Reps used to learn the personalized baseline
    pub learn_target: u32,
}

impl Default for RepCountingConfig {
    fn default() -> Self {
        Self {
            recovery_threshold_angle: RECOVERY_THRESHOLD_ANGLE,
            engage_threshold_angle: ENGAGE_THRESHOLD_ANGLE,
            learn_target: LEARN_TARGET,
        }
    }
}

impl RepCountingConfig {
    pub fn thresholds(&self) -> RepThresholds {
        RepThresholds {
            recovery_angle: self.recovery_threshold_angle,
            engage_angle: self.engage_threshold_angle,
            learn_target: self.learn_target,
        }
    }
}

/// Posture classification and announcement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Back angles below this ask the user to lean forward
    pub min_back_angle: f64,
    /// Back angles above this ask the user to straighten up
    pub max_back_angle: f64,
    /// Minimum interval between spoken announcements
    pub cooldown_seconds: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_back_angle: MIN_BACK_ANGLE,
            max_back_angle: MAX_BACK_ANGLE,
            cooldown_seconds: COOLDOWN_SECONDS,
        }
    }
}

impl FeedbackConfig {
    pub fn posture_limits(&self) -> PostureLimits {
        PostureLimits {
            min_back_angle: self.min_back_angle,
            max_back_angle: self.max_back_angle,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

impl AppConfig {
    /// Check threshold relationships
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is usable
    /// * `Err(String)` - Description of the first violated constraint
    pub fn validate(&self) -> Result<(), String> {
        let rep = &self.rep_counting;
        for (name, value) in [
            ("recovery_threshold_angle", rep.recovery_threshold_angle),
            ("engage_threshold_angle", rep.engage_threshold_angle),
        ] {
            if !(0.0..=180.0).contains(&value) {
                return Err(format!("{name} must be within [0, 180], got {value}"));
            }
        }
        if rep.engage_threshold_angle >= rep.recovery_threshold_angle {
            return Err(format!(
                "engage_threshold_angle ({}) must be below recovery_threshold_angle ({})",
                rep.engage_threshold_angle, rep.recovery_threshold_angle
            ));
        }
        if rep.learn_target > MAX_LEARN_TARGET {
            return Err(format!(
                "learn_target must be at most {MAX_LEARN_TARGET}, got {}",
                rep.learn_target
            ));
        }

        let feedback = &self.feedback;
        if !feedback.min_back_angle.is_finite()
            || !feedback.max_back_angle.is_finite()
            || feedback.min_back_angle >= feedback.max_back_angle
        {
            return Err(format!(
                "min_back_angle ({}) must be below max_back_angle ({})",
                feedback.min_back_angle, feedback.max_back_angle
            ));
        }
        Ok(())
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file is missing,
    /// unparseable, or fails [`AppConfig::validate`]
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json_or_default(&contents, path.as_ref()),
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    fn from_json_or_default(contents: &str, path: &Path) -> Self {
        match serde_json::from_str::<AppConfig>(contents) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    log::info!("[Config] Loaded configuration from {:?}", path);
                    config
                }
                Err(reason) => {
                    log::warn!(
                        "[Config] Invalid configuration in {:?}: {}. Using defaults.",
                        path,
                        reason
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                    path,
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `$PHYSIO_TRAINER_CONFIG`, or the default path
    pub fn load() -> Self {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(path),
            _ => Self::load_from_file(DEFAULT_CONFIG_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.rep_counting.recovery_threshold_angle, 160.0);
        assert_eq!(config.rep_counting.engage_threshold_angle, 140.0);
        assert_eq!(config.rep_counting.learn_target, 2);
        assert_eq!(config.feedback.cooldown_seconds, 10);
        assert_eq!(config.feedback.min_back_angle, 20.0);
        assert_eq!(config.feedback.max_back_angle, 45.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "rep_counting": { "learn_target": 3 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.rep_counting.learn_target, 3);
        assert_eq!(config.rep_counting.recovery_threshold_angle, 160.0);
        assert_eq!(config.feedback, FeedbackConfig::default());
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.rep_counting.engage_threshold_angle = 165.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rep_counting.recovery_threshold_angle = 190.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.feedback.min_back_angle = 50.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rep_counting.learn_target = MAX_LEARN_TARGET + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let json = r#"{ "rep_counting": { "engage_threshold_angle": 170.0 } }"#;
        let config = AppConfig::from_json_or_default(json, Path::new("inline.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_conversions() {
        let config = AppConfig::default();
        let thresholds = config.rep_counting.thresholds();
        assert_eq!(thresholds, RepThresholds::default());
        assert_eq!(config.feedback.posture_limits(), PostureLimits::default());
        assert_eq!(config.feedback.cooldown(), Duration::from_secs(10));
    }
}
