//! Posture Configuration - classifier thresholds and session tuning as TOML values
//!
//! Each struct implements `Default` with the built-in values, so a missing or
//! empty config file behaves exactly like the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "POSTURE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "posture_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `PostureConfig::load()` which searches:
/// 1. `$POSTURE_CONFIG` env var
/// 2. `./posture_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostureConfig {
    /// Posture classification thresholds
    #[serde(default)]
    pub thresholds: PostureThresholds,

    /// Landmark filtering
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Session loop tuning
    #[serde(default)]
    pub session: SessionConfig,

    /// Recording replay pacing
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl PostureConfig {
    /// Load configuration using the standard search order:
    /// 1. `$POSTURE_CONFIG` environment variable
    /// 2. `./posture_config.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that exists but fails to load is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded posture config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded posture config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are logged as warnings; invalid values are an error.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Posture config saved");
        Ok(())
    }

    /// Validate all values.
    ///
    /// Rules:
    /// - Thresholds must be finite and in (0, 1]
    /// - `min_visibility` must be in [0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.thresholds;
        Self::check_threshold(t.neck_threshold, "thresholds.neck_threshold", &mut errors);
        Self::check_threshold(t.spine_threshold, "thresholds.spine_threshold", &mut errors);
        Self::check_threshold(
            t.shoulder_threshold,
            "thresholds.shoulder_threshold",
            &mut errors,
        );

        let v = self.detection.min_visibility;
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            errors.push(format!(
                "detection.min_visibility = {v} must be between 0 and 1"
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_threshold(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness first
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
            return;
        }
        if value <= 0.0 || value > 1.0 {
            errors.push(format!(
                "{name} = {value:.3} must be in (0, 1] (normalized image units)"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Thresholds
// ============================================================================

/// Posture classification thresholds in normalized image units.
///
/// A measurement strictly greater than its threshold fails the check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PostureThresholds {
    /// Applied to each side's ear-to-shoulder horizontal offset
    #[serde(default = "default_neck_threshold")]
    pub neck_threshold: f64,

    /// Applied to the mean shoulder-to-hip horizontal offset
    #[serde(default = "default_spine_threshold")]
    pub spine_threshold: f64,

    /// Applied to the vertical offset between the shoulders
    #[serde(default = "default_shoulder_threshold")]
    pub shoulder_threshold: f64,
}

fn default_neck_threshold() -> f64 {
    defaults::NECK_THRESHOLD
}
fn default_spine_threshold() -> f64 {
    defaults::SPINE_THRESHOLD
}
fn default_shoulder_threshold() -> f64 {
    defaults::SHOULDER_THRESHOLD
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            neck_threshold: default_neck_threshold(),
            spine_threshold: default_spine_threshold(),
            shoulder_threshold: default_shoulder_threshold(),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// Landmarks reported with a lower visibility are treated as missing
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f64,
}

fn default_min_visibility() -> f64 {
    defaults::MIN_VISIBILITY
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_visibility: default_min_visibility(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Stop the session after this many seconds (0 = until stopped)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Frames between progress log lines (0 = no progress lines)
    #[serde(default = "default_progress_log_interval")]
    pub progress_log_interval_frames: u64,
}

fn default_max_duration_secs() -> u64 {
    defaults::MAX_SESSION_DURATION_SECS
}
fn default_progress_log_interval() -> u64 {
    defaults::PROGRESS_LOG_INTERVAL_FRAMES
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            progress_log_interval_frames: default_progress_log_interval(),
        }
    }
}

// ============================================================================
// Replay
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReplayConfig {
    /// Delay between recorded frames at 1x speed (ms)
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

fn default_frame_delay_ms() -> u64 {
    defaults::REPLAY_FRAME_DELAY_MS
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
