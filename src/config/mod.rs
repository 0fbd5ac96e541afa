//! Posture Configuration Module
//!
//! Classifier thresholds and session tuning loaded from TOML, with every value
//! defaulting to the built-in constants in [`defaults`].
//!
//! ## Loading Order
//!
//! 1. `--config <FILE>` on the command line (see `main.rs`)
//! 2. `POSTURE_CONFIG` environment variable (path to TOML file)
//! 3. `posture_config.toml` in the current working directory
//! 4. Built-in defaults
//!
//! The loaded config is passed by value to the session; there is no global.
//!
//! ```toml
//! [thresholds]
//! neck_threshold = 0.1
//! spine_threshold = 0.11
//! shoulder_threshold = 0.05
//!
//! [session]
//! max_duration_secs = 1800
//! ```

mod posture_config;
pub mod defaults;
pub mod validation;

pub use posture_config::*;
