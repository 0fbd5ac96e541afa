//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first parse raw TOML into `toml::Value`, walk the
//! key tree, compare against known field names, and emit warnings with "did
//! you mean?" suggestions. Then proceed with normal serde deserialization.
//! Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults::SUSPICIOUS_THRESHOLD;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for PostureConfig.
///
/// Maintained by hand to match the struct hierarchy in posture_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [thresholds]
        "thresholds",
        "thresholds.neck_threshold",
        "thresholds.spine_threshold",
        "thresholds.shoulder_threshold",
        // [detection]
        "detection",
        "detection.min_visibility",
        // [session]
        "session",
        "session.max_duration_secs",
        "session.progress_log_interval_frames",
        // [replay]
        "replay",
        "replay.frame_delay_ms",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key so the suggestion is stable across runs
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails on unknown keys; parse errors are left for serde to report.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check values that parse fine but make little sense.
///
/// Returns (errors, warnings). Errors prevent startup; warnings are logged.
pub fn validate_ranges(config: &super::PostureConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let errors = Vec::new();
    let mut warnings = Vec::new();

    let t = &config.thresholds;
    for (field, value) in [
        ("thresholds.neck_threshold", t.neck_threshold),
        ("thresholds.spine_threshold", t.spine_threshold),
        ("thresholds.shoulder_threshold", t.shoulder_threshold),
    ] {
        if value.is_finite() && value > SUSPICIOUS_THRESHOLD && value <= 1.0 {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!(
                    "{field} = {value:.3} is above {SUSPICIOUS_THRESHOLD}; \
                     almost every posture will pass this check"
                ),
                suggestion: None,
            });
        }
    }

    if config.replay.frame_delay_ms > 1_000 {
        warnings.push(ValidationWarning {
            field: "replay.frame_delay_ms".to_string(),
            message: format!(
                "replay.frame_delay_ms = {} is slower than 1 fps",
                config.replay.frame_delay_ms
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
