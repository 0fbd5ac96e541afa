//! Posture score: share of session time spent in good posture.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("Session has zero total elapsed time; no score can be computed")]
    DegenerateSession,
}

/// `posture / total * 100`, clamped to [0, 100].
///
/// Fails with [`ScoreError::DegenerateSession`] when `total` is zero instead of
/// returning NaN or infinity.
pub fn compute_score(posture: Duration, total: Duration) -> Result<f64, ScoreError> {
    if total.is_zero() {
        return Err(ScoreError::DegenerateSession);
    }
    let score = posture.as_secs_f64() / total.as_secs_f64() * 100.0;
    Ok(score.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_of_ten_is_eighty() {
        let score = compute_score(Duration::from_secs(8), Duration::from_secs(10)).unwrap();
        assert_eq!(format!("{score:.2}"), "80.00");
    }

    #[test]
    fn zero_total_is_degenerate() {
        assert_eq!(
            compute_score(Duration::ZERO, Duration::ZERO),
            Err(ScoreError::DegenerateSession)
        );
        assert_eq!(
            compute_score(Duration::from_secs(1), Duration::ZERO),
            Err(ScoreError::DegenerateSession)
        );
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(
            compute_score(Duration::from_secs(11), Duration::from_secs(10)),
            Ok(100.0)
        );
        assert_eq!(compute_score(Duration::ZERO, Duration::from_secs(10)), Ok(0.0));
    }

    #[test]
    fn sub_second_sessions_score() {
        let score = compute_score(Duration::from_millis(250), Duration::from_millis(500)).unwrap();
        assert!((score - 50.0).abs() < 1e-9);
    }
}
