use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Thresholds for the sample filter and the windowed classifier.
/// Units are the sensor's native m/s² and nanoseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub avg_smooth_time_ns: i64,
    pub min_time_window_ns: i64,
    pub min_significant_motion: f32,
    pub max_still_tolerance: f32,
    pub max_facedown_deviation: f32,
    pub min_queue_length: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            avg_smooth_time_ns: 500_000_000,
            min_time_window_ns: 500_000_000,
            min_significant_motion: 0.5,
            max_still_tolerance: 1.0,
            max_facedown_deviation: 2.0,
            min_queue_length: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Tilt angle that selects a direction, degrees.
    pub default_angle_deg: i32,
    pub tolerance_deg: i32,
    /// Repeat period; the first tick comes after half of it.
    pub interval_ms: i64,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            default_angle_deg: 40,
            tolerance_deg: 10,
            interval_ms: 1000,
        }
    }
}

impl TiltConfig {
    /// Longest interval whose nanosecond value fits in an `i64`.
    pub const MAX_INTERVAL_MS: i64 = i64::MAX / 1_000_000;
    /// Angles are compared as whole degrees within a half turn.
    pub const MAX_ANGLE_DEG: i32 = 180;

    pub fn interval_ns(&self) -> i64 {
        self.interval_ms.saturating_mul(1_000_000)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub motion: MotionConfig,
    pub tilt: TiltConfig,
    /// Host setting; when false the proximity gate is never started.
    pub proximity_enabled: bool,
    pub wake_duration_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            tilt: TiltConfig::default(),
            proximity_enabled: true,
            wake_duration_ms: 5000,
        }
    }
}

impl DetectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let motion = &self.motion;
        if motion.avg_smooth_time_ns <= 0 {
            return Err(ConfigError::Invalid(
                "motion.avg_smooth_time_ns must be positive".to_string(),
            ));
        }
        if motion.min_time_window_ns <= 0 {
            return Err(ConfigError::Invalid(
                "motion.min_time_window_ns must be positive".to_string(),
            ));
        }
        if motion.min_queue_length == 0 {
            return Err(ConfigError::Invalid(
                "motion.min_queue_length must be at least 1".to_string(),
            ));
        }

        let tilt = &self.tilt;
        if tilt.interval_ms <= 0 || tilt.interval_ms > TiltConfig::MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "tilt.interval_ms must be in 1..={}",
                TiltConfig::MAX_INTERVAL_MS
            )));
        }
        if tilt.default_angle_deg <= 0 || tilt.default_angle_deg > TiltConfig::MAX_ANGLE_DEG {
            return Err(ConfigError::Invalid(format!(
                "tilt.default_angle_deg must be in 1..={}",
                TiltConfig::MAX_ANGLE_DEG
            )));
        }
        if tilt.tolerance_deg < 0 || tilt.tolerance_deg > TiltConfig::MAX_ANGLE_DEG {
            return Err(ConfigError::Invalid(format!(
                "tilt.tolerance_deg must be in 0..={}",
                TiltConfig::MAX_ANGLE_DEG
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.motion.avg_smooth_time_ns, 500_000_000);
        assert_eq!(config.motion.min_time_window_ns, 500_000_000);
        assert_eq!(config.motion.min_queue_length, 4);
        assert_eq!(config.tilt.interval_ns(), 1_000_000_000);
        assert_eq!(config.wake_duration_ms, 5000);
        assert!(config.proximity_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config =
            DetectorConfig::from_json_str(r#"{"tilt": {"interval_ms": 250}, "proximity_enabled": false}"#)
                .unwrap();
        assert_eq!(config.tilt.interval_ms, 250);
        assert_eq!(config.tilt.default_angle_deg, 40);
        assert!(!config.proximity_enabled);
        assert_eq!(config.motion, MotionConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DetectorConfig::from_json_str(r#"{"motion": {"avg_smooth_time_ns": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = DetectorConfig::from_json_str(r#"{"motion": {"min_queue_length": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = DetectorConfig::from_json_str(r#"{"tilt": {"tolerance_deg": -1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_tilt_interval_must_fit_in_nanoseconds() {
        let err = DetectorConfig::from_json_str(r#"{"tilt":{"interval_ms":9223372036854775}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let json = format!(r#"{{"tilt":{{"interval_ms":{}}}}}"#, TiltConfig::MAX_INTERVAL_MS);
        let config = DetectorConfig::from_json_str(&json).unwrap();
        assert!(config.tilt.interval_ns() > 0);

        // Built without validation, the conversion saturates instead of overflowing.
        let tilt = TiltConfig {
            interval_ms: i64::MAX,
            ..TiltConfig::default()
        };
        assert_eq!(tilt.interval_ns(), i64::MAX);
    }

    #[test]
    fn test_tilt_angles_bounded() {
        let err = DetectorConfig::from_json_str(r#"{"tilt":{"tolerance_deg":2147483647}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = DetectorConfig::from_json_str(r#"{"tilt":{"default_angle_deg":181}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = DetectorConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
