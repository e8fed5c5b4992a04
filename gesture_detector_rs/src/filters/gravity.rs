use glam::Vec3;
use log::trace;

use crate::config::MotionConfig;
use crate::types::{AccelSample, MotionType};

/// Low-pass gravity estimate and per-sample classifier.
///
/// The exponential average approximates g under the assumption that the
/// device is near-static most of the time. Each sample is compared both to
/// that average (acceleration) and to the previous raw sample (jitter).
#[derive(Clone, Debug)]
pub struct GravityFilter {
    avg: Vec3,
    previous: Vec3,
    /// 0 means no history: the next sample only seeds `avg` and `previous`.
    previous_timestamp: i64,

    avg_smooth_time_ns: f32,
    min_significant_motion: f32,
    max_still_tolerance: f32,
    max_facedown_deviation: f32,
}

impl GravityFilter {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            avg: Vec3::ZERO,
            previous: Vec3::ZERO,
            previous_timestamp: 0,
            avg_smooth_time_ns: config.avg_smooth_time_ns as f32,
            min_significant_motion: config.min_significant_motion,
            max_still_tolerance: config.max_still_tolerance,
            max_facedown_deviation: config.max_facedown_deviation,
        }
    }

    /// Drop all history; the next sample seeds the filter again.
    pub fn reset(&mut self) {
        self.previous_timestamp = 0;
    }

    pub fn has_history(&self) -> bool {
        self.previous_timestamp != 0
    }

    pub fn average(&self) -> Vec3 {
        self.avg
    }

    pub fn previous(&self) -> Vec3 {
        self.previous
    }

    /// Absorb one sample. Returns `None` for the seeding sample.
    pub fn ingest(&mut self, sample: &AccelSample) -> Option<MotionType> {
        let values = sample.vector();

        if self.previous_timestamp == 0 {
            self.previous_timestamp = sample.timestamp;
            self.avg = values;
            self.previous = values;
            return None;
        }

        let delta_t = sample.timestamp - self.previous_timestamp;
        let alpha = delta_t as f32 / self.avg_smooth_time_ns;
        self.avg = values * alpha + self.avg * (1.0 - alpha);

        let abs_values = values.abs();
        let acc_delta_sum = (abs_values - self.avg.abs()).abs().dot(Vec3::ONE);
        let sample_delta_sum = (abs_values - self.previous.abs()).abs().dot(Vec3::ONE);
        let magnitude = values.length();

        let is_accelerating = acc_delta_sum > self.min_significant_motion;
        let is_still = sample_delta_sum < self.max_still_tolerance
            && (magnitude - sample.z.abs()).abs() < self.max_facedown_deviation;

        let motion_type = if is_still {
            if sample.z < 0.0 {
                MotionType::FaceDown
            } else {
                MotionType::FaceUp
            }
        } else if is_accelerating {
            MotionType::Accelerating
        } else {
            MotionType::Other
        };

        trace!(
            "t={} acc_delta={:.3} sample_delta={:.3} |a|={:.3} -> {:?}",
            sample.timestamp,
            acc_delta_sum,
            sample_delta_sum,
            magnitude,
            motion_type
        );

        self.previous = values;
        self.previous_timestamp = sample.timestamp;
        Some(motion_type)
    }
}
