use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Raw accelerometer reading, m/s² per axis, monotonic nanosecond timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub timestamp: i64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub fn new(timestamp: i64, x: f32, y: f32, z: f32) -> Self {
        Self { timestamp, x, y, z }
    }

    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn magnitude(&self) -> f32 {
        self.vector().length()
    }
}

/// Proximity reading. `max_range` is the sensor's reported maximum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProximitySample {
    pub distance: f32,
    pub max_range: f32,
}

impl ProximitySample {
    pub fn new(distance: f32, max_range: f32) -> Self {
        Self {
            distance,
            max_range,
        }
    }

    /// Readings below half the range count as "near". Binary sensors report
    /// either 0 or their maximum, continuous ones anything in between.
    pub fn is_near(&self) -> bool {
        self.distance < self.max_range / 2.0
    }
}

/// Which sensors the host found at construction time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorInventory {
    pub accelerometer: bool,
    pub proximity: bool,
}

impl SensorInventory {
    pub fn all() -> Self {
        Self {
            accelerometer: true,
            proximity: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionType {
    FaceDown,
    FaceUp,
    Accelerating,
    /// No confident classification.
    Other,
}

/// Confirmed, deduplicated motion events delivered to a [`crate::listener::MotionListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionEvent {
    SignificantMotion,
    FaceDownStill,
    FaceUpStill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Value carried by a touch-rate callback: a repeat counter, or the release marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchRate {
    Repeat(i32),
    Release,
}

impl TouchRate {
    /// Sentinel used when the value has to travel as a plain integer.
    pub const RELEASE: i32 = -1;

    pub fn as_raw(self) -> i32 {
        match self {
            TouchRate::Repeat(counter) => counter,
            TouchRate::Release => Self::RELEASE,
        }
    }
}

/// Everything an engine can emit, in one serializable stream.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorEvent {
    Motion { event: MotionEvent },
    TouchRate { direction: Direction, value: TouchRate },
    WakeRequest { duration_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_magnitude() {
        let accel = AccelSample::new(1, 3.0, 4.0, 0.0);
        assert_eq!(accel.magnitude(), 5.0);
    }

    #[test]
    fn test_proximity_near_is_below_mid_range() {
        assert!(ProximitySample::new(0.0, 5.0).is_near());
        assert!(!ProximitySample::new(2.5, 5.0).is_near());
        assert!(!ProximitySample::new(5.0, 5.0).is_near());
    }

    #[test]
    fn test_touch_rate_raw_values() {
        assert_eq!(TouchRate::Repeat(3).as_raw(), 3);
        assert_eq!(TouchRate::Release.as_raw(), TouchRate::RELEASE);
    }

    #[test]
    fn test_event_json_shape() {
        let event = DetectorEvent::TouchRate {
            direction: Direction::Up,
            value: TouchRate::Repeat(0),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"touch_rate\""));
        assert!(json.contains("Up"));
    }
}
