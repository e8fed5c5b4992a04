use serde::{Deserialize, Serialize};

use crate::types::{AccelSample, ProximitySample, SensorInventory};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelValues {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One recorded reading. Exactly one of `accel` / `proximity` is set by the
/// recorders here; readers accept either or both.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedReading {
    /// Monotonic nanoseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel: Option<AccelValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<ProximitySample>,
}

impl LoggedReading {
    pub fn accel(sample: &AccelSample) -> Self {
        LoggedReading {
            timestamp: sample.timestamp,
            accel: Some(AccelValues {
                x: sample.x,
                y: sample.y,
                z: sample.z,
            }),
            proximity: None,
        }
    }

    pub fn proximity(timestamp: i64, sample: &ProximitySample) -> Self {
        LoggedReading {
            timestamp,
            accel: None,
            proximity: Some(*sample),
        }
    }

    pub fn accel_sample(&self) -> Option<AccelSample> {
        self.accel.map(|a| AccelSample::new(self.timestamp, a.x, a.y, a.z))
    }
}

/// Sensor log shared by the live monitor (`--output`), the synthetic example
/// and `replay`. Extra top-level fields are ignored on load.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SensorLog {
    /// Assume every sensor is present when the log does not say.
    #[serde(default = "SensorInventory::all")]
    pub sensors: SensorInventory,
    pub readings: Vec<LoggedReading>,
}

impl SensorLog {
    pub fn new(sensors: SensorInventory) -> Self {
        SensorLog {
            sensors,
            readings: Vec::new(),
        }
    }

    pub fn push(&mut self, reading: LoggedReading) {
        self.readings.push(reading);
    }

    /// Seconds between the first and last reading.
    pub fn duration_s(&self) -> f64 {
        match (self.readings.first(), self.readings.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp) as f64 * 1e-9,
            _ => 0.0,
        }
    }
}
