use gesture_detector_rs::{AccelSample, ProximitySample, SensorInventory};

use crate::error::{GestureDetectorError, JResult};

/// One Android `SensorEvent`, already unpacked by the Kotlin side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Accel(AccelSample),
    Proximity { timestamp: i64, sample: ProximitySample },
}

impl SensorReading {
    /// `timestamp` is `SensorEvent.timestamp` (ns). Zero is reserved for
    /// "no history" in the gravity filter, so it is rejected.
    pub fn accel(timestamp: i64, x: f32, y: f32, z: f32) -> JResult<Self> {
        check_timestamp(timestamp)?;
        Ok(SensorReading::Accel(AccelSample::new(timestamp, x, y, z)))
    }

    pub fn proximity(timestamp: i64, distance: f32, max_range: f32) -> JResult<Self> {
        check_timestamp(timestamp)?;
        if !(max_range > 0.0) {
            return Err(GestureDetectorError::InvalidParameters(format!(
                "proximity max range must be positive, got {}",
                max_range
            )));
        }
        Ok(SensorReading::Proximity {
            timestamp,
            sample: ProximitySample::new(distance, max_range),
        })
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SensorReading::Accel(sample) => sample.timestamp,
            SensorReading::Proximity { timestamp, .. } => *timestamp,
        }
    }
}

/// Sensors the host found via `SensorManager.getDefaultSensor`.
pub fn inventory_from_flags(has_accelerometer: bool, has_proximity: bool) -> SensorInventory {
    SensorInventory {
        accelerometer: has_accelerometer,
        proximity: has_proximity,
    }
}

fn check_timestamp(timestamp: i64) -> JResult<()> {
    if timestamp <= 0 {
        return Err(GestureDetectorError::InvalidParameters(format!(
            "sensor timestamp must be positive, got {}",
            timestamp
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_reading() {
        let reading = SensorReading::accel(42, 0.0, 0.0, 9.81).unwrap();
        assert_eq!(reading.timestamp(), 42);
        assert!(SensorReading::accel(0, 0.0, 0.0, 9.81).is_err());
        // Non-finite values pass through; the filter decides what they mean.
        assert!(SensorReading::accel(1, f32::NAN, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_proximity_requires_range() {
        assert!(SensorReading::proximity(5, 0.0, 5.0).is_ok());
        assert!(SensorReading::proximity(5, 0.0, 0.0).is_err());
        assert!(SensorReading::proximity(5, 0.0, f32::NAN).is_err());
    }

    #[test]
    fn test_inventory_flags() {
        assert_eq!(inventory_from_flags(true, true), SensorInventory::all());
        assert!(!inventory_from_flags(false, true).accelerometer);
    }
}
