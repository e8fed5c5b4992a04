use log::debug;

use crate::types::{MotionType, ProximitySample};

/// Watches the proximity sensor while the device lies face-up and still.
///
/// `running` mirrors whether the host has the proximity sensor registered;
/// `armed` follows the dispatcher's last confirmed orientation. Only a running,
/// armed gate reacts to readings, and one near reading is enough.
#[derive(Clone, Debug)]
pub struct ProximityGate {
    available: bool,
    running: bool,
    armed: bool,
}

impl ProximityGate {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            running: false,
            armed: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_armed(&self) -> bool {
        self.running && self.armed
    }

    pub fn start(&mut self) {
        if !self.available {
            return;
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Re-arm or disarm to match the last confirmed orientation.
    pub fn sync(&mut self, prior_type: MotionType) {
        let armed = prior_type == MotionType::FaceUp;
        if armed != self.armed {
            debug!("proximity gate {}", if armed { "armed" } else { "disarmed" });
            self.armed = armed;
        }
    }

    /// True when this reading should wake the device.
    pub fn on_sample(&self, sample: &ProximitySample) -> bool {
        self.is_armed() && sample.is_near()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_face_up_arms() {
        let mut gate = ProximityGate::new(true);
        gate.start();
        let near = ProximitySample::new(0.0, 5.0);

        gate.sync(MotionType::FaceDown);
        assert!(!gate.on_sample(&near));
        gate.sync(MotionType::Other);
        assert!(!gate.on_sample(&near));
        gate.sync(MotionType::FaceUp);
        assert!(gate.on_sample(&near));
        assert!(!gate.on_sample(&ProximitySample::new(5.0, 5.0)));
    }

    #[test]
    fn test_stopped_gate_ignores_readings() {
        let mut gate = ProximityGate::new(true);
        gate.sync(MotionType::FaceUp);
        assert!(!gate.on_sample(&ProximitySample::new(0.0, 5.0)));
        gate.start();
        gate.stop();
        assert!(!gate.is_armed());
    }

    #[test]
    fn test_missing_sensor_never_runs() {
        let mut gate = ProximityGate::new(false);
        gate.start();
        gate.sync(MotionType::FaceUp);
        assert!(!gate.is_running());
        assert!(!gate.on_sample(&ProximitySample::new(0.0, 5.0)));
    }
}
