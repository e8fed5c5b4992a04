use log::{debug, info};
use std::time::Duration;

use crate::config::DetectorConfig;
use crate::filters::gravity::GravityFilter;
use crate::listener::{MotionListener, WakeRequester};
use crate::proximity::ProximityGate;
use crate::samples_queue::SamplesQueue;
use crate::types::{AccelSample, MotionEvent, MotionType, ProximitySample, SensorInventory};

/// Lifecycle flags plus the last orientation that was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatcherState {
    pub enabled: bool,
    pub suspended: bool,
    /// User-interest detection is wanted (survives suspend/resume).
    pub busy: bool,
    pub prior_type: MotionType,
}

impl Default for DispatcherState {
    fn default() -> Self {
        Self {
            enabled: false,
            suspended: false,
            busy: false,
            prior_type: MotionType::Other,
        }
    }
}

/// Where confirmed events go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routing {
    /// Forward to the registered listener.
    Listener,
    /// User-interest detection: significant motion (or a near proximity
    /// reading while face-up) wakes the device and stops detection.
    Reawaken,
}

/// Motion event dispatcher: filter -> windowed classifier -> deduplicated events.
pub struct MotionDetector {
    inventory: SensorInventory,
    config: DetectorConfig,
    filter: GravityFilter,
    queue: SamplesQueue,
    state: DispatcherState,
    ingesting: bool,
    routing: Routing,
    proximity: ProximityGate,
    listener: Box<dyn MotionListener>,
    waker: Box<dyn WakeRequester>,
}

impl MotionDetector {
    pub fn new(
        inventory: SensorInventory,
        config: &DetectorConfig,
        listener: Box<dyn MotionListener>,
        waker: Box<dyn WakeRequester>,
    ) -> Self {
        if !inventory.accelerometer {
            info!("No accelerometer; motion detection disabled");
        }
        MotionDetector {
            inventory,
            config: config.clone(),
            filter: GravityFilter::new(&config.motion),
            queue: SamplesQueue::new(&config.motion),
            state: DispatcherState::default(),
            ingesting: false,
            routing: Routing::Listener,
            proximity: ProximityGate::new(inventory.proximity),
            listener,
            waker,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn MotionListener>) {
        self.listener = listener;
    }

    pub fn has_sensors(&self) -> bool {
        self.inventory.accelerometer
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn prior_type(&self) -> MotionType {
        self.state.prior_type
    }

    pub fn routing(&self) -> Routing {
        self.routing
    }

    /// Samples are only absorbed while enabled and not suspended.
    pub fn is_ingesting(&self) -> bool {
        self.ingesting
    }

    pub fn is_proximity_armed(&self) -> bool {
        self.proximity.is_armed()
    }

    /// Start forwarding events to the registered listener with fresh history.
    pub fn enable(&mut self) {
        if !self.has_sensors() {
            debug!("enable ignored: no accelerometer");
            return;
        }
        if self.state.suspended {
            debug!("enable ignored: suspended");
            return;
        }
        self.proximity.stop();
        self.state.busy = false;
        self.routing = Routing::Listener;
        self.start_motion();
        info!("Motion detector enabled");
    }

    pub fn disable(&mut self) {
        if !self.has_sensors() {
            debug!("disable ignored: no accelerometer");
            return;
        }
        if self.state.enabled {
            info!("Motion detector disabled");
        }
        self.stop_motion();
        self.proximity.stop();
    }

    /// Stop ingestion (as `disable`) without forgetting whether interest
    /// detection is wanted.
    pub fn suspend(&mut self) {
        if !self.has_sensors() {
            debug!("suspend ignored: no accelerometer");
            return;
        }
        if self.state.suspended {
            return;
        }
        self.state.suspended = true;
        self.stop_motion();
        self.proximity.stop();
        info!("Motion detector suspended (busy={})", self.state.busy);
    }

    /// Restart interest detection if it was wanted when suspended.
    /// Plain listener detection stays off until the host enables it again.
    pub fn resume(&mut self) {
        if !self.has_sensors() {
            debug!("resume ignored: no accelerometer");
            return;
        }
        if !self.state.suspended {
            return;
        }
        self.state.suspended = false;
        if self.state.busy {
            self.start_interest();
        }
        info!("Motion detector resumed (ingesting={})", self.ingesting);
    }

    /// Watch for the user reaching for the device; wake it when they do.
    /// Repeated calls while already watching are ignored.
    pub fn detect_user_interest(&mut self) {
        if !self.has_sensors() {
            debug!("interest detection ignored: no accelerometer");
            return;
        }
        if self.state.busy || self.state.suspended {
            debug!(
                "interest detection not started (busy={}, suspended={})",
                self.state.busy, self.state.suspended
            );
            return;
        }
        self.state.busy = true;
        self.start_interest();
        info!("Watching for user interest");
    }

    /// Handle one accelerometer reading. Returns the confirmed event, if any,
    /// after it has been routed.
    pub fn on_accel_sample(&mut self, sample: &AccelSample) -> Option<MotionEvent> {
        if !self.ingesting {
            return None;
        }

        let motion_type = self.filter.ingest(sample)?;
        let detected = self.queue.push(sample.timestamp, motion_type);
        self.queue
            .purge(sample.timestamp - self.config.motion.min_time_window_ns);

        if detected == MotionType::Other {
            return None;
        }
        // A confirmed run must not confirm again on the next sample.
        self.queue.clear();

        let event = match detected {
            MotionType::Accelerating => {
                self.state.prior_type = MotionType::Other;
                Some(MotionEvent::SignificantMotion)
            }
            MotionType::FaceDown | MotionType::FaceUp if detected == self.state.prior_type => {
                debug!("{:?} confirmed again, not repeated", detected);
                None
            }
            MotionType::FaceDown => {
                self.state.prior_type = MotionType::FaceDown;
                Some(MotionEvent::FaceDownStill)
            }
            MotionType::FaceUp => {
                self.state.prior_type = MotionType::FaceUp;
                Some(MotionEvent::FaceUpStill)
            }
            MotionType::Other => None,
        };
        self.proximity.sync(self.state.prior_type);

        if let Some(event) = event {
            self.dispatch(event);
        }
        event
    }

    /// Handle one proximity reading. Returns true when it woke the device.
    pub fn on_proximity_sample(&mut self, sample: &ProximitySample) -> bool {
        if !self.proximity.on_sample(sample) {
            return false;
        }
        info!(
            "Proximity near ({:.1} of {:.1}) while face-up",
            sample.distance, sample.max_range
        );
        self.reawaken();
        true
    }

    fn dispatch(&mut self, event: MotionEvent) {
        match self.routing {
            Routing::Listener => {
                info!("Dispatching {:?}", event);
                match event {
                    MotionEvent::SignificantMotion => self.listener.on_significant_motion(),
                    MotionEvent::FaceDownStill => self.listener.on_face_down_still(),
                    MotionEvent::FaceUpStill => self.listener.on_face_up_still(),
                }
            }
            Routing::Reawaken => match event {
                MotionEvent::SignificantMotion => self.reawaken(),
                _ => debug!("{:?} ignored while watching for interest", event),
            },
        }
    }

    fn start_motion(&mut self) {
        self.state.enabled = true;
        self.filter.reset();
        self.queue.clear();
        self.ingesting = !self.state.suspended;
    }

    fn stop_motion(&mut self) {
        self.state.enabled = false;
        self.ingesting = false;
        self.queue.clear();
        self.state.prior_type = MotionType::Other;
        self.proximity.sync(MotionType::Other);
    }

    fn start_interest(&mut self) {
        self.routing = Routing::Reawaken;
        self.proximity.stop();
        self.start_motion();
        if self.config.proximity_enabled {
            self.proximity.start();
        }
        self.proximity.sync(self.state.prior_type);
    }

    fn reawaken(&mut self) {
        self.stop_motion();
        self.proximity.stop();
        self.state.busy = false;
        let duration = Duration::from_millis(self.config.wake_duration_ms);
        info!("Reawakening display for {:?}", duration);
        self.waker.request_wake(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ChannelSink;
    use crate::types::DetectorEvent;
    use crossbeam::channel::Receiver;

    const MS: i64 = 1_000_000;
    const STEP: i64 = 20 * MS;

    fn detector(inventory: SensorInventory) -> (MotionDetector, Receiver<DetectorEvent>) {
        detector_with(inventory, DetectorConfig::default())
    }

    fn detector_with(
        inventory: SensorInventory,
        config: DetectorConfig,
    ) -> (MotionDetector, Receiver<DetectorEvent>) {
        let (sink, rx) = ChannelSink::new();
        let d = MotionDetector::new(inventory, &config, Box::new(sink.clone()), Box::new(sink));
        (d, rx)
    }

    /// Flat and still for `duration_ms`, starting at `*t`.
    fn still(d: &mut MotionDetector, t: &mut i64, duration_ms: i64, z: f32) -> Vec<MotionEvent> {
        let end = *t + duration_ms * MS;
        let mut events = Vec::new();
        while *t < end {
            if let Some(e) = d.on_accel_sample(&AccelSample::new(*t, 0.0, 0.0, z)) {
                events.push(e);
            }
            *t += STEP;
        }
        events
    }

    /// Shake along x until the first confirmed significant motion.
    fn shake_until_motion(d: &mut MotionDetector, t: &mut i64) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        for i in 0..200 {
            let x = if i % 2 == 0 { 6.0 } else { 0.0 };
            let event = d.on_accel_sample(&AccelSample::new(*t, x, 0.0, 9.81));
            *t += STEP;
            if let Some(e) = event {
                events.push(e);
                if e == MotionEvent::SignificantMotion {
                    return events;
                }
            }
        }
        panic!("shaking never confirmed significant motion: {:?}", events);
    }

    fn drain(rx: &Receiver<DetectorEvent>) -> Vec<DetectorEvent> {
        rx.try_iter().collect()
    }

    fn motion(event: MotionEvent) -> DetectorEvent {
        DetectorEvent::Motion { event }
    }

    #[test]
    fn test_first_sample_never_dispatches() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        assert_eq!(d.on_accel_sample(&AccelSample::new(MS, 50.0, -50.0, 9.0)), None);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_face_up_reported_once() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        let mut t = 1_000 * MS;
        let events = still(&mut d, &mut t, 2_000, 9.81);
        assert_eq!(events, vec![MotionEvent::FaceUpStill]);
        assert_eq!(drain(&rx), vec![motion(MotionEvent::FaceUpStill)]);
        assert_eq!(d.prior_type(), MotionType::FaceUp);
    }

    #[test]
    fn test_face_down_after_face_up() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        still(&mut d, &mut t, 1_500, -9.81);
        assert_eq!(
            drain(&rx),
            vec![
                motion(MotionEvent::FaceUpStill),
                motion(MotionEvent::FaceDownStill)
            ]
        );
    }

    #[test]
    fn test_accelerating_rearms_orientation() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        shake_until_motion(&mut d, &mut t);
        assert_eq!(d.prior_type(), MotionType::Other);
        still(&mut d, &mut t, 1_000, 9.81);

        assert_eq!(
            drain(&rx),
            vec![
                motion(MotionEvent::FaceUpStill),
                motion(MotionEvent::SignificantMotion),
                motion(MotionEvent::FaceUpStill),
            ]
        );
    }

    #[test]
    fn test_disable_forgets_prior_orientation() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        d.disable();
        d.disable();
        assert!(!d.is_ingesting());
        assert_eq!(d.prior_type(), MotionType::Other);
        assert!(still(&mut d, &mut t, 1_000, 9.81).is_empty());

        d.enable();
        still(&mut d, &mut t, 1_000, 9.81);
        assert_eq!(
            drain(&rx),
            vec![
                motion(MotionEvent::FaceUpStill),
                motion(MotionEvent::FaceUpStill)
            ]
        );
    }

    #[test]
    fn test_suspend_and_resume_are_idempotent() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.enable();
        d.resume();
        assert!(d.is_ingesting());

        d.suspend();
        d.suspend();
        assert!(!d.is_ingesting());
        let mut t = 1_000 * MS;
        assert!(still(&mut d, &mut t, 1_000, 9.81).is_empty());

        // Listener detection was not busy, so resume leaves it off.
        d.resume();
        d.resume();
        assert!(!d.state().suspended);
        assert!(!d.state().enabled);
        assert!(!d.is_ingesting());
        assert!(still(&mut d, &mut t, 1_200, 9.81).is_empty());
        assert!(drain(&rx).is_empty());

        d.enable();
        still(&mut d, &mut t, 1_000, 9.81);
        assert_eq!(drain(&rx), vec![motion(MotionEvent::FaceUpStill)]);
    }

    #[test]
    fn test_enable_while_suspended_is_ignored() {
        let (mut d, _rx) = detector(SensorInventory::all());
        d.suspend();
        d.enable();
        assert!(!d.state().enabled);
        assert!(!d.is_ingesting());
        d.resume();
        assert!(!d.is_ingesting());
        d.enable();
        assert!(d.is_ingesting());
    }

    #[test]
    fn test_without_accelerometer_everything_is_a_no_op() {
        let (mut d, rx) = detector(SensorInventory::none());
        assert!(!d.has_sensors());
        d.enable();
        d.detect_user_interest();
        d.suspend();
        d.resume();
        let mut t = 1_000 * MS;
        assert!(still(&mut d, &mut t, 2_000, 9.81).is_empty());
        assert!(!d.on_proximity_sample(&ProximitySample::new(0.0, 5.0)));
        d.disable();
        d.disable();
        assert!(drain(&rx).is_empty());
        assert_eq!(d.state(), DispatcherState::default());
    }

    #[test]
    fn test_interest_wakes_on_motion() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.detect_user_interest();
        assert!(d.state().busy);
        assert_eq!(d.routing(), Routing::Reawaken);

        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        shake_until_motion(&mut d, &mut t);

        // Orientation is not forwarded; the wake request is.
        assert_eq!(drain(&rx), vec![DetectorEvent::WakeRequest { duration_ms: 5000 }]);
        assert!(!d.state().busy);
        assert!(!d.is_ingesting());
    }

    #[test]
    fn test_interest_wakes_on_proximity_when_face_up() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.detect_user_interest();
        let near = ProximitySample::new(0.0, 5.0);
        let far = ProximitySample::new(5.0, 5.0);

        assert!(!d.on_proximity_sample(&near));
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        assert!(d.is_proximity_armed());
        assert!(!d.on_proximity_sample(&far));
        assert!(d.on_proximity_sample(&near));

        assert_eq!(drain(&rx), vec![DetectorEvent::WakeRequest { duration_ms: 5000 }]);
        assert!(!d.is_proximity_armed());
        assert!(!d.state().busy);
    }

    #[test]
    fn test_face_down_disarms_proximity() {
        let (mut d, _rx) = detector(SensorInventory::all());
        d.detect_user_interest();
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        assert!(d.is_proximity_armed());
        still(&mut d, &mut t, 1_500, -9.81);
        assert_eq!(d.prior_type(), MotionType::FaceDown);
        assert!(!d.is_proximity_armed());
        assert!(!d.on_proximity_sample(&ProximitySample::new(0.0, 5.0)));
    }

    #[test]
    fn test_proximity_setting_off_keeps_gate_stopped() {
        let config = DetectorConfig {
            proximity_enabled: false,
            ..DetectorConfig::default()
        };
        let (mut d, rx) = detector_with(SensorInventory::all(), config);
        d.detect_user_interest();
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        assert!(!d.on_proximity_sample(&ProximitySample::new(0.0, 5.0)));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_interest_survives_suspend() {
        let (mut d, _rx) = detector(SensorInventory::all());
        d.suspend();
        d.detect_user_interest();
        assert!(!d.state().busy);
        d.resume();

        d.detect_user_interest();
        d.detect_user_interest();
        d.suspend();
        assert!(d.state().busy);
        assert!(!d.is_ingesting());
        d.resume();
        assert!(d.is_ingesting());
        assert_eq!(d.routing(), Routing::Reawaken);
    }

    #[test]
    fn test_enable_clears_interest() {
        let (mut d, rx) = detector(SensorInventory::all());
        d.detect_user_interest();
        d.enable();
        assert!(!d.state().busy);
        assert_eq!(d.routing(), Routing::Listener);
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, 9.81);
        assert_eq!(drain(&rx), vec![motion(MotionEvent::FaceUpStill)]);
    }

    #[test]
    fn test_set_listener_redirects_events() {
        let (mut d, first) = detector(SensorInventory::all());
        let (second_sink, second) = ChannelSink::new();
        d.enable();
        d.set_listener(Box::new(second_sink));
        let mut t = 1_000 * MS;
        still(&mut d, &mut t, 1_000, -9.81);
        assert!(drain(&first).is_empty());
        assert_eq!(drain(&second), vec![motion(MotionEvent::FaceDownStill)]);
    }
}
