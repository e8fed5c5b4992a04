use chrono::Utc;
use crossbeam::channel::Receiver;
use gesture_detector_rs::{
    ChannelSink, DetectorConfig, DetectorEvent, MotionDetector, SensorInventory, TiltEngine,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::JResult;
use crate::sensor_receiver::SensorReading;
use crate::storage::{SessionExport, TimedEvent};

/// Events kept for `getSessionJson`; older ones are dropped first.
const HISTORY_LIMIT: usize = 1000;

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub start_time: String,
    pub sensors: SensorInventory,
    pub accel_sample_count: u64,
    pub proximity_sample_count: u64,
    pub event_count: u64,
    pub last_timestamp: i64,
    pub tilt_attached: bool,
}

/// One motion detector plus one tilt engine behind the JNI surface.
///
/// Both engines report into the same channel; events are collected after each
/// call so they carry the sensor timestamp that produced them.
pub struct DetectorSession {
    detector: MotionDetector,
    tilt: TiltEngine,
    sink: ChannelSink,
    events: Receiver<DetectorEvent>,
    pending: Vec<TimedEvent>,
    history: VecDeque<TimedEvent>,
    metadata: SessionMetadata,
}

impl DetectorSession {
    pub fn new(inventory: SensorInventory, config: &DetectorConfig) -> Self {
        let (sink, events) = ChannelSink::new();
        let detector = MotionDetector::new(
            inventory,
            config,
            Box::new(sink.clone()),
            Box::new(sink.clone()),
        );
        let metadata = SessionMetadata {
            session_id: format!("session_{}", Utc::now().timestamp_millis()),
            start_time: Utc::now().to_rfc3339(),
            sensors: inventory,
            accel_sample_count: 0,
            proximity_sample_count: 0,
            event_count: 0,
            last_timestamp: 0,
            tilt_attached: false,
        };

        DetectorSession {
            detector,
            tilt: TiltEngine::new(&config.tilt),
            sink,
            events,
            pending: Vec::new(),
            history: VecDeque::with_capacity(64),
            metadata,
        }
    }

    pub fn has_sensors(&self) -> bool {
        self.detector.has_sensors()
    }

    pub fn enable(&mut self) {
        self.detector.enable();
        self.collect();
    }

    pub fn disable(&mut self) {
        self.detector.disable();
        self.collect();
    }

    pub fn suspend(&mut self) {
        self.detector.suspend();
    }

    pub fn resume(&mut self) {
        self.detector.resume();
    }

    pub fn detect_user_interest(&mut self) {
        self.detector.detect_user_interest();
    }

    /// Tilt reporting follows the accelerometer; without one attaching is a no-op.
    pub fn attach_tilt(&mut self) {
        if !self.detector.has_sensors() {
            return;
        }
        self.tilt.attach(Box::new(self.sink.clone()));
        self.metadata.tilt_attached = true;
    }

    pub fn detach_tilt(&mut self) {
        self.tilt.detach();
        self.metadata.tilt_attached = false;
    }

    pub fn push(&mut self, reading: SensorReading) {
        self.metadata.last_timestamp = self.metadata.last_timestamp.max(reading.timestamp());
        match reading {
            SensorReading::Accel(sample) => {
                self.metadata.accel_sample_count += 1;
                self.detector.on_accel_sample(&sample);
                self.tilt.on_accel_sample(&sample);
            }
            SensorReading::Proximity { sample, .. } => {
                self.metadata.proximity_sample_count += 1;
                self.detector.on_proximity_sample(&sample);
            }
        }
        self.collect();
    }

    /// Fire tilt ticks due by `now` (sensor clock, ns) when no samples arrive.
    pub fn advance_timers(&mut self, now: i64) {
        self.tilt.advance_to(now);
        self.metadata.last_timestamp = self.metadata.last_timestamp.max(now);
        self.collect();
    }

    /// Next tilt tick deadline (sensor clock, ns), if one is pending.
    pub fn next_tick_deadline(&self) -> Option<i64> {
        self.tilt.next_deadline()
    }

    /// Events produced since the previous drain.
    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn export(&self) -> JResult<SessionExport> {
        let history: Vec<TimedEvent> = self.history.iter().copied().collect();
        Ok(SessionExport::new(self.metadata.clone(), &history))
    }

    fn collect(&mut self) {
        let timestamp = self.metadata.last_timestamp;
        for event in self.events.try_iter() {
            let timed = TimedEvent { timestamp, event };
            self.pending.push(timed);
            if self.history.len() == HISTORY_LIMIT {
                self.history.pop_front();
            }
            self.history.push_back(timed);
            self.metadata.event_count += 1;
        }
    }
}
