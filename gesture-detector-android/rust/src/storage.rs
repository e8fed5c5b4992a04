use gesture_detector_rs::{DetectorEvent, Direction, MotionEvent};
use serde::Serialize;

use crate::session::SessionMetadata;

/// An event together with the sensor timestamp (ns) it was produced at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub timestamp: i64,
    pub event: DetectorEvent,
}

/// Flat event record for the Kotlin side. Touch-rate values travel as plain
/// integers, with the release marker as -1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedEvent {
    pub timestamp: i64,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<MotionEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl From<&TimedEvent> for ExportedEvent {
    fn from(timed: &TimedEvent) -> Self {
        let mut exported = ExportedEvent {
            timestamp: timed.timestamp,
            kind: "",
            motion: None,
            direction: None,
            value: None,
            duration_ms: None,
        };
        match timed.event {
            DetectorEvent::Motion { event } => {
                exported.kind = "motion";
                exported.motion = Some(event);
            }
            DetectorEvent::TouchRate { direction, value } => {
                exported.kind = "touch_rate";
                exported.direction = Some(direction);
                exported.value = Some(value.as_raw());
            }
            DetectorEvent::WakeRequest { duration_ms } => {
                exported.kind = "wake_request";
                exported.duration_ms = Some(duration_ms);
            }
        }
        exported
    }
}

pub fn events_to_json(events: &[TimedEvent]) -> Result<String, serde_json::Error> {
    let exported: Vec<ExportedEvent> = events.iter().map(ExportedEvent::from).collect();
    serde_json::to_string(&exported)
}

/// Complete session export (JSON-serializable)
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub metadata: SessionMetadata,
    pub events: Vec<ExportedEvent>,
}

impl SessionExport {
    pub fn new(metadata: SessionMetadata, events: &[TimedEvent]) -> Self {
        SessionExport {
            metadata,
            events: events.iter().map(ExportedEvent::from).collect(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
