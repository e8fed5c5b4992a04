use crossbeam::channel::{self, Receiver, Sender};
use std::time::Duration;

use crate::types::{DetectorEvent, Direction, MotionEvent, TouchRate};

/// Host callbacks for confirmed motion. Called from the sample-processing context.
pub trait MotionListener: Send {
    fn on_significant_motion(&mut self);
    fn on_face_down_still(&mut self);
    fn on_face_up_still(&mut self);
}

pub trait TiltListener: Send {
    fn on_touch_rate(&mut self, direction: Direction, value: TouchRate);
}

/// Asks the host to keep the display on for `duration`.
pub trait WakeRequester: Send {
    fn request_wake(&mut self, duration: Duration);
}

/// Listener that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl MotionListener for NullListener {
    fn on_significant_motion(&mut self) {}
    fn on_face_down_still(&mut self) {}
    fn on_face_up_still(&mut self) {}
}

impl TiltListener for NullListener {
    fn on_touch_rate(&mut self, _direction: Direction, _value: TouchRate) {}
}

impl WakeRequester for NullListener {
    fn request_wake(&mut self, _duration: Duration) {}
}

/// Forwards every callback as a [`DetectorEvent`] over a crossbeam channel.
///
/// Clones share the channel, so one receiver can observe the motion
/// detector, the tilt engine and the wake requests in arrival order.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<DetectorEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<DetectorEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: DetectorEvent) {
        // A dropped receiver means nobody is listening any more.
        if self.tx.send(event).is_err() {
            log::trace!("event receiver gone, dropping {:?}", event);
        }
    }
}

impl MotionListener for ChannelSink {
    fn on_significant_motion(&mut self) {
        self.send(DetectorEvent::Motion {
            event: MotionEvent::SignificantMotion,
        });
    }

    fn on_face_down_still(&mut self) {
        self.send(DetectorEvent::Motion {
            event: MotionEvent::FaceDownStill,
        });
    }

    fn on_face_up_still(&mut self) {
        self.send(DetectorEvent::Motion {
            event: MotionEvent::FaceUpStill,
        });
    }
}

impl TiltListener for ChannelSink {
    fn on_touch_rate(&mut self, direction: Direction, value: TouchRate) {
        self.send(DetectorEvent::TouchRate { direction, value });
    }
}

impl WakeRequester for ChannelSink {
    fn request_wake(&mut self, duration: Duration) {
        self.send(DetectorEvent::WakeRequest {
            duration_ms: duration.as_millis() as u64,
        });
    }
}
