//! Accelerometer-driven motion and tilt gesture detection.
//!
//! Raw samples flow through [`filters::gravity::GravityFilter`] and
//! [`samples_queue::SamplesQueue`] into the [`motion_detector::MotionDetector`],
//! which reports debounced face-up / face-down / significant-motion events.
//! The [`tilt::TiltEngine`] consumes the same samples independently and turns a
//! held tilt into a direction plus an auto-repeat counter.

pub mod config;
pub mod filters;
pub mod listener;
pub mod motion_detector;
pub mod proximity;
pub mod samples_queue;
pub mod session_log;
pub mod tilt;
pub mod timer;
pub mod types;

#[cfg(feature = "cli")]
pub mod sensors;

pub use config::{ConfigError, DetectorConfig, MotionConfig, TiltConfig};
pub use listener::{ChannelSink, MotionListener, NullListener, TiltListener, WakeRequester};
pub use motion_detector::{DispatcherState, MotionDetector, Routing};
pub use session_log::{LoggedReading, SensorLog};
pub use tilt::{TiltEngine, TiltState};
pub use types::{
    AccelSample, DetectorEvent, Direction, MotionEvent, MotionType, ProximitySample,
    SensorInventory, TouchRate,
};
