// Gesture Detector Android JNI Library
// Exposes the Rust motion / tilt detectors to Kotlin via JNI

pub mod android_jni;
pub mod error;
pub mod sensor_receiver;
pub mod session;
pub mod storage;

pub use error::{GestureDetectorError, JResult};
pub use sensor_receiver::SensorReading;
pub use session::{DetectorSession, SessionMetadata};
pub use storage::{ExportedEvent, SessionExport, TimedEvent};
