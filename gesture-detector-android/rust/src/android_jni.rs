use crate::error::{throw_java_exception, GestureDetectorError, JResult};
use crate::sensor_receiver::{inventory_from_flags, SensorReading};
use crate::session::DetectorSession;
use crate::storage::events_to_json;
use gesture_detector_rs::DetectorConfig;
use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jfloat, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use log::info;
use std::sync::{Mutex, Once};

// Global detector state - stored as static to persist across JNI calls
lazy_static::lazy_static! {
    static ref GLOBAL_SESSION: Mutex<Option<DetectorSession>> = Mutex::new(None);
}

static LOGGER: Once = Once::new();

fn init_logging() {
    LOGGER.call_once(|| {
        #[cfg(target_os = "android")]
        {
            let _ = android_log::init("GestureDetector");
            log::set_max_level(log::LevelFilter::Debug);
        }
    });
}

/// Run `f` against the current session
fn with_session<R>(f: impl FnOnce(&mut DetectorSession) -> JResult<R>) -> JResult<R> {
    let mut guard = GLOBAL_SESSION.lock().map_err(|_| {
        GestureDetectorError::Internal("Failed to acquire global session lock".to_string())
    })?;
    match guard.as_mut() {
        Some(session) => f(session),
        None => Err(GestureDetectorError::NotCreated),
    }
}

/// Map a unit result to the 0 / -1 convention, throwing on error
fn status(env: &mut JNIEnv, result: JResult<()>) -> jint {
    match result {
        Ok(_) => 0,
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            -1
        }
    }
}

fn string_result(env: &mut JNIEnv, result: JResult<String>) -> jstring {
    match result {
        Ok(text) => match env.new_string(&text) {
            Ok(jstr) => jstr.into_raw(),
            Err(_) => {
                let _ = throw_java_exception(
                    env,
                    &GestureDetectorError::JniError("Failed to create Java string".to_string()),
                );
                std::ptr::null_mut()
            }
        },
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            std::ptr::null_mut()
        }
    }
}

/// JNI: Create (or replace) the detector
/// Parameters: sensor availability flags, optional configuration JSON (null or empty = defaults)
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_createDetector(
    mut env: JNIEnv,
    _class: JClass,
    has_accelerometer: jboolean,
    has_proximity: jboolean,
    config_json: JString,
) -> jint {
    init_logging();
    let result = create_detector_impl(&mut env, has_accelerometer, has_proximity, &config_json);
    status(&mut env, result)
}

fn create_detector_impl(
    env: &mut JNIEnv,
    has_accelerometer: jboolean,
    has_proximity: jboolean,
    config_json: &JString,
) -> JResult<()> {
    let config = if config_json.is_null() {
        DetectorConfig::default()
    } else {
        let text: String = env.get_string(config_json)?.into();
        if text.trim().is_empty() {
            DetectorConfig::default()
        } else {
            DetectorConfig::from_json_str(&text)?
        }
    };
    let inventory = inventory_from_flags(has_accelerometer != JNI_FALSE, has_proximity != JNI_FALSE);

    let mut guard = GLOBAL_SESSION.lock().map_err(|_| {
        GestureDetectorError::Internal("Failed to acquire global session lock".to_string())
    })?;
    *guard = Some(DetectorSession::new(inventory, &config));
    info!("Detector created ({:?})", inventory);
    Ok(())
}

/// JNI: Drop the detector and everything it recorded
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_destroyDetector(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = GLOBAL_SESSION
        .lock()
        .map(|mut guard| {
            *guard = None;
        })
        .map_err(|_| GestureDetectorError::Internal("Failed to acquire global session lock".to_string()));
    status(&mut env, result)
}

/// JNI: Report motion events to the host listener
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_enable(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.enable();
        Ok(())
    });
    status(&mut env, result)
}

#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_disable(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.disable();
        Ok(())
    });
    status(&mut env, result)
}

#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_suspend(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.suspend();
        Ok(())
    });
    status(&mut env, result)
}

#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_resume(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.resume();
        Ok(())
    });
    status(&mut env, result)
}

/// JNI: Watch for the user picking up the device; produces a wake_request event
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_detectUserInterest(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.detect_user_interest();
        Ok(())
    });
    status(&mut env, result)
}

/// JNI: Whether motion detection can work at all (accelerometer present)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_hasSensors(
    mut env: JNIEnv,
    _class: JClass,
) -> jboolean {
    match with_session(|s| Ok(s.has_sensors())) {
        Ok(true) => JNI_TRUE,
        Ok(false) => JNI_FALSE,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            JNI_FALSE
        }
    }
}

/// JNI: Push accelerometer sample
/// Parameters: timestamp (SensorEvent.timestamp, ns), x, y, z (m/s²)
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_pushAccelSample(
    mut env: JNIEnv,
    _class: JClass,
    timestamp: jlong,
    x: jfloat,
    y: jfloat,
    z: jfloat,
) -> jint {
    let result = SensorReading::accel(timestamp, x, y, z).and_then(|reading| {
        with_session(|s| {
            s.push(reading);
            Ok(())
        })
    });
    status(&mut env, result)
}

/// JNI: Push proximity sample
/// Parameters: timestamp (ns), distance and the sensor's maximum range (cm)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_pushProximitySample(
    mut env: JNIEnv,
    _class: JClass,
    timestamp: jlong,
    distance: jfloat,
    max_range: jfloat,
) -> jint {
    let result = SensorReading::proximity(timestamp, distance, max_range).and_then(|reading| {
        with_session(|s| {
            s.push(reading);
            Ok(())
        })
    });
    status(&mut env, result)
}

/// JNI: Start tilt (touch-rate) reporting from a clean state
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_attachTilt(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.attach_tilt();
        Ok(())
    });
    status(&mut env, result)
}

#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_detachTilt(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = with_session(|s| {
        s.detach_tilt();
        Ok(())
    });
    status(&mut env, result)
}

/// JNI: Fire tilt ticks due by `now` (sensor clock, ns)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_advanceTimers(
    mut env: JNIEnv,
    _class: JClass,
    now: jlong,
) -> jint {
    let result = with_session(|s| {
        s.advance_timers(now);
        Ok(())
    });
    status(&mut env, result)
}

/// JNI: Next tilt tick deadline (sensor clock, ns), or -1 when none is pending
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_nextTickDeadline(
    mut env: JNIEnv,
    _class: JClass,
) -> jlong {
    match with_session(|s| Ok(s.next_tick_deadline())) {
        Ok(deadline) => deadline.unwrap_or(-1),
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

/// JNI: Events since the previous call, as a JSON array
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_drainEvents(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = with_session(|s| Ok(events_to_json(&s.drain_events())?));
    string_result(&mut env, result)
}

/// JNI: Export session metadata and recent events as JSON string
/// Returns: JSON string or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_gesturedetector_JniBinding_getSessionJson(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = with_session(|s| Ok(s.export()?.to_json()?));
    string_result(&mut env, result)
}
