use jni::JNIEnv;
use thiserror::Error;

/// Gesture detector JNI error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureDetectorError {
    #[error("Detector not created")]
    NotCreated,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("JNI error: {0}")]
    JniError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for JNI operations
pub type JResult<T> = Result<T, GestureDetectorError>;

impl From<gesture_detector_rs::ConfigError> for GestureDetectorError {
    fn from(e: gesture_detector_rs::ConfigError) -> Self {
        GestureDetectorError::InvalidConfig(e.to_string())
    }
}

impl From<serde_json::Error> for GestureDetectorError {
    fn from(e: serde_json::Error) -> Self {
        GestureDetectorError::Serialization(e.to_string())
    }
}

impl From<jni::errors::Error> for GestureDetectorError {
    fn from(e: jni::errors::Error) -> Self {
        GestureDetectorError::JniError(e.to_string())
    }
}

/// Java exception class thrown for each error
pub fn exception_class(error: &GestureDetectorError) -> &'static str {
    match error {
        GestureDetectorError::NotCreated => "java/lang/IllegalStateException",
        GestureDetectorError::InvalidParameters(_) | GestureDetectorError::InvalidConfig(_) => {
            "java/lang/IllegalArgumentException"
        }
        GestureDetectorError::Serialization(_)
        | GestureDetectorError::JniError(_)
        | GestureDetectorError::Internal(_) => "java/lang/RuntimeException",
    }
}

/// Throw Java exception from Rust error
pub fn throw_java_exception(env: &mut JNIEnv, error: &GestureDetectorError) -> JResult<()> {
    env.throw_new(exception_class(error), error.to_string())
        .map_err(|_| GestureDetectorError::JniError("Failed to throw exception".to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_mapping() {
        assert_eq!(
            exception_class(&GestureDetectorError::NotCreated),
            "java/lang/IllegalStateException"
        );
        assert_eq!(
            exception_class(&GestureDetectorError::InvalidParameters("t".into())),
            "java/lang/IllegalArgumentException"
        );
        assert_eq!(
            exception_class(&GestureDetectorError::Internal("lock".into())),
            "java/lang/RuntimeException"
        );
    }

    #[test]
    fn test_config_error_becomes_invalid_config() {
        let err = gesture_detector_rs::DetectorConfig::from_json_str("{").unwrap_err();
        assert!(matches!(
            GestureDetectorError::from(err),
            GestureDetectorError::InvalidConfig(_)
        ));
    }
}
