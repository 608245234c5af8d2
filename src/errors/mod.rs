//! Error types shared by the bridge, the ticker and the controller.
//!
//! None of these ever cross the native/managed boundary: the JNI layer logs
//! them and returns a neutral value instead.

use std::fmt;
use std::io;

/// The managed runtime refused to register the current thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// Runtime is tearing down and accepts no new threads
    ShuttingDown,
    /// Runtime reported a failure code or message
    Refused(String),
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShuttingDown => write!(f, "runtime is shutting down, thread attach refused"),
            Self::Refused(reason) => write!(f, "failed to attach current thread: {}", reason),
        }
    }
}

impl std::error::Error for AttachError {}

/// Failure of a single callback into the managed side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback target was torn down since the bridge was bound
    TargetGone,
    /// The managed method raised or the call itself failed
    CallFailed(String),
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetGone => write!(f, "callback target is no longer valid"),
            Self::CallFailed(reason) => write!(f, "callback invocation failed: {}", reason),
        }
    }
}

impl std::error::Error for CallbackError {}

/// Failure of `LifecycleController::start` or `create_thread`.
#[derive(Debug)]
pub enum StartError {
    /// The OS refused to create the worker thread
    Spawn(io::Error),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to spawn ticker thread: {}", e),
        }
    }
}

impl std::error::Error for StartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
        }
    }
}

impl From<io::Error> for StartError {
    fn from(e: io::Error) -> Self {
        Self::Spawn(e)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config: {}", e),
            Self::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AttachError::Refused("JNI_EDETACHED".to_string()).to_string(),
            "failed to attach current thread: JNI_EDETACHED"
        );
        assert_eq!(CallbackError::TargetGone.to_string(), "callback target is no longer valid");
    }

    #[test]
    fn test_start_error_source() {
        use std::error::Error;

        let err = StartError::from(io::Error::new(io::ErrorKind::Other, "no threads left"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("no threads left"));
    }
}
