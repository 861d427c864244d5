use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised while recording a run into a tracking backend.
///
/// The `Backend` variant carries a `transient` flag so callers can tell
/// retryable failures (e.g. a remote store being briefly unreachable) from
/// permanent ones. This crate itself never retries: every error propagates
/// to the caller of `record` verbatim.
#[derive(Debug)]
pub enum TrackingError {
    /// Filesystem failure while writing run records or artifacts.
    Io(io::Error),
    /// Failure reported by the tracking backend itself.
    Backend { message: String, transient: bool },
    /// A parameter, metadata record, or model could not be serialized.
    Serialization(String),
}

impl TrackingError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TrackingError::Backend { transient: true, .. })
    }

    pub(crate) fn permanent(message: impl Into<String>) -> Self {
        TrackingError::Backend {
            message: message.into(),
            transient: false,
        }
    }
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingError::Io(err) => write!(f, "tracking store I/O error: {}", err),
            TrackingError::Backend { message, transient } => {
                let kind = if *transient { "transient" } else { "permanent" };
                write!(f, "tracking backend error ({}): {}", kind, message)
            }
            TrackingError::Serialization(message) => {
                write!(f, "tracking serialization error: {}", message)
            }
        }
    }
}

impl Error for TrackingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrackingError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TrackingError {
    fn from(err: io::Error) -> Self {
        TrackingError::Io(err)
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(err: serde_json::Error) -> Self {
        TrackingError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for TrackingError {
    fn from(err: csv::Error) -> Self {
        TrackingError::Serialization(err.to_string())
    }
}
