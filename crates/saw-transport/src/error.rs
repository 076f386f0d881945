//! Transport-level errors.
//!
//! These describe failures to *complete* a call. Failures the engine reports
//! in its own result payload are not transport errors; the session's
//! classifier handles those.

use saw_core::SawError;
use thiserror::Error;

/// Errors that can occur while talking to the engine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint does not expose the requested function.
    #[error("'{0}' is not a valid SimAuto function")]
    UnknownOperation(String),

    /// The call reached the endpoint but could not complete there.
    #[error("call to {function} failed: {message}")]
    Fault { function: String, message: String },

    /// Bridge binary could not be located.
    #[error("SimAuto bridge not found. Install {hint} into ~/.saw/bin or put it on PATH")]
    NotInstalled { hint: String },

    /// Bridge process failed to start.
    #[error("Failed to start bridge process: {0}")]
    ProcessStart(#[source] std::io::Error),

    /// The bridge answered with something that is not the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The handle was released or the bridge exited.
    #[error("transport is closed")]
    Closed,

    /// Generic IO error on the bridge pipes.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error on the bridge pipes.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    /// Convert into the wrapper's error taxonomy, attributing the failure to `function`.
    pub fn into_saw(self, function: &str) -> SawError {
        match self {
            TransportError::UnknownOperation(name) => SawError::UnknownOperation(name),
            TransportError::Fault { function, message } => {
                SawError::TransportFault { function, message }
            }
            other => SawError::TransportFault {
                function: function.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<TransportError> for SawError {
    fn from(err: TransportError) -> Self {
        err.into_saw("transport")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_operation_keeps_its_kind() {
        let err = TransportError::UnknownOperation("Frobnicate".into()).into_saw("Frobnicate");
        assert!(matches!(err, SawError::UnknownOperation(name) if name == "Frobnicate"));
    }

    #[test]
    fn everything_else_is_a_transport_fault() {
        let err = TransportError::Closed.into_saw("OpenCase");
        match err {
            SawError::TransportFault { function, message } => {
                assert_eq!(function, "OpenCase");
                assert!(message.contains("closed"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
