//! Unified error type for SimAuto operations.
//!
//! Every failure the wrapper can surface maps onto one [`SawError`] variant.
//! Nothing here is retried: the engine gives no idempotency guarantees, so a
//! blind retry could apply a change twice.
//!
//! # Example
//!
//! ```ignore
//! use saw_core::{SawError, SawResult};
//!
//! fn bus_voltages(session: &mut Session) -> SawResult<Table> {
//!     session
//!         .read_many("bus", &["BusNum", "BusPUVolt"], "")?
//!         .ok_or_else(|| SawError::Assertion("case has no buses".into()))
//! }
//! ```

use thiserror::Error;

/// Unified error type for all wrapper operations.
#[derive(Error, Debug)]
pub enum SawError {
    /// The call to the engine could not complete (connectivity, marshaling, crash).
    #[error("transport fault calling {function}: {message}")]
    TransportFault { function: String, message: String },

    /// The engine does not expose the requested function.
    #[error("'{0}' is not a valid SimAuto function")]
    UnknownOperation(String),

    /// The engine reported a failure; the message is surfaced verbatim.
    #[error("PowerWorld error: {0}")]
    RemoteOperation(String),

    /// Requested fields do not exist in the object type's field catalog.
    #[error("unknown field(s) for object type '{object_type}': {}", fields.join(", "))]
    UnknownField {
        object_type: String,
        fields: Vec<String>,
    },

    /// A value could not be coerced to the catalog's declared type.
    #[error("field '{field}' of '{object_type}' expects a number, got {value:?}")]
    TypeCoercion {
        object_type: String,
        field: String,
        value: String,
    },

    /// A payload or argument had neither a row nor a table shape.
    #[error("input is neither a row nor a table: {0}")]
    InputType(String),

    /// The engine acknowledged a write but a re-read shows it was not applied.
    #[error(
        "command not respected for '{object_type}': {} value(s) unchanged after write ({})",
        mismatches.len(),
        mismatches.join("; ")
    )]
    CommandNotRespected {
        object_type: String,
        mismatches: Vec<String>,
    },

    /// Caller-supplied arguments are inconsistent (e.g. mismatched lengths).
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The engine's schema violates an invariant the wrapper relies on.
    #[error("invariant violated: {0}")]
    InvariantFailure(String),

    /// A write was issued without every key field of the object type.
    #[error("missing key field(s) for object type '{object_type}': {}", fields.join(", "))]
    MissingKeyFields {
        object_type: String,
        fields: Vec<String>,
    },

    /// A session property was given an unusable value.
    #[error("invalid value for property {property}: {message}")]
    InvalidProperty { property: String, message: String },

    /// An operation needed the tracked case path but no case was ever opened.
    #[error("no case has been opened in this session")]
    NoCaseOpen,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors (local file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for Results using SawError.
pub type SawResult<T> = Result<T, SawError>;

impl SawError {
    /// Whether the error originated in the engine rather than in the wrapper or transport.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SawError::RemoteOperation(_) | SawError::CommandNotRespected { .. }
        )
    }
}

impl From<serde_json::Error> for SawError {
    fn from(err: serde_json::Error) -> Self {
        SawError::Serialization(err.to_string())
    }
}
