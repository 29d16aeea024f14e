//! Error types for the anomaly engine and its event store boundary

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, AnomalyError>;

/// Errors surfaced by the anomaly engine
#[derive(Debug, Error)]
pub enum AnomalyError {
    /// A tuning parameter was rejected before any computation started
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The event store could not deliver the snapshot
    #[error("Event retrieval failed: {0}")]
    Retrieval(#[from] StoreError),
}

impl AnomalyError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AnomalyError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            AnomalyError::InvalidParameter { .. } => "invalid_parameter",
            AnomalyError::Retrieval(_) => "retrieval_failed",
        }
    }
}

/// Errors raised by an event store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read events from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event store unavailable: {0}")]
    Unavailable(String),
}

/// Errors parsing a `<kind>:<key>` selector string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    #[error("Selector '{0}' must have the form <kind>:<key>")]
    MissingSeparator(String),

    #[error("Unknown selector kind '{0}' (expected entity, pair or source)")]
    UnknownKind(String),

    #[error("Selector key must not be empty")]
    EmptyKey,

    #[error("Pair key '{0}' must have the form <a>|<b>")]
    MalformedPair(String),
}
