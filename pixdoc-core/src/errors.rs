//! # Errors
//!
//! The editor's default operations swallow failures (log + warning toast).
//! The `try_*` twins return these errors instead, so a host can react
//! programmatically:
//! - collaborator failures keep their source for diagnostics
//! - debounce suppression is its own variant and is never surfaced
//! - `ErrorKind` gives a stable name/class for hosts that branch on it

use thiserror::Error;

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stable classification of [`EditorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Store,
    Transfer,
    Serialization,
    Debounced,
    InvalidName,
    InvalidConfig,
    UnknownEvent,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Store => "Store",
            ErrorKind::Transfer => "Transfer",
            ErrorKind::Serialization => "Serialization",
            ErrorKind::Debounced => "Debounced",
            ErrorKind::InvalidName => "InvalidName",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::UnknownEvent => "UnknownEvent",
        }
    }

}

/// Errors that can occur during editor operations
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document store error: {source}")]
    Store {
        #[source]
        source: BoxError,
    },

    #[error("File transfer error: {source}")]
    Transfer {
        #[source]
        source: BoxError,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Save suppressed by debounce")]
    Debounced,

    #[error("Invalid file record name: {name:?}")]
    InvalidName { name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Unknown editor event: {name}")]
    UnknownEvent { name: String },
}

impl EditorError {
    /// Wrap a document store failure
    pub fn store(error: anyhow::Error) -> Self {
        Self::Store {
            source: error.into(),
        }
    }

    /// Wrap a file transfer failure
    pub fn transfer(error: anyhow::Error) -> Self {
        Self::Transfer {
            source: error.into(),
        }
    }

    pub fn invalid_name<S: Into<String>>(name: S) -> Self {
        Self::InvalidName { name: name.into() }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn unknown_event<S: Into<String>>(name: S) -> Self {
        Self::UnknownEvent { name: name.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::Store { .. } => ErrorKind::Store,
            EditorError::Transfer { .. } => ErrorKind::Transfer,
            EditorError::Serialization { .. } => ErrorKind::Serialization,
            EditorError::Debounced => ErrorKind::Debounced,
            EditorError::InvalidName { .. } => ErrorKind::InvalidName,
            EditorError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            EditorError::UnknownEvent { .. } => ErrorKind::UnknownEvent,
        }
    }

    pub fn is_debounced(&self) -> bool {
        matches!(self, EditorError::Debounced)
    }
}
