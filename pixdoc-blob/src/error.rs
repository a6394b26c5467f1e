use thiserror::Error;

/// Result type for staging transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can occur while staging files
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("File not found: {name}")]
    NotFound { name: String },

    #[error("File rejected: {reason}")]
    Rejected { reason: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },
}

impl TransferError {
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
