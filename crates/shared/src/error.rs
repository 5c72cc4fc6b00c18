//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Engine errors fold into these at the binary boundary; the status code
/// classifies them the way an HTTP front end would.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Batch lifecycle conflict (wrong state for the requested transition).
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Persistence failure; the surrounding transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::StateConflict(_) => 400,
            Self::Persistence(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    ///
    /// Only persistence failures qualify; a state conflict never resolves on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
