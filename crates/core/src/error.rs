//! Engine and storage error types.
//!
//! Module errors (accrual, distribution, posting, lifecycle) fold into
//! [`EngineError`], which in turn folds into the shared `AppError` at the
//! binary boundary.

use thiserror::Error;

use ecoop_shared::types::BranchId;
use ecoop_shared::AppError;

use crate::accrual::AccrualError;
use crate::distribution::DistributionError;
use crate::lifecycle::StateConflict;
use crate::posting::PostingError;

/// Errors returned by repository and transaction seams.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The row to update does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A uniqueness or lock conflict.
    #[error("Storage conflict: {0}")]
    Conflict(String),

    /// The backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A stored row could not be mapped back into a domain value.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Broad classification used for status codes and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or a business rule violation.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// Wrong lifecycle state for the requested transition.
    StateConflict,
    /// Storage failed; the transaction was rolled back.
    Persistence,
}

/// Errors returned by [`crate::engine::BatchEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    // ========== Validation Errors ==========
    /// Invalid accrual request.
    #[error(transparent)]
    Accrual(#[from] AccrualError),

    /// Invalid distribution input or unresolved table lookup.
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// Posting plan rejected before any write.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// The branch has no settings row.
    #[error("No settings configured for branch {0}")]
    MissingBranchSettings(BranchId),

    /// Neither the branch nor the configuration supply an annual divisor.
    #[error("No annual divisor configured")]
    MissingAnnualDivisor,

    /// Neither the request nor the branch supply an interest tax rate.
    #[error("No interest tax rate configured")]
    MissingTaxRate,

    /// A distribution batch without computed entries cannot be printed.
    #[error("Distribution batch has no entries to print")]
    NothingToPrint,

    // ========== Not Found ==========
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    // ========== State Errors ==========
    /// The batch is in the wrong state.
    #[error(transparent)]
    StateConflict(#[from] StateConflict),

    // ========== Persistence Errors ==========
    /// Storage failed and the transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl EngineError {
    /// Not found error for an entity.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Accrual(_)
            | Self::Distribution(_)
            | Self::Posting(_)
            | Self::MissingBranchSettings(_)
            | Self::MissingAnnualDivisor
            | Self::MissingTaxRate
            | Self::NothingToPrint => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::StateConflict(_) => ErrorCategory::StateConflict,
            Self::Persistence(_) => ErrorCategory::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Accrual(err) => err.error_code(),
            Self::Distribution(err) => err.error_code(),
            Self::Posting(err) => err.error_code(),
            Self::MissingBranchSettings(_) => "MISSING_BRANCH_SETTINGS",
            Self::MissingAnnualDivisor => "MISSING_ANNUAL_DIVISOR",
            Self::MissingTaxRate => "MISSING_TAX_RATE",
            Self::NothingToPrint => "NOTHING_TO_PRINT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::StateConflict(err) => err.error_code(),
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.category() {
            // Lifecycle conflicts are business-rule violations, not 409s.
            ErrorCategory::Validation | ErrorCategory::StateConflict => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Persistence => 500,
        }
    }

    /// Returns true if the same request may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict(msg) | StoreError::Backend(msg) | StoreError::Corrupt(msg) => {
                Self::Persistence(msg)
            }
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => Self::Validation(message),
            ErrorCategory::NotFound => Self::NotFound(message),
            ErrorCategory::StateConflict => Self::StateConflict(message),
            ErrorCategory::Persistence => Self::Persistence(message),
        }
    }
}
