//! Accrual validation errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use ecoop_shared::types::AccountId;

/// Errors raised while validating an accrual request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    /// The window must contain at least one day.
    #[error("Computation window is empty: {last} to {new}")]
    InvalidWindow {
        /// Last computation date (exclusive).
        last: NaiveDate,
        /// New computation date (inclusive).
        new: NaiveDate,
    },

    /// Tax rate must lie in 0..=1.
    #[error("Interest tax rate {0} is outside 0..=1")]
    TaxRateOutOfRange(Decimal),

    /// Divisor must be positive.
    #[error("Annual divisor must be positive")]
    ZeroDivisor,

    /// An account's interest does not fit the decimal range.
    #[error("Interest for account {0} is out of range")]
    AmountOverflow(AccountId),

    /// Batch totals do not fit the decimal range.
    #[error("Accrual totals are out of range")]
    TotalsOverflow,
}

impl AccrualError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWindow { .. } => "INVALID_WINDOW",
            Self::TaxRateOutOfRange(_) => "TAX_RATE_OUT_OF_RANGE",
            Self::ZeroDivisor => "ZERO_DIVISOR",
            Self::AmountOverflow(_) | Self::TotalsOverflow => "AMOUNT_OVERFLOW",
        }
    }
}
