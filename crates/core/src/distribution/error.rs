//! Distribution validation errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating or computing a fund distribution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributionError {
    /// Principal amount cannot be negative.
    #[error("Distribution amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Beneficiary ratio must be positive.
    #[error("Beneficiary ratio must be positive: {0}")]
    InvalidRatio(Decimal),

    /// Beneficiary group must have at least one member.
    #[error("Beneficiary group must have at least one member")]
    EmptyBeneficiaryGroup,

    /// Amount table row has `month_from > month_to`.
    #[error("Amount table row is inverted: months {month_from} to {month_to}")]
    InvertedRow {
        /// Lower bound, inclusive.
        month_from: u32,
        /// Upper bound, inclusive.
        month_to: u32,
    },

    /// Two amount table rows share at least one month.
    #[error("Amount table rows overlap: {first_from}-{first_to} and {second_from}-{second_to}")]
    OverlappingRows {
        /// First row lower bound.
        first_from: u32,
        /// First row upper bound.
        first_to: u32,
        /// Second row lower bound.
        second_from: u32,
        /// Second row upper bound.
        second_to: u32,
    },

    /// Amount table row amount cannot be negative.
    #[error("Amount table row amount cannot be negative: {0}")]
    NegativeRowAmount(Decimal),

    /// Ratios or principal are too large to split within the `Decimal` range.
    #[error("Distribution shares are out of range")]
    AmountOverflow,

    /// No amount table row covers the elapsed membership months.
    #[error("No amount table row covers {months} months of membership")]
    NoMatchingRow {
        /// Elapsed whole months.
        months: u32,
    },
}

impl DistributionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidRatio(_) => "INVALID_RATIO",
            Self::EmptyBeneficiaryGroup => "EMPTY_BENEFICIARY_GROUP",
            Self::InvertedRow { .. } => "INVERTED_AMOUNT_ROW",
            Self::OverlappingRows { .. } => "OVERLAPPING_AMOUNT_ROWS",
            Self::NegativeRowAmount(_) => "NEGATIVE_ROW_AMOUNT",
            Self::NoMatchingRow { .. } => "NO_MATCHING_AMOUNT_ROW",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
        }
    }
}
