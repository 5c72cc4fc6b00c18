//! Mutual-fund distribution.
//!
//! Splits a principal across a primary member and ratio-weighted groups of
//! co-beneficiaries, optionally resolving the principal from an age-based
//! amount table.

pub mod allocation;
pub mod error;
pub mod generator;
pub mod table;
pub mod types;

#[cfg(test)]
mod generator_props;

pub use allocation::AllocationUtil;
pub use error::DistributionError;
pub use generator::{DistributionGenerator, DistributionRequest};
pub use types::{
    AdditionalBeneficiary, AmountRowInput, AmountTableRow, BatchChildFilter, BeneficiaryInput,
    ComputationType, DistributionBatch, DistributionBatchFilter, DistributionComputation,
    DistributionEntry, DistributionInput, DistributionLine, LineRecipient, Recipient,
};
