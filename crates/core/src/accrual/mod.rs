//! Savings interest accrual.
//!
//! Scans eligible savings sub-ledgers over a window `(last, new]`, computes
//! `basis * rate * days / annual_divisor` and the withholding tax, and stages
//! one line per account.

pub mod basis;
pub mod error;
pub mod generator;
pub mod types;

#[cfg(test)]
mod generator_props;

pub use error::AccrualError;
pub use generator::{AccrualGenerator, AccrualRun, SubLedgerKey};
pub use types::{
    AccrualBatch, AccrualBatchFilter, AccrualComputation, AccrualEntry, AccrualEntryFilter,
    AccrualLine, AccrualParams, AccrualTotals, BalanceBasis,
};
