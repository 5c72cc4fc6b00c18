//! Ledger entries and balance aggregation.
//!
//! This module implements the leaf of the engine:
//! - Ledger entries (debits and credits) with their source tags
//! - Caller-side filters for scoping queries
//! - The pure balance aggregator and account positions

pub mod balance;
pub mod entry;
pub mod filter;

pub use balance::{BalanceSummary, NormalBalance};
pub use entry::{EntrySide, EntrySource, LedgerEntry, PaymentType};
pub use filter::LedgerFilter;
