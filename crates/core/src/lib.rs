//! Computation and posting engine for cooperative-bank batches.
//!
//! Pure business logic plus the storage seams the engine runs on. No web or
//! database dependencies live here; `ecoop-db` implements the seams over
//! PostgreSQL and [`store::MemoryStore`] implements them in memory.
//!
//! # Modules
//!
//! - `ledger` - Ledger entries, filters and the balance aggregator
//! - `lifecycle` - Draft → Printed → Posted state machine shared by all batches
//! - `accrual` - Savings interest accrual generator
//! - `distribution` - Fund distribution generator and amount tables
//! - `posting` - Balanced posting plans built from staged entries
//! - `reference` - Read-only settings, savings accounts and member profiles
//! - `store` - Repository and transaction seams, in-memory store
//! - `engine` - The batch engine service tying it all together

pub mod accrual;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod posting;
pub mod reference;
pub mod store;

pub use engine::{AccrualView, BatchEngine, DistributionView, PostingReceipt};
pub use error::{EngineError, ErrorCategory, StoreError};
