//! Storage seams used by the engine.
//!
//! Every repository call takes the transaction value explicitly, so a whole
//! operation (lock header, write children, stamp lifecycle) shares one
//! transaction. [`MemoryStore`] implements the seams for tests and embedding;
//! the PostgreSQL implementation lives in `ecoop-db`.

mod memory;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;

use ecoop_shared::types::{
    AccrualBatchId, AccrualEntryId, AmountRowId, BeneficiaryId, BranchId, DistributionBatchId,
    DistributionEntryId, LedgerEntryId, MemberProfileId, SavingsAccountId,
};

use crate::accrual::{AccrualBatch, AccrualBatchFilter, AccrualEntry, AccrualEntryFilter};
use crate::distribution::{
    AdditionalBeneficiary, AmountTableRow, BatchChildFilter, DistributionBatch,
    DistributionBatchFilter, DistributionEntry,
};
use crate::error::StoreError;
use crate::ledger::{LedgerEntry, LedgerFilter};
use crate::reference::{
    BranchSettings, BranchSettingsFilter, MemberProfile, MemberProfileFilter, SavingsAccount,
    SavingsAccountFilter,
};

pub use memory::{MemoryStore, MemoryTx};

/// A persisted record with a typed key and a query filter.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Primary key.
    type Id: Copy + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static;
    /// Query criteria accepted by [`Repository::find`].
    type Filter: Send + Sync;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Primary key of this record.
    fn id(&self) -> Self::Id;

    /// Returns true if this record passes `filter`.
    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Opens and ends transactions.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Transaction value threaded through repository calls.
    type Tx: Send;

    /// Starts a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Makes every write of `tx` visible.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Discards every write of `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;
}

/// CRUD access to one entity type.
#[async_trait]
pub trait Repository<E: Entity>: TransactionManager {
    /// Loads a record by key.
    async fn get_by_id(&self, tx: &mut Self::Tx, id: E::Id) -> Result<Option<E>, StoreError>;

    /// Loads a record by key and holds a write lock on it until `tx` ends.
    async fn get_for_update(&self, tx: &mut Self::Tx, id: E::Id)
    -> Result<Option<E>, StoreError>;

    /// Loads every record passing `filter`.
    async fn find(&self, tx: &mut Self::Tx, filter: &E::Filter) -> Result<Vec<E>, StoreError>;

    /// Inserts a new record.
    async fn create(&self, tx: &mut Self::Tx, entity: &E) -> Result<(), StoreError>;

    /// Replaces an existing record; `NotFound` if it does not exist.
    async fn update(&self, tx: &mut Self::Tx, entity: &E) -> Result<(), StoreError>;

    /// Deletes a record, returning whether it existed.
    async fn delete(&self, tx: &mut Self::Tx, id: E::Id) -> Result<bool, StoreError>;

    /// Deletes every record passing `filter`, returning the count.
    async fn delete_where(&self, tx: &mut Self::Tx, filter: &E::Filter) -> Result<u64, StoreError>;
}

/// Every repository the engine needs, behind one bound.
pub trait Store:
    TransactionManager
    + Repository<LedgerEntry>
    + Repository<BranchSettings>
    + Repository<SavingsAccount>
    + Repository<MemberProfile>
    + Repository<AccrualBatch>
    + Repository<AccrualEntry>
    + Repository<DistributionBatch>
    + Repository<AdditionalBeneficiary>
    + Repository<AmountTableRow>
    + Repository<DistributionEntry>
{
}

impl<T> Store for T where
    T: TransactionManager
        + Repository<LedgerEntry>
        + Repository<BranchSettings>
        + Repository<SavingsAccount>
        + Repository<MemberProfile>
        + Repository<AccrualBatch>
        + Repository<AccrualEntry>
        + Repository<DistributionBatch>
        + Repository<AdditionalBeneficiary>
        + Repository<AmountTableRow>
        + Repository<DistributionEntry>
{
}

macro_rules! entity {
    ($ty:ty, $id:ty, $filter:ty, $name:literal, |$row:ident| $key:expr, |$e:ident, $f:ident| $matches:expr) => {
        impl Entity for $ty {
            type Id = $id;
            type Filter = $filter;

            const NAME: &'static str = $name;

            fn id(&self) -> Self::Id {
                let $row = self;
                $key
            }

            fn matches(&self, filter: &Self::Filter) -> bool {
                let ($e, $f) = (self, filter);
                $matches
            }
        }
    };
}

entity!(LedgerEntry, LedgerEntryId, LedgerFilter, "ledger entry",
    |r| r.id, |e, f| f.matches(e));
entity!(BranchSettings, BranchId, BranchSettingsFilter, "branch settings",
    |r| r.branch_id, |e, f| f.matches(e));
entity!(SavingsAccount, SavingsAccountId, SavingsAccountFilter, "savings account",
    |r| r.id, |e, f| f.matches(e));
entity!(MemberProfile, MemberProfileId, MemberProfileFilter, "member profile",
    |r| r.id, |e, f| f.matches(e));
entity!(AccrualBatch, AccrualBatchId, AccrualBatchFilter, "accrual batch",
    |r| r.id, |e, f| f.matches(e));
entity!(AccrualEntry, AccrualEntryId, AccrualEntryFilter, "accrual entry",
    |r| r.id, |e, f| f.matches(e));
entity!(DistributionBatch, DistributionBatchId, DistributionBatchFilter, "distribution batch",
    |r| r.id, |e, f| f.matches(e));
entity!(AdditionalBeneficiary, BeneficiaryId, BatchChildFilter, "beneficiary",
    |r| r.id, |e, f| f.matches(e.batch_id));
entity!(AmountTableRow, AmountRowId, BatchChildFilter, "amount table row",
    |r| r.id, |e, f| f.matches(e.batch_id));
entity!(DistributionEntry, DistributionEntryId, BatchChildFilter, "distribution entry",
    |r| r.id, |e, f| f.matches(e.batch_id));
