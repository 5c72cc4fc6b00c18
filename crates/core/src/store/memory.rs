//! In-memory store.
//!
//! A transaction takes the single store lock and works on a copy of all
//! tables; commit writes the copy back, rollback drops it. Transactions are
//! therefore fully serialized, which gives `get_for_update` its row-lock
//! semantics for free.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::accrual::{AccrualBatch, AccrualEntry};
use crate::distribution::{
    AdditionalBeneficiary, AmountTableRow, DistributionBatch, DistributionEntry,
};
use crate::error::StoreError;
use crate::ledger::LedgerEntry;
use crate::reference::{BranchSettings, MemberProfile, SavingsAccount};

use super::{Entity, Repository, TransactionManager};

type Table<E> = BTreeMap<<E as Entity>::Id, E>;

#[derive(Debug, Clone, Default)]
struct Tables {
    ledger_entries: Table<LedgerEntry>,
    branch_settings: Table<BranchSettings>,
    savings_accounts: Table<SavingsAccount>,
    member_profiles: Table<MemberProfile>,
    accrual_batches: Table<AccrualBatch>,
    accrual_entries: Table<AccrualEntry>,
    distribution_batches: Table<DistributionBatch>,
    beneficiaries: Table<AdditionalBeneficiary>,
    amount_rows: Table<AmountTableRow>,
    distribution_entries: Table<DistributionEntry>,
}

/// Injected failure: the `nth` create of `entity` fails.
#[derive(Debug, Clone, Copy)]
struct FailPoint {
    entity: &'static str,
    remaining: usize,
}

/// Open transaction on a [`MemoryStore`].
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

/// Thread-safe in-memory implementation of every repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts records in their own committed transaction.
    pub async fn seed<E, I>(&self, rows: I) -> Result<(), StoreError>
    where
        E: Entity,
        I: IntoIterator<Item = E> + Send,
        I::IntoIter: Send,
        Self: Repository<E>,
    {
        let mut tx = self.begin().await?;
        for row in rows {
            Repository::<E>::create(self, &mut tx, &row).await?;
        }
        self.commit(tx).await
    }

    /// Reads every committed record passing `filter`.
    pub async fn snapshot<E>(&self, filter: &E::Filter) -> Result<Vec<E>, StoreError>
    where
        E: Entity,
        Self: Repository<E>,
    {
        let mut tx = self.begin().await?;
        let rows = Repository::<E>::find(self, &mut tx, filter).await;
        self.rollback(tx).await?;
        rows
    }

    /// Makes the `nth` (1-based) create of `E` fail with a backend error.
    pub async fn fail_nth_create<E: Entity>(&self, nth: usize) {
        *self.fail_point.lock().await = Some(FailPoint {
            entity: E::NAME,
            remaining: nth,
        });
    }

    async fn check_fail_point(&self, entity: &'static str) -> Result<(), StoreError> {
        let mut slot = self.fail_point.lock().await;
        let Some(point) = slot.as_mut() else {
            return Ok(());
        };
        if point.entity != entity {
            return Ok(());
        }
        point.remaining = point.remaining.saturating_sub(1);
        if point.remaining == 0 {
            *slot = None;
            return Err(StoreError::Backend(format!("injected failure creating {entity}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = tx;
        *guard = working;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }
}

macro_rules! memory_repository {
    ($ty:ty, $table:ident) => {
        #[async_trait]
        impl Repository<$ty> for MemoryStore {
            async fn get_by_id(
                &self,
                tx: &mut MemoryTx,
                id: <$ty as Entity>::Id,
            ) -> Result<Option<$ty>, StoreError> {
                Ok(tx.working.$table.get(&id).cloned())
            }

            async fn get_for_update(
                &self,
                tx: &mut MemoryTx,
                id: <$ty as Entity>::Id,
            ) -> Result<Option<$ty>, StoreError> {
                Ok(tx.working.$table.get(&id).cloned())
            }

            async fn find(
                &self,
                tx: &mut MemoryTx,
                filter: &<$ty as Entity>::Filter,
            ) -> Result<Vec<$ty>, StoreError> {
                Ok(tx
                    .working
                    .$table
                    .values()
                    .filter(|row| row.matches(filter))
                    .cloned()
                    .collect())
            }

            async fn create(&self, tx: &mut MemoryTx, entity: &$ty) -> Result<(), StoreError> {
                self.check_fail_point(<$ty as Entity>::NAME).await?;
                let id = entity.id();
                if tx.working.$table.contains_key(&id) {
                    return Err(StoreError::Conflict(format!(
                        "{} {id} already exists",
                        <$ty as Entity>::NAME
                    )));
                }
                tx.working.$table.insert(id, entity.clone());
                Ok(())
            }

            async fn update(&self, tx: &mut MemoryTx, entity: &$ty) -> Result<(), StoreError> {
                let id = entity.id();
                match tx.working.$table.get_mut(&id) {
                    Some(row) => {
                        *row = entity.clone();
                        Ok(())
                    }
                    None => Err(StoreError::NotFound {
                        entity: <$ty as Entity>::NAME,
                        id: id.to_string(),
                    }),
                }
            }

            async fn delete(
                &self,
                tx: &mut MemoryTx,
                id: <$ty as Entity>::Id,
            ) -> Result<bool, StoreError> {
                Ok(tx.working.$table.remove(&id).is_some())
            }

            async fn delete_where(
                &self,
                tx: &mut MemoryTx,
                filter: &<$ty as Entity>::Filter,
            ) -> Result<u64, StoreError> {
                let before = tx.working.$table.len();
                tx.working.$table.retain(|_, row| !row.matches(filter));
                Ok((before - tx.working.$table.len()) as u64)
            }
        }
    };
}

memory_repository!(LedgerEntry, ledger_entries);
memory_repository!(BranchSettings, branch_settings);
memory_repository!(SavingsAccount, savings_accounts);
memory_repository!(MemberProfile, member_profiles);
memory_repository!(AccrualBatch, accrual_batches);
memory_repository!(AccrualEntry, accrual_entries);
memory_repository!(DistributionBatch, distribution_batches);
memory_repository!(AdditionalBeneficiary, beneficiaries);
memory_repository!(AmountTableRow, amount_rows);
memory_repository!(DistributionEntry, distribution_entries);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::fixtures::entry;
    use crate::ledger::LedgerFilter;
    use chrono::NaiveDate;
    use ecoop_shared::types::AccountId;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let row = entry(AccountId::new(), None, dec!(10), dec!(0), day());

        let mut tx = store.begin().await.unwrap();
        Repository::<LedgerEntry>::create(&store, &mut tx, &row).await.unwrap();
        store.commit(tx).await.unwrap();

        let rows: Vec<LedgerEntry> = store.snapshot(&LedgerFilter::default()).await.unwrap();
        assert_eq!(rows, vec![row]);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let row = entry(AccountId::new(), None, dec!(10), dec!(0), day());

        let mut tx = store.begin().await.unwrap();
        Repository::<LedgerEntry>::create(&store, &mut tx, &row).await.unwrap();
        store.rollback(tx).await.unwrap();

        let rows: Vec<LedgerEntry> = store.snapshot(&LedgerFilter::default()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemoryStore::new();
        let row = entry(AccountId::new(), None, dec!(10), dec!(0), day());
        store.seed(vec![row.clone()]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = Repository::<LedgerEntry>::create(&store, &mut tx, &row)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let row = entry(AccountId::new(), None, dec!(10), dec!(0), day());

        let mut tx = store.begin().await.unwrap();
        let err = Repository::<LedgerEntry>::update(&store, &mut tx, &row)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_where() {
        let store = MemoryStore::new();
        let keep = AccountId::new();
        let drop_me = AccountId::new();
        store
            .seed(vec![
                entry(keep, None, dec!(1), dec!(0), day()),
                entry(drop_me, None, dec!(2), dec!(0), day()),
                entry(drop_me, None, dec!(0), dec!(3), day()),
            ])
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let filter = LedgerFilter {
            account_id: Some(drop_me),
            ..LedgerFilter::default()
        };
        let removed = Repository::<LedgerEntry>::delete_where(&store, &mut tx, &filter)
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(removed, 2);
        let rows: Vec<LedgerEntry> = store.snapshot(&LedgerFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_id, keep);
    }

    #[tokio::test]
    async fn test_fail_point_fires_once() {
        let store = MemoryStore::new();
        store.fail_nth_create::<LedgerEntry>(2).await;

        let mut tx = store.begin().await.unwrap();
        let first = entry(AccountId::new(), None, dec!(1), dec!(0), day());
        let second = entry(AccountId::new(), None, dec!(1), dec!(0), day());
        Repository::<LedgerEntry>::create(&store, &mut tx, &first).await.unwrap();
        let err = Repository::<LedgerEntry>::create(&store, &mut tx, &second)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        Repository::<LedgerEntry>::create(&store, &mut tx, &second).await.unwrap();
    }
}
