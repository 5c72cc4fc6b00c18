//! PostgreSQL implementation of the engine storage seams.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use ecoop_core::StoreError;
use ecoop_core::accrual::{AccrualBatch, AccrualEntry};
use ecoop_core::distribution::{
    AdditionalBeneficiary, AmountTableRow, DistributionBatch, DistributionEntry,
};
use ecoop_core::ledger::LedgerEntry;
use ecoop_core::reference::{BranchSettings, MemberProfile, SavingsAccount, SavingsAccountFilter};
use ecoop_core::store::{Entity, Repository, TransactionManager};
use ecoop_shared::types::SavingsAccountId;

use crate::entities::{
    accrual_batches, accrual_entries, branch_settings, distribution_amount_rows,
    distribution_batches, distribution_beneficiaries, distribution_entries, ledger_entries,
    member_profiles, savings_account_date_rates, savings_account_rate_tiers,
    savings_account_year_rates, savings_accounts,
};
use crate::mapping::{
    Mapped, RateRows, rate_actives, savings_account_active, savings_account_from_models,
};
use crate::query;

/// Maps a driver error, surfacing unique violations as conflicts.
fn db_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Conflict(msg),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn update_err<E: Entity>(err: DbErr, id: E::Id) -> StoreError {
    match err {
        DbErr::RecordNotUpdated => StoreError::NotFound {
            entity: E::NAME,
            id: id.to_string(),
        },
        other => db_err(other),
    }
}

/// Engine store backed by a `SeaORM` connection pool.
///
/// Each engine transaction maps to one database transaction; header locks
/// are `SELECT ... FOR UPDATE`.
#[derive(Debug, Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl TransactionManager for SeaStore {
    type Tx = DatabaseTransaction;

    async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        self.db.begin().await.map_err(db_err)
    }

    async fn commit(&self, tx: DatabaseTransaction) -> Result<(), StoreError> {
        tx.commit().await.map_err(db_err)
    }

    async fn rollback(&self, tx: DatabaseTransaction) -> Result<(), StoreError> {
        tx.rollback().await.map_err(db_err)
    }
}

/// Implements `Repository` for a record stored as one row of one table.
macro_rules! sea_repository {
    ($record:ty, $table:ident, $key:ident, $condition:path) => {
        #[async_trait]
        impl Repository<$record> for SeaStore {
            async fn get_by_id(
                &self,
                tx: &mut DatabaseTransaction,
                id: <$record as Entity>::Id,
            ) -> Result<Option<$record>, StoreError> {
                $table::Entity::find_by_id(id.into_inner())
                    .one(&*tx)
                    .await
                    .map_err(db_err)?
                    .map(<$record>::from_model)
                    .transpose()
            }

            async fn get_for_update(
                &self,
                tx: &mut DatabaseTransaction,
                id: <$record as Entity>::Id,
            ) -> Result<Option<$record>, StoreError> {
                $table::Entity::find_by_id(id.into_inner())
                    .lock_exclusive()
                    .one(&*tx)
                    .await
                    .map_err(db_err)?
                    .map(<$record>::from_model)
                    .transpose()
            }

            async fn find(
                &self,
                tx: &mut DatabaseTransaction,
                filter: &<$record as Entity>::Filter,
            ) -> Result<Vec<$record>, StoreError> {
                let condition = $condition(filter);
                $table::Entity::find()
                    .filter(condition)
                    .order_by_asc($table::Column::$key)
                    .all(&*tx)
                    .await
                    .map_err(db_err)?
                    .into_iter()
                    .map(<$record>::from_model)
                    .collect()
            }

            async fn create(
                &self,
                tx: &mut DatabaseTransaction,
                record: &$record,
            ) -> Result<(), StoreError> {
                $table::Entity::insert(record.to_active()?)
                    .exec_without_returning(&*tx)
                    .await
                    .map_err(db_err)?;
                Ok(())
            }

            async fn update(
                &self,
                tx: &mut DatabaseTransaction,
                record: &$record,
            ) -> Result<(), StoreError> {
                record
                    .to_active()?
                    .update(&*tx)
                    .await
                    .map_err(|e| update_err::<$record>(e, record.id()))?;
                Ok(())
            }

            async fn delete(
                &self,
                tx: &mut DatabaseTransaction,
                id: <$record as Entity>::Id,
            ) -> Result<bool, StoreError> {
                let result = $table::Entity::delete_by_id(id.into_inner())
                    .exec(&*tx)
                    .await
                    .map_err(db_err)?;
                Ok(result.rows_affected > 0)
            }

            async fn delete_where(
                &self,
                tx: &mut DatabaseTransaction,
                filter: &<$record as Entity>::Filter,
            ) -> Result<u64, StoreError> {
                let condition = $condition(filter);
                let result = $table::Entity::delete_many()
                    .filter(condition)
                    .exec(&*tx)
                    .await
                    .map_err(db_err)?;
                Ok(result.rows_affected)
            }
        }
    };
}

sea_repository!(LedgerEntry, ledger_entries, Id, query::ledger);
sea_repository!(BranchSettings, branch_settings, BranchId, query::branch_settings);
sea_repository!(MemberProfile, member_profiles, Id, query::member_profiles);
sea_repository!(AccrualBatch, accrual_batches, Id, query::accrual_batches);
sea_repository!(AccrualEntry, accrual_entries, Id, query::accrual_entries);
sea_repository!(DistributionBatch, distribution_batches, Id, query::distribution_batches);
sea_repository!(AdditionalBeneficiary, distribution_beneficiaries, Id, query::beneficiaries);
sea_repository!(AmountTableRow, distribution_amount_rows, Id, query::amount_rows);
sea_repository!(DistributionEntry, distribution_entries, Id, query::distribution_entries);

/// Child rows of the given savings accounts, grouped by owner.
async fn rows_by_account<E>(
    tx: &DatabaseTransaction,
    owner: E::Column,
    account_ids: &[Uuid],
    key: impl Fn(&E::Model) -> Uuid,
) -> Result<HashMap<Uuid, Vec<E::Model>>, StoreError>
where
    E: EntityTrait,
{
    let mut by_account: HashMap<Uuid, Vec<E::Model>> = HashMap::new();
    if account_ids.is_empty() {
        return Ok(by_account);
    }

    let rows = E::find()
        .filter(owner.is_in(account_ids.iter().copied()))
        .all(tx)
        .await
        .map_err(db_err)?;
    for row in rows {
        by_account.entry(key(&row)).or_default().push(row);
    }
    Ok(by_account)
}

impl SeaStore {
    async fn load_accounts(
        tx: &DatabaseTransaction,
        accounts: Vec<savings_accounts::Model>,
    ) -> Result<Vec<SavingsAccount>, StoreError> {
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
        let mut tiers = rows_by_account::<savings_account_rate_tiers::Entity>(
            tx,
            savings_account_rate_tiers::Column::SavingsAccountId,
            &ids,
            |row| row.savings_account_id,
        )
        .await?;
        let mut by_year = rows_by_account::<savings_account_year_rates::Entity>(
            tx,
            savings_account_year_rates::Column::SavingsAccountId,
            &ids,
            |row| row.savings_account_id,
        )
        .await?;
        let mut by_date = rows_by_account::<savings_account_date_rates::Entity>(
            tx,
            savings_account_date_rates::Column::SavingsAccountId,
            &ids,
            |row| row.savings_account_id,
        )
        .await?;

        accounts
            .into_iter()
            .map(|account| {
                let rates = RateRows {
                    tiers: tiers.remove(&account.id).unwrap_or_default(),
                    by_year: by_year.remove(&account.id).unwrap_or_default(),
                    by_date: by_date.remove(&account.id).unwrap_or_default(),
                };
                savings_account_from_models(account, rates)
            })
            .collect()
    }

    async fn insert_rates(
        tx: &DatabaseTransaction,
        account: &SavingsAccount,
    ) -> Result<(), StoreError> {
        let rows = rate_actives(account);
        if !rows.tiers.is_empty() {
            savings_account_rate_tiers::Entity::insert_many(rows.tiers)
                .exec_without_returning(tx)
                .await
                .map_err(db_err)?;
        }
        if !rows.by_year.is_empty() {
            savings_account_year_rates::Entity::insert_many(rows.by_year)
                .exec_without_returning(tx)
                .await
                .map_err(db_err)?;
        }
        if !rows.by_date.is_empty() {
            savings_account_date_rates::Entity::insert_many(rows.by_date)
                .exec_without_returning(tx)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    async fn delete_rates(
        tx: &DatabaseTransaction,
        account: SavingsAccountId,
    ) -> Result<(), StoreError> {
        let owner = account.into_inner();
        savings_account_rate_tiers::Entity::delete_many()
            .filter(savings_account_rate_tiers::Column::SavingsAccountId.eq(owner))
            .exec(tx)
            .await
            .map_err(db_err)?;
        savings_account_year_rates::Entity::delete_many()
            .filter(savings_account_year_rates::Column::SavingsAccountId.eq(owner))
            .exec(tx)
            .await
            .map_err(db_err)?;
        savings_account_date_rates::Entity::delete_many()
            .filter(savings_account_date_rates::Column::SavingsAccountId.eq(owner))
            .exec(tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl Repository<SavingsAccount> for SeaStore {
    async fn get_by_id(
        &self,
        tx: &mut DatabaseTransaction,
        id: SavingsAccountId,
    ) -> Result<Option<SavingsAccount>, StoreError> {
        let found = savings_accounts::Entity::find_by_id(id.into_inner())
            .one(&*tx)
            .await
            .map_err(db_err)?;
        Ok(Self::load_accounts(tx, found.into_iter().collect()).await?.pop())
    }

    async fn get_for_update(
        &self,
        tx: &mut DatabaseTransaction,
        id: SavingsAccountId,
    ) -> Result<Option<SavingsAccount>, StoreError> {
        let found = savings_accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&*tx)
            .await
            .map_err(db_err)?;
        Ok(Self::load_accounts(tx, found.into_iter().collect()).await?.pop())
    }

    async fn find(
        &self,
        tx: &mut DatabaseTransaction,
        filter: &SavingsAccountFilter,
    ) -> Result<Vec<SavingsAccount>, StoreError> {
        let accounts = savings_accounts::Entity::find()
            .filter(query::savings_accounts(filter))
            .order_by_asc(savings_accounts::Column::Id)
            .all(&*tx)
            .await
            .map_err(db_err)?;
        Self::load_accounts(tx, accounts).await
    }

    async fn create(
        &self,
        tx: &mut DatabaseTransaction,
        account: &SavingsAccount,
    ) -> Result<(), StoreError> {
        savings_accounts::Entity::insert(savings_account_active(account))
            .exec_without_returning(&*tx)
            .await
            .map_err(db_err)?;
        Self::insert_rates(tx, account).await
    }

    async fn update(
        &self,
        tx: &mut DatabaseTransaction,
        account: &SavingsAccount,
    ) -> Result<(), StoreError> {
        savings_account_active(account)
            .update(&*tx)
            .await
            .map_err(|e| update_err::<SavingsAccount>(e, account.id))?;
        Self::delete_rates(tx, account.id).await?;
        Self::insert_rates(tx, account).await
    }

    async fn delete(
        &self,
        tx: &mut DatabaseTransaction,
        id: SavingsAccountId,
    ) -> Result<bool, StoreError> {
        let result = savings_accounts::Entity::delete_by_id(id.into_inner())
            .exec(&*tx)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_where(
        &self,
        tx: &mut DatabaseTransaction,
        filter: &SavingsAccountFilter,
    ) -> Result<u64, StoreError> {
        let result = savings_accounts::Entity::delete_many()
            .filter(query::savings_accounts(filter))
            .exec(&*tx)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoop_shared::types::LedgerEntryId;

    #[test]
    fn test_record_not_updated_is_not_found() {
        let id = LedgerEntryId::new();
        let err = update_err::<LedgerEntry>(DbErr::RecordNotUpdated, id);
        assert_eq!(
            err,
            StoreError::NotFound {
                entity: "ledger entry",
                id: id.to_string(),
            }
        );
    }

    #[test]
    fn test_other_errors_are_backend() {
        let err = db_err(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("connection reset")));
    }
}
