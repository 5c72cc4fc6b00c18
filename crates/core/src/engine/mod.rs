//! Batch engine service.
//!
//! Every public operation runs in exactly one store transaction: it begins,
//! does its reads and writes through the repository seams, and commits on
//! success or rolls back on any error. Mutating operations lock the batch
//! header with `get_for_update` before touching it, so two concurrent posts
//! of the same batch serialize and the second one observes `Posted`.

mod accrual;
mod distribution;

#[cfg(test)]
mod tests;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use ecoop_shared::types::{AccountId, BranchId, MemberProfileId, MoneyScale, OrganizationId};
use ecoop_shared::EngineConfig;

use crate::error::{EngineError, ErrorCategory};
use crate::ledger::{BalanceSummary, LedgerEntry, LedgerFilter};
use crate::posting::{PlanTotals, PostingPlan};
use crate::store::{Entity, Repository, Store, TransactionManager};

pub use accrual::AccrualView;
pub use distribution::DistributionView;

type Tx<S> = <S as TransactionManager>::Tx;

/// Outcome of a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    /// The batch the ledger rows reference.
    pub reference_batch_id: Uuid,
    /// Number of ledger rows written.
    pub rows_written: usize,
    /// Debit and credit sums of the written rows.
    pub totals: PlanTotals,
    /// Posting timestamp stamped on the batch.
    pub posted_at: DateTime<Utc>,
}

/// Computes, stages, prints and posts accrual and distribution batches.
pub struct BatchEngine<S> {
    store: S,
    scale: MoneyScale,
    default_annual_divisor: Option<u32>,
}

impl<S: Store> BatchEngine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            scale: config.scale(),
            default_annual_divisor: config.default_annual_divisor,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Rounding precision used for every computed amount.
    pub const fn scale(&self) -> MoneyScale {
        self.scale
    }

    /// Aggregates a general ledger account, or one member's sub-ledger of
    /// it, up to and including `as_of`.
    #[tracing::instrument(skip(self))]
    pub async fn account_balance(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        account_id: AccountId,
        member_profile_id: Option<MemberProfileId>,
        as_of: NaiveDate,
    ) -> Result<BalanceSummary, EngineError> {
        let mut filter = LedgerFilter::branch(organization_id, branch_id)
            .account(account_id)
            .as_of(as_of);
        filter.member_profile_id = member_profile_id;

        let mut tx = self.store.begin().await?;
        let result = Repository::<LedgerEntry>::find(&self.store, &mut tx, &filter)
            .await
            .map(|rows| BalanceSummary::aggregate(&rows))
            .map_err(EngineError::from);
        self.finish(tx, result).await
    }

    async fn fetch<E>(&self, tx: &mut Tx<S>, id: E::Id) -> Result<E, EngineError>
    where
        E: Entity,
        S: Repository<E>,
    {
        Repository::<E>::get_by_id(&self.store, tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found(E::NAME, id))
    }

    async fn lock<E>(&self, tx: &mut Tx<S>, id: E::Id) -> Result<E, EngineError>
    where
        E: Entity,
        S: Repository<E>,
    {
        Repository::<E>::get_for_update(&self.store, tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found(E::NAME, id))
    }

    /// Checks the plan and appends its rows.
    async fn write_plan(
        &self,
        tx: &mut Tx<S>,
        plan: PostingPlan,
        reference_batch_id: Uuid,
        posted_at: DateTime<Utc>,
    ) -> Result<PostingReceipt, EngineError> {
        let totals = plan.ensure_balanced()?;
        let rows = plan.into_entries();
        for row in &rows {
            Repository::<LedgerEntry>::create(&self.store, tx, row).await?;
        }
        Ok(PostingReceipt {
            reference_batch_id,
            rows_written: rows.len(),
            totals,
            posted_at,
        })
    }

    /// Commits on success, rolls back on failure and returns the original error.
    async fn finish<T: Send>(
        &self,
        tx: Tx<S>,
        result: Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        match result {
            Ok(value) => {
                self.store.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.store.rollback(tx).await {
                    error!(error = %rollback, "Rollback failed");
                }
                match err.category() {
                    ErrorCategory::StateConflict => warn!(error = %err, "Batch state conflict"),
                    ErrorCategory::Persistence => error!(error = %err, "Transaction rolled back"),
                    ErrorCategory::Validation | ErrorCategory::NotFound => {
                        debug!(error = %err, code = err.error_code(), "Request rejected");
                    }
                }
                Err(err)
            }
        }
    }
}
