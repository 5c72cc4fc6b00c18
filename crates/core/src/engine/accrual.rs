//! Accrual batch operations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use ecoop_shared::types::{AccrualBatchId, UserId};

use crate::accrual::{
    AccrualBatch, AccrualBatchFilter, AccrualComputation, AccrualEntry, AccrualEntryFilter,
    AccrualGenerator, AccrualLine, AccrualParams, AccrualRun, AccrualTotals, SubLedgerKey,
};
use crate::error::EngineError;
use crate::ledger::{LedgerEntry, LedgerFilter};
use crate::lifecycle::{BatchState, Lifecycle, StateConflict};
use crate::posting::{PostParams, PostingPlanner};
use crate::reference::{BranchSettings, SavingsAccount, SavingsAccountFilter};
use crate::store::{Repository, Store};

use super::{BatchEngine, PostingReceipt, Tx};

/// An accrual batch with its staged entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualView {
    /// Header.
    pub batch: AccrualBatch,
    /// Entries ordered by sub-ledger.
    pub entries: Vec<AccrualEntry>,
    /// Sums over `entries`.
    pub totals: AccrualTotals,
}

impl<S: Store> BatchEngine<S> {
    /// Computes interest for a request without writing anything.
    #[tracing::instrument(skip(self, params), fields(document_no = %params.document_no))]
    pub async fn preview_accrual(
        &self,
        params: &AccrualParams,
    ) -> Result<AccrualComputation, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.compute_accrual(&mut tx, params).await;
        self.finish(tx, result).await
    }

    /// Computes interest and persists it as a Draft batch.
    #[tracing::instrument(skip(self, params), fields(document_no = %params.document_no))]
    pub async fn create_accrual_batch(
        &self,
        params: &AccrualParams,
        user: UserId,
    ) -> Result<AccrualBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.create_accrual_tx(&mut tx, params, user).await;
        let batch = self.finish(tx, result).await?;
        info!(
            batch_id = %batch.id,
            total_interest = %batch.total_interest,
            total_tax = %batch.total_tax,
            "Accrual batch created"
        );
        Ok(batch)
    }

    /// Replaces the staged entries of a Draft batch with a fresh computation.
    #[tracing::instrument(skip(self))]
    pub async fn regenerate_accrual(
        &self,
        batch_id: AccrualBatchId,
        user: UserId,
    ) -> Result<AccrualView, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.regenerate_accrual_tx(&mut tx, batch_id, user).await;
        let view = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, entries = view.entries.len(), "Accrual batch regenerated");
        Ok(view)
    }

    /// Draft → Printed.
    #[tracing::instrument(skip(self))]
    pub async fn print_accrual(
        &self,
        batch_id: AccrualBatchId,
        user: UserId,
    ) -> Result<AccrualBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .transition_accrual(&mut tx, batch_id, user, |lifecycle, now| {
                lifecycle.print(user, now)
            })
            .await;
        let batch = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, printed_by = %user, "Accrual batch printed");
        Ok(batch)
    }

    /// Printed → Draft.
    #[tracing::instrument(skip(self))]
    pub async fn undo_print_accrual(
        &self,
        batch_id: AccrualBatchId,
        user: UserId,
    ) -> Result<AccrualBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .transition_accrual(&mut tx, batch_id, user, |lifecycle, _| lifecycle.undo_print())
            .await;
        let batch = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, "Accrual batch returned to draft");
        Ok(batch)
    }

    /// Printed → Posted, writing the batch's ledger rows in the same transaction.
    #[tracing::instrument(skip(self, params), fields(post_account_id = %params.post_account_id))]
    pub async fn post_accrual(
        &self,
        batch_id: AccrualBatchId,
        params: &PostParams,
        user: UserId,
    ) -> Result<PostingReceipt, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.post_accrual_tx(&mut tx, batch_id, params, user).await;
        let receipt = self.finish(tx, result).await?;
        info!(
            batch_id = %batch_id,
            rows = receipt.rows_written,
            debit = %receipt.totals.debit,
            "Accrual batch posted"
        );
        Ok(receipt)
    }

    /// Header, staged entries and totals of a batch.
    #[tracing::instrument(skip(self))]
    pub async fn accrual_view(&self, batch_id: AccrualBatchId) -> Result<AccrualView, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.accrual_view_tx(&mut tx, batch_id).await;
        self.finish(tx, result).await
    }

    async fn create_accrual_tx(
        &self,
        tx: &mut Tx<S>,
        params: &AccrualParams,
        user: UserId,
    ) -> Result<AccrualBatch, EngineError> {
        let computation = self.compute_accrual(tx, params).await?;
        let now = Utc::now();
        let batch = AccrualBatch {
            id: AccrualBatchId::new(),
            organization_id: params.organization_id,
            branch_id: params.branch_id,
            document_no: params.document_no.clone(),
            last_computation_date: params.last_computation_date,
            new_computation_date: params.new_computation_date,
            account_id: params.account_id,
            member_type_id: params.member_type_id,
            include_closed_account: params.include_closed_account,
            include_existing_computed_interest: params.include_existing_computed_interest,
            balance_basis: params.balance_basis,
            interest_tax_rate: computation.interest_tax_rate,
            annual_divisor: computation.annual_divisor,
            total_interest: computation.totals.total_interest,
            total_tax: computation.totals.total_tax,
            lifecycle: Lifecycle::draft(),
            post_account_id: None,
            check_voucher_number: None,
            created_at: now,
            created_by: user,
            updated_at: now,
            updated_by: user,
        };
        Repository::<AccrualBatch>::create(&self.store, tx, &batch).await?;
        self.stage_accrual_entries(tx, batch.id, &computation.lines).await?;
        Ok(batch)
    }

    async fn regenerate_accrual_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
        user: UserId,
    ) -> Result<AccrualView, EngineError> {
        let mut batch: AccrualBatch = self.lock(tx, batch_id).await?;
        batch.lifecycle.require(BatchState::Draft)?;

        let computation = self.compute_accrual(tx, &batch.params()).await?;
        Repository::<AccrualEntry>::delete_where(
            &self.store,
            tx,
            &AccrualEntryFilter::batch(batch_id),
        )
        .await?;
        self.stage_accrual_entries(tx, batch_id, &computation.lines).await?;

        batch.annual_divisor = computation.annual_divisor;
        batch.total_interest = computation.totals.total_interest;
        batch.total_tax = computation.totals.total_tax;
        batch.updated_at = Utc::now();
        batch.updated_by = user;
        Repository::<AccrualBatch>::update(&self.store, tx, &batch).await?;

        self.accrual_view_tx(tx, batch_id).await
    }

    /// Locks the header, applies a lifecycle transition and saves it.
    async fn transition_accrual<F>(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
        user: UserId,
        step: F,
    ) -> Result<AccrualBatch, EngineError>
    where
        F: FnOnce(&Lifecycle, DateTime<Utc>) -> Result<Lifecycle, StateConflict> + Send,
    {
        let mut batch: AccrualBatch = self.lock(tx, batch_id).await?;
        let now = Utc::now();
        batch.lifecycle = step(&batch.lifecycle, now)?;
        batch.updated_at = now;
        batch.updated_by = user;
        Repository::<AccrualBatch>::update(&self.store, tx, &batch).await?;
        Ok(batch)
    }

    async fn post_accrual_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
        params: &PostParams,
        user: UserId,
    ) -> Result<PostingReceipt, EngineError> {
        let mut batch: AccrualBatch = self.lock(tx, batch_id).await?;
        let now = Utc::now();
        batch.lifecycle = batch.lifecycle.post(user, now)?;

        let entries = self.accrual_entries(tx, batch_id).await?;
        let plan = PostingPlanner::accrual(&batch, &entries, params, user, now);
        let receipt = self.write_plan(tx, plan, batch_id.into_inner(), now).await?;

        batch.post_account_id = Some(params.post_account_id);
        batch.check_voucher_number = params.voucher().map(str::to_owned);
        batch.updated_at = now;
        batch.updated_by = user;
        Repository::<AccrualBatch>::update(&self.store, tx, &batch).await?;
        Ok(receipt)
    }

    async fn accrual_view_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
    ) -> Result<AccrualView, EngineError> {
        let batch: AccrualBatch = self.fetch(tx, batch_id).await?;
        let entries = self.accrual_entries(tx, batch_id).await?;
        let totals = AccrualTotals::from_entries(&entries);
        Ok(AccrualView {
            batch,
            entries,
            totals,
        })
    }

    async fn accrual_entries(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
    ) -> Result<Vec<AccrualEntry>, EngineError> {
        let mut entries =
            Repository::<AccrualEntry>::find(&self.store, tx, &AccrualEntryFilter::batch(batch_id))
                .await?;
        entries.sort_by_key(|e| (e.account_id, e.member_profile_id));
        Ok(entries)
    }

    async fn stage_accrual_entries(
        &self,
        tx: &mut Tx<S>,
        batch_id: AccrualBatchId,
        lines: &[AccrualLine],
    ) -> Result<(), EngineError> {
        for line in lines {
            let entry = AccrualEntry::from_line(batch_id, line);
            Repository::<AccrualEntry>::create(&self.store, tx, &entry).await?;
        }
        Ok(())
    }

    /// Loads everything a computation reads and runs the generator.
    async fn compute_accrual(
        &self,
        tx: &mut Tx<S>,
        params: &AccrualParams,
    ) -> Result<AccrualComputation, EngineError> {
        let (annual_divisor, interest_tax_rate) = self.resolve_rates(tx, params).await?;

        let accounts = Repository::<SavingsAccount>::find(
            &self.store,
            tx,
            &SavingsAccountFilter {
                organization_id: Some(params.organization_id),
                branch_id: Some(params.branch_id),
                account_id: params.account_id,
                member_type_id: params.member_type_id,
                include_closed: params.include_closed_account,
            },
        )
        .await?;

        let mut ledger_filter = LedgerFilter::branch(params.organization_id, params.branch_id)
            .as_of(params.new_computation_date);
        ledger_filter.account_id = params.account_id;
        let ledger = Repository::<LedgerEntry>::find(&self.store, tx, &ledger_filter).await?;

        let already_computed = if params.include_existing_computed_interest {
            HashSet::new()
        } else {
            self.computed_sub_ledgers(tx, params).await?
        };

        let run = AccrualRun {
            params,
            annual_divisor,
            interest_tax_rate,
            scale: self.scale,
        };
        Ok(AccrualGenerator::generate(
            &run,
            &accounts,
            &ledger,
            &already_computed,
        )?)
    }

    /// Divisor from branch settings (else config), tax rate from the request
    /// (else branch settings).
    async fn resolve_rates(
        &self,
        tx: &mut Tx<S>,
        params: &AccrualParams,
    ) -> Result<(u32, Decimal), EngineError> {
        let (organization_id, branch_id) = (params.organization_id, params.branch_id);
        let settings = Repository::<BranchSettings>::get_by_id(&self.store, tx, branch_id)
            .await?
            .filter(|s| s.organization_id == organization_id);

        let annual_divisor = settings
            .as_ref()
            .and_then(|s| s.annual_divisor)
            .or(self.default_annual_divisor)
            .ok_or_else(|| {
                if settings.is_none() {
                    EngineError::MissingBranchSettings(branch_id)
                } else {
                    EngineError::MissingAnnualDivisor
                }
            })?;

        let interest_tax_rate = params
            .interest_tax_rate
            .or_else(|| settings.as_ref().and_then(|s| s.interest_tax_rate))
            .ok_or(EngineError::MissingTaxRate)?;

        Ok((annual_divisor, interest_tax_rate))
    }

    /// Sub-ledgers already credited by a posted batch overlapping the window.
    async fn computed_sub_ledgers(
        &self,
        tx: &mut Tx<S>,
        params: &AccrualParams,
    ) -> Result<HashSet<SubLedgerKey>, EngineError> {
        let posted = Repository::<AccrualBatch>::find(
            &self.store,
            tx,
            &AccrualBatchFilter {
                organization_id: Some(params.organization_id),
                branch_id: Some(params.branch_id),
                state: Some(BatchState::Posted),
                overlapping: Some((params.last_computation_date, params.new_computation_date)),
            },
        )
        .await?;

        let mut keys = HashSet::new();
        for batch in posted {
            let filter = AccrualEntryFilter::batch(batch.id);
            let entries = Repository::<AccrualEntry>::find(&self.store, tx, &filter).await?;
            keys.extend(entries.into_iter().map(|e| (e.account_id, e.member_profile_id)));
        }
        Ok(keys)
    }
}
