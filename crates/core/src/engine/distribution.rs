//! Distribution batch operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ecoop_shared::types::{
    AmountRowId, BeneficiaryId, DistributionBatchId, DistributionEntryId, UserId,
};

use crate::distribution::table::validate_table;
use crate::distribution::{
    AdditionalBeneficiary, AmountRowInput, AmountTableRow, BatchChildFilter, BeneficiaryInput,
    DistributionBatch, DistributionComputation, DistributionEntry, DistributionError,
    DistributionGenerator, DistributionInput, DistributionLine, DistributionRequest, LineRecipient,
    Recipient,
};
use crate::error::EngineError;
use crate::lifecycle::{BatchState, Lifecycle, StateConflict};
use crate::posting::{PostParams, PostingPlanner};
use crate::reference::MemberProfile;
use crate::store::{Repository, Store};

use super::{BatchEngine, PostingReceipt, Tx};

/// A distribution batch with its inputs and computed shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionView {
    /// Header.
    pub batch: DistributionBatch,
    /// Co-beneficiary groups in creation order.
    pub beneficiaries: Vec<AdditionalBeneficiary>,
    /// Age bands ordered by lower bound.
    pub amount_table: Vec<AmountTableRow>,
    /// Shares, primary first.
    pub entries: Vec<DistributionEntry>,
}

/// How a recomputation treats an amount table that does not cover the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unresolved {
    Reject,
    Clear,
}

impl<S: Store> BatchEngine<S> {
    /// Computes the shares of a distribution without writing anything.
    #[tracing::instrument(skip(self, input), fields(member_profile_id = %input.member_profile_id))]
    pub async fn preview_distribution(
        &self,
        input: &DistributionInput,
    ) -> Result<DistributionComputation, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.compute_distribution_input(&mut tx, input).await;
        self.finish(tx, result).await
    }

    /// Persists a Draft batch with its groups, table and computed shares.
    #[tracing::instrument(skip(self, input), fields(member_profile_id = %input.member_profile_id))]
    pub async fn create_distribution_batch(
        &self,
        input: &DistributionInput,
        user: UserId,
    ) -> Result<DistributionBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.create_distribution_tx(&mut tx, input, user).await;
        let batch = self.finish(tx, result).await?;
        info!(
            batch_id = %batch.id,
            total_amount = %batch.total_amount,
            "Distribution batch created"
        );
        Ok(batch)
    }

    /// Recomputes the shares of a Draft batch from its stored inputs.
    #[tracing::instrument(skip(self))]
    pub async fn regenerate_distribution(
        &self,
        batch_id: DistributionBatchId,
        user: UserId,
    ) -> Result<DistributionView, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.regenerate_distribution_tx(&mut tx, batch_id, user).await;
        let view = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, entries = view.entries.len(), "Distribution batch regenerated");
        Ok(view)
    }

    /// Adds a co-beneficiary group to a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn add_beneficiary(
        &self,
        batch_id: DistributionBatchId,
        input: BeneficiaryInput,
        user: UserId,
    ) -> Result<AdditionalBeneficiary, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.add_beneficiary_tx(&mut tx, batch_id, input, user).await;
        self.finish(tx, result).await
    }

    /// Replaces a co-beneficiary group of a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn update_beneficiary(
        &self,
        beneficiary_id: BeneficiaryId,
        input: BeneficiaryInput,
        user: UserId,
    ) -> Result<AdditionalBeneficiary, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.update_beneficiary_tx(&mut tx, beneficiary_id, input, user).await;
        self.finish(tx, result).await
    }

    /// Removes a co-beneficiary group from a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn delete_beneficiary(
        &self,
        beneficiary_id: BeneficiaryId,
        user: UserId,
    ) -> Result<(), EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.delete_beneficiary_tx(&mut tx, beneficiary_id, user).await;
        self.finish(tx, result).await
    }

    /// Adds an age band to a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn add_amount_row(
        &self,
        batch_id: DistributionBatchId,
        input: AmountRowInput,
        user: UserId,
    ) -> Result<AmountTableRow, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.add_amount_row_tx(&mut tx, batch_id, input, user).await;
        self.finish(tx, result).await
    }

    /// Replaces an age band of a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn update_amount_row(
        &self,
        row_id: AmountRowId,
        input: AmountRowInput,
        user: UserId,
    ) -> Result<AmountTableRow, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.update_amount_row_tx(&mut tx, row_id, input, user).await;
        self.finish(tx, result).await
    }

    /// Removes an age band from a Draft batch.
    #[tracing::instrument(skip(self))]
    pub async fn delete_amount_row(
        &self,
        row_id: AmountRowId,
        user: UserId,
    ) -> Result<(), EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.delete_amount_row_tx(&mut tx, row_id, user).await;
        self.finish(tx, result).await
    }

    /// Draft → Printed. A batch without shares cannot be printed.
    #[tracing::instrument(skip(self))]
    pub async fn print_distribution(
        &self,
        batch_id: DistributionBatchId,
        user: UserId,
    ) -> Result<DistributionBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.print_distribution_tx(&mut tx, batch_id, user).await;
        let batch = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, printed_by = %user, "Distribution batch printed");
        Ok(batch)
    }

    /// Printed → Draft.
    #[tracing::instrument(skip(self))]
    pub async fn undo_print_distribution(
        &self,
        batch_id: DistributionBatchId,
        user: UserId,
    ) -> Result<DistributionBatch, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .transition_distribution(&mut tx, batch_id, user, |lifecycle, _| lifecycle.undo_print())
            .await;
        let batch = self.finish(tx, result).await?;
        info!(batch_id = %batch_id, "Distribution batch returned to draft");
        Ok(batch)
    }

    /// Printed → Posted, writing the payout rows in the same transaction.
    #[tracing::instrument(skip(self, params), fields(post_account_id = %params.post_account_id))]
    pub async fn post_distribution(
        &self,
        batch_id: DistributionBatchId,
        params: &PostParams,
        user: UserId,
    ) -> Result<PostingReceipt, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.post_distribution_tx(&mut tx, batch_id, params, user).await;
        let receipt = self.finish(tx, result).await?;
        info!(
            batch_id = %batch_id,
            rows = receipt.rows_written,
            credit = %receipt.totals.credit,
            "Distribution batch posted"
        );
        Ok(receipt)
    }

    /// Header, groups, table and shares of a batch.
    #[tracing::instrument(skip(self))]
    pub async fn distribution_view(
        &self,
        batch_id: DistributionBatchId,
    ) -> Result<DistributionView, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = self.distribution_view_tx(&mut tx, batch_id).await;
        self.finish(tx, result).await
    }

    async fn compute_distribution_input(
        &self,
        tx: &mut Tx<S>,
        input: &DistributionInput,
    ) -> Result<DistributionComputation, EngineError> {
        let profile: MemberProfile = self.fetch(tx, input.member_profile_id).await?;
        let request = DistributionRequest {
            computation_type: input.computation_type,
            amount: input.amount,
            membership_date: profile.membership_date,
            date_of_death: input.date_of_death,
            computation_date: input.computation_date,
            beneficiaries: &input.beneficiaries,
            amount_table: &input.amount_table,
        };
        Ok(DistributionGenerator::compute(&request, self.scale)?)
    }

    async fn create_distribution_tx(
        &self,
        tx: &mut Tx<S>,
        input: &DistributionInput,
        user: UserId,
    ) -> Result<DistributionBatch, EngineError> {
        let computation = self.compute_distribution_input(tx, input).await?;
        let now = Utc::now();
        let batch = DistributionBatch {
            id: DistributionBatchId::new(),
            organization_id: input.organization_id,
            branch_id: input.branch_id,
            member_profile_id: input.member_profile_id,
            member_type_id: input.member_type_id,
            name: input.name.clone(),
            description: input.description.clone(),
            amount: input.amount,
            computation_type: input.computation_type,
            date_of_death: input.date_of_death,
            extension_only: input.extension_only,
            account_id: input.account_id,
            computation_date: input.computation_date,
            total_amount: computation.total,
            lifecycle: Lifecycle::draft(),
            post_account_id: None,
            check_voucher_number: None,
            created_at: now,
            created_by: user,
            updated_at: now,
            updated_by: user,
        };
        Repository::<DistributionBatch>::create(&self.store, tx, &batch).await?;

        let mut group_ids = Vec::with_capacity(input.beneficiaries.len());
        for group in &input.beneficiaries {
            let row = AdditionalBeneficiary {
                id: BeneficiaryId::new(),
                batch_id: batch.id,
                member_type_id: group.member_type_id,
                number_of_members: group.number_of_members,
                ratio: group.ratio,
            };
            Repository::<AdditionalBeneficiary>::create(&self.store, tx, &row).await?;
            group_ids.push(row.id);
        }
        for band in &input.amount_table {
            let row = AmountTableRow {
                id: AmountRowId::new(),
                batch_id: batch.id,
                month_from: band.month_from,
                month_to: band.month_to,
                amount: band.amount,
            };
            Repository::<AmountTableRow>::create(&self.store, tx, &row).await?;
        }
        self.stage_distribution_entries(tx, &batch, &group_ids, &computation.lines)
            .await?;
        Ok(batch)
    }

    async fn regenerate_distribution_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        user: UserId,
    ) -> Result<DistributionView, EngineError> {
        let mut batch = self.lock_draft_distribution(tx, batch_id).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Reject)
            .await?;
        self.distribution_view_tx(tx, batch_id).await
    }

    async fn add_beneficiary_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        input: BeneficiaryInput,
        user: UserId,
    ) -> Result<AdditionalBeneficiary, EngineError> {
        input.validate()?;
        let mut batch = self.lock_draft_distribution(tx, batch_id).await?;
        let row = AdditionalBeneficiary {
            id: BeneficiaryId::new(),
            batch_id,
            member_type_id: input.member_type_id,
            number_of_members: input.number_of_members,
            ratio: input.ratio,
        };
        Repository::<AdditionalBeneficiary>::create(&self.store, tx, &row).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await?;
        Ok(row)
    }

    async fn update_beneficiary_tx(
        &self,
        tx: &mut Tx<S>,
        beneficiary_id: BeneficiaryId,
        input: BeneficiaryInput,
        user: UserId,
    ) -> Result<AdditionalBeneficiary, EngineError> {
        input.validate()?;
        let mut row: AdditionalBeneficiary = self.fetch(tx, beneficiary_id).await?;
        let mut batch = self.lock_draft_distribution(tx, row.batch_id).await?;
        row.member_type_id = input.member_type_id;
        row.number_of_members = input.number_of_members;
        row.ratio = input.ratio;
        Repository::<AdditionalBeneficiary>::update(&self.store, tx, &row).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await?;
        Ok(row)
    }

    async fn delete_beneficiary_tx(
        &self,
        tx: &mut Tx<S>,
        beneficiary_id: BeneficiaryId,
        user: UserId,
    ) -> Result<(), EngineError> {
        let row: AdditionalBeneficiary = self.fetch(tx, beneficiary_id).await?;
        let mut batch = self.lock_draft_distribution(tx, row.batch_id).await?;
        Repository::<AdditionalBeneficiary>::delete(&self.store, tx, beneficiary_id).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await
    }

    async fn add_amount_row_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        input: AmountRowInput,
        user: UserId,
    ) -> Result<AmountTableRow, EngineError> {
        let mut batch = self.lock_draft_distribution(tx, batch_id).await?;
        let row = AmountTableRow {
            id: AmountRowId::new(),
            batch_id,
            month_from: input.month_from,
            month_to: input.month_to,
            amount: input.amount,
        };
        Repository::<AmountTableRow>::create(&self.store, tx, &row).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await?;
        Ok(row)
    }

    async fn update_amount_row_tx(
        &self,
        tx: &mut Tx<S>,
        row_id: AmountRowId,
        input: AmountRowInput,
        user: UserId,
    ) -> Result<AmountTableRow, EngineError> {
        let mut row: AmountTableRow = self.fetch(tx, row_id).await?;
        let mut batch = self.lock_draft_distribution(tx, row.batch_id).await?;
        row.month_from = input.month_from;
        row.month_to = input.month_to;
        row.amount = input.amount;
        Repository::<AmountTableRow>::update(&self.store, tx, &row).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await?;
        Ok(row)
    }

    async fn delete_amount_row_tx(
        &self,
        tx: &mut Tx<S>,
        row_id: AmountRowId,
        user: UserId,
    ) -> Result<(), EngineError> {
        let row: AmountTableRow = self.fetch(tx, row_id).await?;
        let mut batch = self.lock_draft_distribution(tx, row.batch_id).await?;
        Repository::<AmountTableRow>::delete(&self.store, tx, row_id).await?;
        self.recompute_distribution(tx, &mut batch, user, Unresolved::Clear)
            .await
    }

    async fn print_distribution_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        user: UserId,
    ) -> Result<DistributionBatch, EngineError> {
        let mut batch: DistributionBatch = self.lock(tx, batch_id).await?;
        let now = Utc::now();
        let printed = batch.lifecycle.print(user, now)?;
        if self.distribution_entries(tx, batch_id).await?.is_empty() {
            return Err(EngineError::NothingToPrint);
        }
        batch.lifecycle = printed;
        batch.updated_at = now;
        batch.updated_by = user;
        Repository::<DistributionBatch>::update(&self.store, tx, &batch).await?;
        Ok(batch)
    }

    async fn transition_distribution<F>(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        user: UserId,
        step: F,
    ) -> Result<DistributionBatch, EngineError>
    where
        F: FnOnce(&Lifecycle, DateTime<Utc>) -> Result<Lifecycle, StateConflict> + Send,
    {
        let mut batch: DistributionBatch = self.lock(tx, batch_id).await?;
        let now = Utc::now();
        batch.lifecycle = step(&batch.lifecycle, now)?;
        batch.updated_at = now;
        batch.updated_by = user;
        Repository::<DistributionBatch>::update(&self.store, tx, &batch).await?;
        Ok(batch)
    }

    async fn post_distribution_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
        params: &PostParams,
        user: UserId,
    ) -> Result<PostingReceipt, EngineError> {
        let mut batch: DistributionBatch = self.lock(tx, batch_id).await?;
        let now = Utc::now();
        batch.lifecycle = batch.lifecycle.post(user, now)?;

        let entries = self.distribution_entries(tx, batch_id).await?;
        let plan = PostingPlanner::distribution(&batch, &entries, params, user, now);
        let receipt = self.write_plan(tx, plan, batch_id.into_inner(), now).await?;

        batch.post_account_id = Some(params.post_account_id);
        batch.check_voucher_number = params.voucher().map(str::to_owned);
        batch.updated_at = now;
        batch.updated_by = user;
        Repository::<DistributionBatch>::update(&self.store, tx, &batch).await?;
        Ok(receipt)
    }

    async fn distribution_view_tx(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
    ) -> Result<DistributionView, EngineError> {
        let batch: DistributionBatch = self.fetch(tx, batch_id).await?;
        let (beneficiaries, amount_table) = self.distribution_inputs(tx, batch_id).await?;
        let entries = self.distribution_entries(tx, batch_id).await?;
        Ok(DistributionView {
            batch,
            beneficiaries,
            amount_table,
            entries,
        })
    }

    async fn lock_draft_distribution(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
    ) -> Result<DistributionBatch, EngineError> {
        let batch: DistributionBatch = self.lock(tx, batch_id).await?;
        batch.lifecycle.require(BatchState::Draft)?;
        Ok(batch)
    }

    /// Rebuilds the shares of a locked Draft batch from its stored inputs
    /// and saves the header.
    async fn recompute_distribution(
        &self,
        tx: &mut Tx<S>,
        batch: &mut DistributionBatch,
        user: UserId,
        unresolved: Unresolved,
    ) -> Result<(), EngineError> {
        let profile: MemberProfile = self.fetch(tx, batch.member_profile_id).await?;
        let (groups, bands) = self.distribution_inputs(tx, batch.id).await?;
        let beneficiaries: Vec<BeneficiaryInput> =
            groups.iter().map(AdditionalBeneficiary::input).collect();
        let amount_table: Vec<AmountRowInput> = bands.iter().map(AmountTableRow::input).collect();
        validate_table(&amount_table)?;

        let request = DistributionRequest {
            computation_type: batch.computation_type,
            amount: batch.amount,
            membership_date: profile.membership_date,
            date_of_death: batch.date_of_death,
            computation_date: batch.computation_date,
            beneficiaries: &beneficiaries,
            amount_table: &amount_table,
        };

        Repository::<DistributionEntry>::delete_where(
            &self.store,
            tx,
            &BatchChildFilter::batch(batch.id),
        )
        .await?;

        match DistributionGenerator::compute(&request, self.scale) {
            Ok(computation) => {
                let group_ids: Vec<BeneficiaryId> = groups.iter().map(|g| g.id).collect();
                self.stage_distribution_entries(tx, batch, &group_ids, &computation.lines)
                    .await?;
                batch.total_amount = computation.total;
            }
            Err(DistributionError::NoMatchingRow { months }) if unresolved == Unresolved::Clear => {
                debug!(
                    batch_id = %batch.id,
                    months,
                    "Amount table does not cover member; shares cleared"
                );
                batch.total_amount = Decimal::ZERO;
            }
            Err(err) => return Err(err.into()),
        }

        batch.updated_at = Utc::now();
        batch.updated_by = user;
        Repository::<DistributionBatch>::update(&self.store, tx, batch).await?;
        Ok(())
    }

    async fn distribution_inputs(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
    ) -> Result<(Vec<AdditionalBeneficiary>, Vec<AmountTableRow>), EngineError> {
        let filter = BatchChildFilter::batch(batch_id);
        let mut groups = Repository::<AdditionalBeneficiary>::find(&self.store, tx, &filter).await?;
        groups.sort_by_key(|g| g.id);
        let mut bands = Repository::<AmountTableRow>::find(&self.store, tx, &filter).await?;
        bands.sort_by_key(|b| (b.month_from, b.id));
        Ok((groups, bands))
    }

    async fn distribution_entries(
        &self,
        tx: &mut Tx<S>,
        batch_id: DistributionBatchId,
    ) -> Result<Vec<DistributionEntry>, EngineError> {
        let filter = BatchChildFilter::batch(batch_id);
        let mut entries = Repository::<DistributionEntry>::find(&self.store, tx, &filter).await?;
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }

    async fn stage_distribution_entries(
        &self,
        tx: &mut Tx<S>,
        batch: &DistributionBatch,
        group_ids: &[BeneficiaryId],
        lines: &[DistributionLine],
    ) -> Result<(), EngineError> {
        for (position, line) in (0u32..).zip(lines) {
            let recipient = match line.recipient {
                LineRecipient::Primary => Recipient::Primary {
                    member_profile_id: batch.member_profile_id,
                },
                LineRecipient::Beneficiary { group, ordinal } => Recipient::Beneficiary {
                    beneficiary_id: group_ids
                        .get(group)
                        .copied()
                        .ok_or_else(|| EngineError::not_found("beneficiary", group))?,
                    ordinal,
                },
            };
            let entry = DistributionEntry {
                id: DistributionEntryId::new(),
                batch_id: batch.id,
                position,
                recipient,
                amount: line.amount,
            };
            Repository::<DistributionEntry>::create(&self.store, tx, &entry).await?;
        }
        Ok(())
    }
}
