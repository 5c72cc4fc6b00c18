//! Posting plans: the ledger rows a batch turns into.
//!
//! A plan is built completely in memory and checked for balance before the
//! engine writes a single row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ecoop_shared::types::{
    AccountId, BranchId, LedgerEntryId, MemberProfileId, OrganizationId, UserId,
};

use crate::accrual::{AccrualBatch, AccrualEntry};
use crate::distribution::{DistributionBatch, DistributionEntry, Recipient};
use crate::ledger::{EntrySource, LedgerEntry};

use super::params::PostParams;

/// Errors raised while building or checking a posting plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostingError {
    /// Plan debits and credits differ.
    #[error("Posting plan is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedPlan {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A row must carry exactly one positive side.
    #[error("Ledger row for account {account_id} must have exactly one positive side")]
    InvalidRow {
        /// The account of the malformed row.
        account_id: AccountId,
    },
}

impl PostingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnbalancedPlan { .. } => "UNBALANCED_PLAN",
            Self::InvalidRow { .. } => "INVALID_LEDGER_ROW",
        }
    }
}

/// Debit and credit sums of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl PlanTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Ledger rows ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingPlan {
    entries: Vec<LedgerEntry>,
}

impl PostingPlan {
    /// Wraps prepared rows.
    #[must_use]
    pub const fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Rows in write order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Consumes the plan.
    #[must_use]
    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    /// Debit and credit sums.
    #[must_use]
    pub fn totals(&self) -> PlanTotals {
        let (debit, credit) = self
            .entries
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), e| (d + e.debit, c + e.credit));
        PlanTotals::new(debit, credit)
    }

    /// Fails on a malformed row or unequal totals.
    pub fn ensure_balanced(&self) -> Result<PlanTotals, PostingError> {
        if let Some(bad) = self.entries.iter().find(|e| e.side().is_none()) {
            return Err(PostingError::InvalidRow {
                account_id: bad.account_id,
            });
        }
        let totals = self.totals();
        if totals.is_balanced {
            Ok(totals)
        } else {
            Err(PostingError::UnbalancedPlan {
                debit: totals.debit,
                credit: totals.credit,
            })
        }
    }
}

/// Shared columns of every row a batch produces.
struct RowFactory<'a> {
    organization_id: OrganizationId,
    branch_id: BranchId,
    reference_batch_id: Uuid,
    source: EntrySource,
    params: &'a PostParams,
    posted_by: UserId,
    posted_at: DateTime<Utc>,
}

impl RowFactory<'_> {
    fn row(
        &self,
        account_id: AccountId,
        member_profile_id: Option<MemberProfileId>,
        debit: Decimal,
        credit: Decimal,
        description: String,
    ) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            organization_id: self.organization_id,
            branch_id: self.branch_id,
            account_id,
            member_profile_id,
            employee_user_id: Some(self.posted_by),
            debit,
            credit,
            source: self.source,
            type_of_payment: self.params.payment_type(),
            transaction_id: None,
            transaction_batch_id: None,
            reference_batch_id: Some(self.reference_batch_id),
            entry_date: self
                .params
                .entry_date
                .unwrap_or_else(|| self.posted_at.date_naive()),
            check_voucher_number: self.params.voucher().map(str::to_owned),
            description,
            created_at: self.posted_at,
        }
    }

    fn debit(
        &self,
        account_id: AccountId,
        member: Option<MemberProfileId>,
        amount: Decimal,
        description: String,
    ) -> LedgerEntry {
        self.row(account_id, member, amount, Decimal::ZERO, description)
    }

    fn credit(
        &self,
        account_id: AccountId,
        member: Option<MemberProfileId>,
        amount: Decimal,
        description: String,
    ) -> LedgerEntry {
        self.row(account_id, member, Decimal::ZERO, amount, description)
    }
}

/// Builds posting plans from staged batch entries.
pub struct PostingPlanner;

impl PostingPlanner {
    /// Rows for an accrual batch.
    ///
    /// Interest credits the member's savings and debits the post account; a
    /// negative amount (below-minimum charge) flips both sides. Withheld tax
    /// debits the member and credits the tax account. Zero amounts produce no row.
    #[must_use]
    pub fn accrual(
        batch: &AccrualBatch,
        entries: &[AccrualEntry],
        params: &PostParams,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> PostingPlan {
        let rows = RowFactory {
            organization_id: batch.organization_id,
            branch_id: batch.branch_id,
            reference_batch_id: batch.id.into_inner(),
            source: EntrySource::SavingsInterest,
            params,
            posted_by,
            posted_at,
        };
        let post = params.post_account_id;
        let mut out = Vec::with_capacity(entries.len() * 4);

        for entry in entries {
            let member = Some(entry.member_profile_id);
            let interest = entry.interest_amount;

            if interest > Decimal::ZERO {
                let text = format!("Savings interest {}", batch.document_no);
                out.push(rows.credit(entry.account_id, member, interest, text.clone()));
                out.push(rows.debit(post, None, interest, text));
            } else if interest < Decimal::ZERO {
                let text = format!("Below-minimum charge {}", batch.document_no);
                out.push(rows.debit(entry.account_id, member, -interest, text.clone()));
                out.push(rows.credit(post, None, -interest, text));
            }

            if entry.interest_tax > Decimal::ZERO {
                let text = format!("Withholding tax {}", batch.document_no);
                out.push(rows.debit(entry.account_id, member, entry.interest_tax, text.clone()));
                out.push(rows.credit(params.tax_account(), None, entry.interest_tax, text));
            }
        }
        PostingPlan::new(out)
    }

    /// Rows for a distribution batch.
    ///
    /// Each positive share debits the post account and credits the payout
    /// account (the batch account, else the post account).
    #[must_use]
    pub fn distribution(
        batch: &DistributionBatch,
        entries: &[DistributionEntry],
        params: &PostParams,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> PostingPlan {
        let rows = RowFactory {
            organization_id: batch.organization_id,
            branch_id: batch.branch_id,
            reference_batch_id: batch.id.into_inner(),
            source: EntrySource::MutualFund,
            params,
            posted_by,
            posted_at,
        };
        let post = params.post_account_id;
        let payout = batch.account_id.unwrap_or(post);
        let mut out = Vec::with_capacity(entries.len() * 2);

        for entry in entries.iter().filter(|e| e.amount > Decimal::ZERO) {
            let (member, text) = match entry.recipient {
                Recipient::Primary { member_profile_id } => {
                    (Some(member_profile_id), format!("{} - primary", batch.name))
                }
                Recipient::Beneficiary { ordinal, .. } => {
                    (None, format!("{} - beneficiary {ordinal}", batch.name))
                }
            };
            out.push(rows.debit(post, None, entry.amount, text.clone()));
            out.push(rows.credit(payout, member, entry.amount, text));
        }
        PostingPlan::new(out)
    }
}
