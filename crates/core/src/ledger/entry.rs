//! Ledger entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ecoop_shared::types::{
    AccountId, BranchId, LedgerEntryId, MemberProfileId, OrganizationId, TransactionBatchId,
    TransactionId, UserId,
};

/// Side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

/// Business origin of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Loan or share payment.
    Payment,
    /// Savings withdrawal.
    Withdraw,
    /// Savings deposit.
    Deposit,
    /// General journal.
    Journal,
    /// Manual adjustment.
    Adjustment,
    /// Journal voucher.
    JournalVoucher,
    /// Check voucher.
    CheckVoucher,
    /// Posted savings-interest accrual batch.
    SavingsInterest,
    /// Posted mutual-fund distribution batch.
    MutualFund,
}

impl EntrySource {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Withdraw => "withdraw",
            Self::Deposit => "deposit",
            Self::Journal => "journal",
            Self::Adjustment => "adjustment",
            Self::JournalVoucher => "journal_voucher",
            Self::CheckVoucher => "check_voucher",
            Self::SavingsInterest => "savings_interest",
            Self::MutualFund => "mutual_fund",
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntrySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "withdraw" => Ok(Self::Withdraw),
            "deposit" => Ok(Self::Deposit),
            "journal" => Ok(Self::Journal),
            "adjustment" => Ok(Self::Adjustment),
            "journal_voucher" => Ok(Self::JournalVoucher),
            "check_voucher" => Ok(Self::CheckVoucher),
            "savings_interest" => Ok(Self::SavingsInterest),
            "mutual_fund" => Ok(Self::MutualFund),
            _ => Err(format!("Unknown entry source: {s}")),
        }
    }
}

/// How the money physically moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Cash over the counter.
    Cash,
    /// Check, identified by a voucher number.
    Check,
    /// Online transfer.
    Online,
}

impl PaymentType {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::Online => "online",
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "check" => Ok(Self::Check),
            "online" => Ok(Self::Online),
            _ => Err(format!("Unknown payment type: {s}")),
        }
    }
}

/// A single posted double-entry record.
///
/// Rows are append-only: the engine creates them while posting a batch and
/// never updates or deletes them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// General ledger account affected.
    pub account_id: AccountId,
    /// Member whose sub-ledger this row belongs to, if any.
    pub member_profile_id: Option<MemberProfileId>,
    /// Operator who caused the row.
    pub employee_user_id: Option<UserId>,
    /// Debit amount (zero on credit rows).
    pub debit: Decimal,
    /// Credit amount (zero on debit rows).
    pub credit: Decimal,
    /// Business origin.
    pub source: EntrySource,
    /// Payment medium.
    pub type_of_payment: PaymentType,
    /// Teller transaction, when the row came from one.
    pub transaction_id: Option<TransactionId>,
    /// Teller transaction batch, when the row came from one.
    pub transaction_batch_id: Option<TransactionBatchId>,
    /// Accrual or distribution batch that produced the row.
    pub reference_batch_id: Option<Uuid>,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Check voucher number for check payments.
    pub check_voucher_number: Option<String>,
    /// Free-form narration.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns which side carries the amount, or `None` when the row is malformed
    /// (both sides zero, both sides set, or a negative side).
    #[must_use]
    pub fn side(&self) -> Option<EntrySide> {
        if self.debit.is_sign_negative() || self.credit.is_sign_negative() {
            return None;
        }
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (false, true) => Some(EntrySide::Debit),
            (true, false) => Some(EntrySide::Credit),
            _ => None,
        }
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}
