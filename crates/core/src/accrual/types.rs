//! Accrual batch domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecoop_shared::types::{
    AccountId, AccrualBatchId, AccrualEntryId, BranchId, MemberProfileId, MemberTypeId,
    OrganizationId, UserId,
};

use crate::lifecycle::{BatchState, Lifecycle};

use super::error::AccrualError;

/// Which balance the interest is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceBasis {
    /// Balance as of the last computation date.
    #[default]
    Opening,
    /// Balance as of the new computation date.
    Ending,
    /// Lowest end-of-day balance inside the window.
    LowestDaily,
    /// Average end-of-day balance inside the window.
    AverageDaily,
}

impl BalanceBasis {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Ending => "ending",
            Self::LowestDaily => "lowest_daily",
            Self::AverageDaily => "average_daily",
        }
    }
}

impl std::str::FromStr for BalanceBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opening" => Ok(Self::Opening),
            "ending" => Ok(Self::Ending),
            "lowest_daily" => Ok(Self::LowestDaily),
            "average_daily" => Ok(Self::AverageDaily),
            _ => Err(format!("Unknown balance basis: {s}")),
        }
    }
}

/// Request for an accrual run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualParams {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Branch scope.
    pub branch_id: BranchId,
    /// Operator-facing document number.
    pub document_no: String,
    /// Window start, exclusive.
    pub last_computation_date: NaiveDate,
    /// Window end, inclusive.
    pub new_computation_date: NaiveDate,
    /// Only this general ledger account.
    pub account_id: Option<AccountId>,
    /// Only members of this type.
    pub member_type_id: Option<MemberTypeId>,
    /// Also accrue on closed accounts.
    pub include_closed_account: bool,
    /// Accrue even where a posted batch already covers the window.
    pub include_existing_computed_interest: bool,
    /// Withholding tax rate; the branch default applies when absent.
    pub interest_tax_rate: Option<Decimal>,
    /// Balance the interest is computed on.
    pub balance_basis: BalanceBasis,
}

impl AccrualParams {
    /// Whole days in the window.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.new_computation_date - self.last_computation_date).num_days()
    }

    /// Validates the window and the resolved tax rate.
    pub fn validate(&self, interest_tax_rate: Decimal) -> Result<(), AccrualError> {
        if self.days() <= 0 {
            return Err(AccrualError::InvalidWindow {
                last: self.last_computation_date,
                new: self.new_computation_date,
            });
        }
        if interest_tax_rate.is_sign_negative() || interest_tax_rate > Decimal::ONE {
            return Err(AccrualError::TaxRateOutOfRange(interest_tax_rate));
        }
        Ok(())
    }
}

/// Header of a savings-interest accrual batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualBatch {
    /// Unique identifier.
    pub id: AccrualBatchId,
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Branch scope.
    pub branch_id: BranchId,
    /// Operator-facing document number.
    pub document_no: String,
    /// Window start, exclusive.
    pub last_computation_date: NaiveDate,
    /// Window end, inclusive.
    pub new_computation_date: NaiveDate,
    /// Account filter used for generation.
    pub account_id: Option<AccountId>,
    /// Member type filter used for generation.
    pub member_type_id: Option<MemberTypeId>,
    /// Closed accounts were included.
    pub include_closed_account: bool,
    /// Already-computed accounts were included.
    pub include_existing_computed_interest: bool,
    /// Balance the interest was computed on.
    pub balance_basis: BalanceBasis,
    /// Resolved withholding tax rate.
    pub interest_tax_rate: Decimal,
    /// Resolved day-count divisor.
    pub annual_divisor: u32,
    /// Sum of entry interest amounts.
    pub total_interest: Decimal,
    /// Sum of entry tax amounts.
    pub total_tax: Decimal,
    /// Print and post stamps.
    pub lifecycle: Lifecycle,
    /// Contra account recorded at post time.
    pub post_account_id: Option<AccountId>,
    /// Check voucher recorded at post time.
    pub check_voucher_number: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Creating operator.
    pub created_by: UserId,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Last updating operator.
    pub updated_by: UserId,
}

impl AccrualBatch {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BatchState {
        self.lifecycle.state()
    }

    /// The request this batch was generated from, with the tax rate pinned.
    #[must_use]
    pub fn params(&self) -> AccrualParams {
        AccrualParams {
            organization_id: self.organization_id,
            branch_id: self.branch_id,
            document_no: self.document_no.clone(),
            last_computation_date: self.last_computation_date,
            new_computation_date: self.new_computation_date,
            account_id: self.account_id,
            member_type_id: self.member_type_id,
            include_closed_account: self.include_closed_account,
            include_existing_computed_interest: self.include_existing_computed_interest,
            interest_tax_rate: Some(self.interest_tax_rate),
            balance_basis: self.balance_basis,
        }
    }

    /// Returns true if the batch window shares at least one day with `(last, new]`.
    #[must_use]
    pub fn overlaps(&self, last: NaiveDate, new: NaiveDate) -> bool {
        self.last_computation_date < new && last < self.new_computation_date
    }
}

/// Filter for accrual batch lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualBatchFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Branch scope.
    pub branch_id: Option<BranchId>,
    /// Lifecycle state.
    pub state: Option<BatchState>,
    /// Window that must overlap the batch window.
    pub overlapping: Option<(NaiveDate, NaiveDate)>,
}

impl AccrualBatchFilter {
    /// Returns true if the batch passes the filter.
    #[must_use]
    pub fn matches(&self, batch: &AccrualBatch) -> bool {
        self.organization_id.is_none_or(|id| batch.organization_id == id)
            && self.branch_id.is_none_or(|id| batch.branch_id == id)
            && self.state.is_none_or(|state| batch.state() == state)
            && self
                .overlapping
                .is_none_or(|(last, new)| batch.overlaps(last, new))
    }
}

/// One computed interest line, before it belongs to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualLine {
    /// Savings general ledger account.
    pub account_id: AccountId,
    /// Account holder.
    pub member_profile_id: MemberProfileId,
    /// Balance the interest was computed on.
    pub principal_basis: Decimal,
    /// Balance at window end plus net interest.
    pub ending_balance: Decimal,
    /// Annual rate applied.
    pub interest_rate: Decimal,
    /// Interest earned; negative when a below-minimum charge applies.
    pub interest_amount: Decimal,
    /// Withholding tax on the interest.
    pub interest_tax: Decimal,
}

/// Staged interest line belonging to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualEntry {
    /// Unique identifier.
    pub id: AccrualEntryId,
    /// Owning batch.
    pub batch_id: AccrualBatchId,
    /// Savings general ledger account.
    pub account_id: AccountId,
    /// Account holder.
    pub member_profile_id: MemberProfileId,
    /// Balance the interest was computed on.
    pub principal_basis: Decimal,
    /// Balance at window end plus net interest.
    pub ending_balance: Decimal,
    /// Annual rate applied.
    pub interest_rate: Decimal,
    /// Interest earned; negative when a below-minimum charge applies.
    pub interest_amount: Decimal,
    /// Withholding tax on the interest.
    pub interest_tax: Decimal,
}

impl AccrualEntry {
    /// Attaches a computed line to a batch.
    #[must_use]
    pub fn from_line(batch_id: AccrualBatchId, line: &AccrualLine) -> Self {
        Self {
            id: AccrualEntryId::new(),
            batch_id,
            account_id: line.account_id,
            member_profile_id: line.member_profile_id,
            principal_basis: line.principal_basis,
            ending_balance: line.ending_balance,
            interest_rate: line.interest_rate,
            interest_amount: line.interest_amount,
            interest_tax: line.interest_tax,
        }
    }
}

/// Filter for accrual entry lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualEntryFilter {
    /// Owning batch.
    pub batch_id: Option<AccrualBatchId>,
    /// Savings general ledger account.
    pub account_id: Option<AccountId>,
}

impl AccrualEntryFilter {
    /// Every entry of one batch.
    #[must_use]
    pub fn batch(batch_id: AccrualBatchId) -> Self {
        Self {
            batch_id: Some(batch_id),
            account_id: None,
        }
    }

    /// Returns true if the entry passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &AccrualEntry) -> bool {
        self.batch_id.is_none_or(|id| entry.batch_id == id)
            && self.account_id.is_none_or(|id| entry.account_id == id)
    }
}

/// Independent interest and tax sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccrualTotals {
    /// Sum of interest amounts.
    pub total_interest: Decimal,
    /// Sum of tax amounts.
    pub total_tax: Decimal,
}

impl AccrualTotals {
    /// Sums interest and tax over computed lines, or `None` on overflow.
    pub fn from_lines<'a, I>(lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a AccrualLine>,
    {
        lines.into_iter().try_fold(Self::default(), |acc, line| {
            Some(Self {
                total_interest: acc.total_interest.checked_add(line.interest_amount)?,
                total_tax: acc.total_tax.checked_add(line.interest_tax)?,
            })
        })
    }

    /// Sums interest and tax over staged entries.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a AccrualEntry>,
    {
        entries.into_iter().fold(Self::default(), |acc, entry| Self {
            total_interest: acc.total_interest + entry.interest_amount,
            total_tax: acc.total_tax + entry.interest_tax,
        })
    }
}

/// Result of a (preview or persisted) accrual computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualComputation {
    /// Day-count divisor used.
    pub annual_divisor: u32,
    /// Tax rate used.
    pub interest_tax_rate: Decimal,
    /// Whole days in the window.
    pub days: i64,
    /// One line per eligible account.
    pub lines: Vec<AccrualLine>,
    /// Interest and tax sums.
    pub totals: AccrualTotals,
}
