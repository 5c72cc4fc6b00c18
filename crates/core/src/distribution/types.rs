//! Fund distribution domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecoop_shared::types::{
    AccountId, AmountRowId, BeneficiaryId, BranchId, DistributionBatchId, DistributionEntryId,
    MemberProfileId, MemberTypeId, OrganizationId, UserId,
};

use crate::lifecycle::{BatchState, Lifecycle};

use super::error::DistributionError;

/// How the distributable principal is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationType {
    /// The batch amount is distributed as is.
    #[default]
    Flat,
    /// The amount comes from the table row matching elapsed membership months.
    TableLookup,
}

impl ComputationType {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::TableLookup => "table_lookup",
        }
    }
}

impl std::str::FromStr for ComputationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "table_lookup" => Ok(Self::TableLookup),
            _ => Err(format!("Unknown computation type: {s}")),
        }
    }
}

/// A group of co-beneficiaries sharing one ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryInput {
    /// Member type of the group.
    pub member_type_id: MemberTypeId,
    /// Individuals in the group.
    pub number_of_members: u32,
    /// Weight of each individual.
    pub ratio: Decimal,
}

impl BeneficiaryInput {
    /// Rejects empty groups and non-positive ratios.
    pub fn validate(&self) -> Result<(), DistributionError> {
        if self.number_of_members == 0 {
            return Err(DistributionError::EmptyBeneficiaryGroup);
        }
        if self.ratio <= Decimal::ZERO {
            return Err(DistributionError::InvalidRatio(self.ratio));
        }
        Ok(())
    }

    /// Weight of the whole group (`ratio * number_of_members`).
    pub fn units(&self) -> Result<Decimal, DistributionError> {
        self.ratio
            .checked_mul(Decimal::from(self.number_of_members))
            .ok_or(DistributionError::AmountOverflow)
    }
}

/// An age band of the amount table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRowInput {
    /// Lower bound in months, inclusive.
    pub month_from: u32,
    /// Upper bound in months, inclusive.
    pub month_to: u32,
    /// Principal for members in the band.
    pub amount: Decimal,
}

/// Request to create a distribution batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInput {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Branch scope.
    pub branch_id: BranchId,
    /// Primary (deceased or claiming) member.
    pub member_profile_id: MemberProfileId,
    /// Primary member's type.
    pub member_type_id: Option<MemberTypeId>,
    /// Batch title.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Principal for flat batches.
    pub amount: Decimal,
    /// Flat or table lookup.
    pub computation_type: ComputationType,
    /// End of membership for table lookup, when known.
    pub date_of_death: Option<NaiveDate>,
    /// Marks extension-only funds.
    pub extension_only: bool,
    /// Payout account credited at post time.
    pub account_id: Option<AccountId>,
    /// Date the computation refers to.
    pub computation_date: NaiveDate,
    /// Co-beneficiary groups.
    pub beneficiaries: Vec<BeneficiaryInput>,
    /// Age bands for table lookup.
    pub amount_table: Vec<AmountRowInput>,
}

/// Header of a mutual-fund distribution batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBatch {
    /// Unique identifier.
    pub id: DistributionBatchId,
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Branch scope.
    pub branch_id: BranchId,
    /// Primary member.
    pub member_profile_id: MemberProfileId,
    /// Primary member's type.
    pub member_type_id: Option<MemberTypeId>,
    /// Batch title.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Principal for flat batches.
    pub amount: Decimal,
    /// Flat or table lookup.
    pub computation_type: ComputationType,
    /// End of membership for table lookup.
    pub date_of_death: Option<NaiveDate>,
    /// Marks extension-only funds.
    pub extension_only: bool,
    /// Payout account.
    pub account_id: Option<AccountId>,
    /// Date the computation refers to.
    pub computation_date: NaiveDate,
    /// Sum of computed entries.
    pub total_amount: Decimal,
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

impl DistributionBatch {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BatchState {
        self.lifecycle.state()
    }
}

/// Filter for distribution batch lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionBatchFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Branch scope.
    pub branch_id: Option<BranchId>,
    /// Primary member.
    pub member_profile_id: Option<MemberProfileId>,
    /// Lifecycle state.
    pub state: Option<BatchState>,
}

impl DistributionBatchFilter {
    /// Returns true if the batch passes the filter.
    #[must_use]
    pub fn matches(&self, batch: &DistributionBatch) -> bool {
        self.organization_id.is_none_or(|id| batch.organization_id == id)
            && self.branch_id.is_none_or(|id| batch.branch_id == id)
            && self.member_profile_id.is_none_or(|id| batch.member_profile_id == id)
            && self.state.is_none_or(|state| batch.state() == state)
    }
}

/// Persisted co-beneficiary group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalBeneficiary {
    /// Unique identifier.
    pub id: BeneficiaryId,
    /// Owning batch.
    pub batch_id: DistributionBatchId,
    /// Member type of the group.
    pub member_type_id: MemberTypeId,
    /// Individuals in the group.
    pub number_of_members: u32,
    /// Weight of each individual.
    pub ratio: Decimal,
}

impl AdditionalBeneficiary {
    /// The group as computation input.
    #[must_use]
    pub fn input(&self) -> BeneficiaryInput {
        BeneficiaryInput {
            member_type_id: self.member_type_id,
            number_of_members: self.number_of_members,
            ratio: self.ratio,
        }
    }
}

/// Persisted amount table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountTableRow {
    /// Unique identifier.
    pub id: AmountRowId,
    /// Owning batch.
    pub batch_id: DistributionBatchId,
    /// Lower bound in months, inclusive.
    pub month_from: u32,
    /// Upper bound in months, inclusive.
    pub month_to: u32,
    /// Principal for members in the band.
    pub amount: Decimal,
}

impl AmountTableRow {
    /// The row as computation input.
    #[must_use]
    pub fn input(&self) -> AmountRowInput {
        AmountRowInput {
            month_from: self.month_from,
            month_to: self.month_to,
            amount: self.amount,
        }
    }
}

/// Filter for child rows of one distribution batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchChildFilter {
    /// Owning batch.
    pub batch_id: Option<DistributionBatchId>,
}

impl BatchChildFilter {
    /// Every child row of one batch.
    #[must_use]
    pub const fn batch(batch_id: DistributionBatchId) -> Self {
        Self {
            batch_id: Some(batch_id),
        }
    }

    /// Returns true if `batch_id` passes the filter.
    #[must_use]
    pub fn matches(&self, batch_id: DistributionBatchId) -> bool {
        self.batch_id.is_none_or(|id| id == batch_id)
    }
}

/// Recipient of a persisted distribution entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipient {
    /// The primary member; absorbs rounding.
    Primary {
        /// Primary member.
        member_profile_id: MemberProfileId,
    },
    /// One individual of a beneficiary group.
    Beneficiary {
        /// Group the individual belongs to.
        beneficiary_id: BeneficiaryId,
        /// 1-based position inside the group.
        ordinal: u32,
    },
}

/// Persisted computed share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Unique identifier.
    pub id: DistributionEntryId,
    /// Owning batch.
    pub batch_id: DistributionBatchId,
    /// Display order, primary first.
    pub position: u32,
    /// Who receives the share.
    pub recipient: Recipient,
    /// Share amount.
    pub amount: Decimal,
}

/// Recipient of a computed line, before groups have identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineRecipient {
    /// The primary member.
    Primary,
    /// Individual `ordinal` (1-based) of the group at index `group`.
    Beneficiary {
        /// Index into the beneficiary list.
        group: usize,
        /// 1-based position inside the group.
        ordinal: u32,
    },
}

/// One computed share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLine {
    /// Who receives the share.
    pub recipient: LineRecipient,
    /// Share amount.
    pub amount: Decimal,
}

/// Result of a distribution computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionComputation {
    /// Resolved principal `D`.
    pub principal: Decimal,
    /// Elapsed membership months, for table lookups.
    pub elapsed_months: Option<u32>,
    /// Primary line first, then each group's individuals in order.
    pub lines: Vec<DistributionLine>,
    /// Sum of all lines; always equals `principal`.
    pub total: Decimal,
}
