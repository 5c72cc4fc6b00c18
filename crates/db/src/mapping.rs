//! Conversions between `SeaORM` models and engine records.
//!
//! Enums are stored as their `as_str` text, counts as `INTEGER`, timestamps
//! as `TIMESTAMPTZ`. A stored value the engine cannot represent surfaces as
//! [`StoreError::Corrupt`] instead of a panic.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use ecoop_core::StoreError;
use ecoop_core::accrual::{AccrualBatch, AccrualEntry};
use ecoop_core::distribution::{
    AdditionalBeneficiary, AmountTableRow, DistributionBatch, DistributionEntry, Recipient,
};
use ecoop_core::ledger::LedgerEntry;
use ecoop_core::lifecycle::Lifecycle;
use ecoop_core::reference::{
    BranchSettings, DateRate, MemberProfile, RateTier, SavingsAccount, YearRate,
};
use ecoop_shared::types::{
    AccountId, AccrualBatchId, AccrualEntryId, AmountRowId, BeneficiaryId, BranchId,
    DistributionBatchId, DistributionEntryId, LedgerEntryId, MemberProfileId, MemberTypeId,
    OrganizationId, SavingsAccountId, TransactionBatchId, TransactionId, UserId,
};

use crate::entities::{
    accrual_batches, accrual_entries, branch_settings, distribution_amount_rows,
    distribution_batches, distribution_beneficiaries, distribution_entries, ledger_entries,
    member_profiles, savings_account_date_rates, savings_account_rate_tiers,
    savings_account_year_rates, savings_accounts,
};

const PRIMARY: &str = "primary";
const BENEFICIARY: &str = "beneficiary";

/// A record stored as exactly one row of one table.
pub trait Mapped: Sized {
    /// Row read from the table.
    type Model;
    /// Row written to the table.
    type ActiveModel;

    /// Converts a stored row.
    fn from_model(model: Self::Model) -> Result<Self, StoreError>;

    /// Builds a fully set row for insert or update.
    fn to_active(&self) -> Result<Self::ActiveModel, StoreError>;
}

fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn stored(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.into()
}

fn to_u32(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} is negative: {value}")))
}

fn to_i32(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn parse<T: FromStr<Err = String>>(value: &str) -> Result<T, StoreError> {
    value.parse().map_err(StoreError::Corrupt)
}

fn lifecycle(
    printed_by: Option<Uuid>,
    printed_date: Option<DateTimeWithTimeZone>,
    posted_by: Option<Uuid>,
    posted_date: Option<DateTimeWithTimeZone>,
) -> Result<Lifecycle, StoreError> {
    Lifecycle::from_stamps(
        printed_by.map(UserId::from_uuid),
        printed_date.map(utc),
        posted_by.map(UserId::from_uuid),
        posted_date.map(utc),
    )
    .map_err(|e| StoreError::Corrupt(e.to_string()))
}

impl Mapped for LedgerEntry {
    type Model = ledger_entries::Model;
    type ActiveModel = ledger_entries::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: LedgerEntryId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            branch_id: BranchId::from_uuid(m.branch_id),
            account_id: AccountId::from_uuid(m.account_id),
            member_profile_id: m.member_profile_id.map(MemberProfileId::from_uuid),
            employee_user_id: m.employee_user_id.map(UserId::from_uuid),
            debit: m.debit,
            credit: m.credit,
            source: parse(&m.source)?,
            type_of_payment: parse(&m.type_of_payment)?,
            transaction_id: m.transaction_id.map(TransactionId::from_uuid),
            transaction_batch_id: m.transaction_batch_id.map(TransactionBatchId::from_uuid),
            reference_batch_id: m.reference_batch_id,
            entry_date: m.entry_date,
            check_voucher_number: m.check_voucher_number,
            description: m.description,
            created_at: utc(m.created_at),
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(ledger_entries::ActiveModel {
            id: Set(self.id.into_inner()),
            organization_id: Set(self.organization_id.into_inner()),
            branch_id: Set(self.branch_id.into_inner()),
            account_id: Set(self.account_id.into_inner()),
            member_profile_id: Set(self.member_profile_id.map(MemberProfileId::into_inner)),
            employee_user_id: Set(self.employee_user_id.map(UserId::into_inner)),
            debit: Set(self.debit),
            credit: Set(self.credit),
            source: Set(self.source.as_str().to_string()),
            type_of_payment: Set(self.type_of_payment.as_str().to_string()),
            transaction_id: Set(self.transaction_id.map(TransactionId::into_inner)),
            transaction_batch_id: Set(self
                .transaction_batch_id
                .map(TransactionBatchId::into_inner)),
            reference_batch_id: Set(self.reference_batch_id),
            entry_date: Set(self.entry_date),
            check_voucher_number: Set(self.check_voucher_number.clone()),
            description: Set(self.description.clone()),
            created_at: Set(stored(self.created_at)),
        })
    }
}

impl Mapped for BranchSettings {
    type Model = branch_settings::Model;
    type ActiveModel = branch_settings::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            branch_id: BranchId::from_uuid(m.branch_id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            annual_divisor: m
                .annual_divisor
                .map(|d| to_u32(d, "annual_divisor"))
                .transpose()?,
            interest_tax_rate: m.interest_tax_rate,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(branch_settings::ActiveModel {
            branch_id: Set(self.branch_id.into_inner()),
            organization_id: Set(self.organization_id.into_inner()),
            annual_divisor: Set(self
                .annual_divisor
                .map(|d| to_i32(d, "annual_divisor"))
                .transpose()?),
            interest_tax_rate: Set(self.interest_tax_rate),
        })
    }
}

impl Mapped for MemberProfile {
    type Model = member_profiles::Model;
    type ActiveModel = member_profiles::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: MemberProfileId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            branch_id: BranchId::from_uuid(m.branch_id),
            member_type_id: MemberTypeId::from_uuid(m.member_type_id),
            membership_date: m.membership_date,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(member_profiles::ActiveModel {
            id: Set(self.id.into_inner()),
            organization_id: Set(self.organization_id.into_inner()),
            branch_id: Set(self.branch_id.into_inner()),
            member_type_id: Set(self.member_type_id.into_inner()),
            membership_date: Set(self.membership_date),
        })
    }
}

/// Rate band rows of one savings account.
#[derive(Debug, Default)]
pub struct RateRows {
    /// Balance tiers.
    pub tiers: Vec<savings_account_rate_tiers::Model>,
    /// Year bands.
    pub by_year: Vec<savings_account_year_rates::Model>,
    /// Date bands.
    pub by_date: Vec<savings_account_date_rates::Model>,
}

/// Rebuilds a savings account from its row and its rate band rows.
pub fn savings_account_from_models(
    m: savings_accounts::Model,
    rates: RateRows,
) -> Result<SavingsAccount, StoreError> {
    let mut rate_tiers: Vec<RateTier> = rates
        .tiers
        .into_iter()
        .map(|t| RateTier {
            from_balance: t.from_balance,
            to_balance: t.to_balance,
            rate: t.rate,
        })
        .collect();
    rate_tiers.sort_by(|a, b| a.from_balance.cmp(&b.from_balance));

    let mut rates_by_year: Vec<YearRate> = rates
        .by_year
        .into_iter()
        .map(|y| YearRate {
            from_year: y.from_year,
            to_year: y.to_year,
            rate: y.rate,
        })
        .collect();
    rates_by_year.sort_by_key(|band| band.from_year);

    let mut rates_by_date: Vec<DateRate> = rates
        .by_date
        .into_iter()
        .map(|d| DateRate {
            from_date: d.from_date,
            to_date: d.to_date,
            rate: d.rate,
        })
        .collect();
    rates_by_date.sort_by_key(|band| band.from_date);

    Ok(SavingsAccount {
        id: SavingsAccountId::from_uuid(m.id),
        organization_id: OrganizationId::from_uuid(m.organization_id),
        branch_id: BranchId::from_uuid(m.branch_id),
        account_id: AccountId::from_uuid(m.account_id),
        member_profile_id: MemberProfileId::from_uuid(m.member_profile_id),
        member_type_id: MemberTypeId::from_uuid(m.member_type_id),
        member_type_since: m.member_type_since,
        interest_rate: m.interest_rate,
        interest_type: parse(&m.interest_type)?,
        rate_tiers,
        rates_by_year,
        rates_by_date,
        minimum_balance: m.minimum_balance,
        charges: m.charges,
        is_taxable: m.is_taxable,
        is_closed: m.is_closed,
    })
}

/// Savings account row, without its rate bands.
pub fn savings_account_active(account: &SavingsAccount) -> savings_accounts::ActiveModel {
    savings_accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        organization_id: Set(account.organization_id.into_inner()),
        branch_id: Set(account.branch_id.into_inner()),
        account_id: Set(account.account_id.into_inner()),
        member_profile_id: Set(account.member_profile_id.into_inner()),
        member_type_id: Set(account.member_type_id.into_inner()),
        member_type_since: Set(account.member_type_since),
        interest_rate: Set(account.interest_rate),
        interest_type: Set(account.interest_type.as_str().to_owned()),
        minimum_balance: Set(account.minimum_balance),
        charges: Set(account.charges),
        is_taxable: Set(account.is_taxable),
        is_closed: Set(account.is_closed),
    }
}

/// Rate band rows ready for insert.
#[derive(Debug, Default)]
pub struct RateActives {
    /// Balance tiers.
    pub tiers: Vec<savings_account_rate_tiers::ActiveModel>,
    /// Year bands.
    pub by_year: Vec<savings_account_year_rates::ActiveModel>,
    /// Date bands.
    pub by_date: Vec<savings_account_date_rates::ActiveModel>,
}

/// Rate band rows of a savings account. Bands carry no identity of their own.
pub fn rate_actives(account: &SavingsAccount) -> RateActives {
    let owner = account.id.into_inner();
    RateActives {
        tiers: account
            .rate_tiers
            .iter()
            .map(|tier| savings_account_rate_tiers::ActiveModel {
                id: Set(Uuid::now_v7()),
                savings_account_id: Set(owner),
                from_balance: Set(tier.from_balance),
                to_balance: Set(tier.to_balance),
                rate: Set(tier.rate),
            })
            .collect(),
        by_year: account
            .rates_by_year
            .iter()
            .map(|band| savings_account_year_rates::ActiveModel {
                id: Set(Uuid::now_v7()),
                savings_account_id: Set(owner),
                from_year: Set(band.from_year),
                to_year: Set(band.to_year),
                rate: Set(band.rate),
            })
            .collect(),
        by_date: account
            .rates_by_date
            .iter()
            .map(|band| savings_account_date_rates::ActiveModel {
                id: Set(Uuid::now_v7()),
                savings_account_id: Set(owner),
                from_date: Set(band.from_date),
                to_date: Set(band.to_date),
                rate: Set(band.rate),
            })
            .collect(),
    }
}

impl Mapped for AccrualBatch {
    type Model = accrual_batches::Model;
    type ActiveModel = accrual_batches::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: AccrualBatchId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            branch_id: BranchId::from_uuid(m.branch_id),
            document_no: m.document_no,
            last_computation_date: m.last_computation_date,
            new_computation_date: m.new_computation_date,
            account_id: m.account_id.map(AccountId::from_uuid),
            member_type_id: m.member_type_id.map(MemberTypeId::from_uuid),
            include_closed_account: m.include_closed_account,
            include_existing_computed_interest: m.include_existing_computed_interest,
            balance_basis: parse(&m.balance_basis)?,
            interest_tax_rate: m.interest_tax_rate,
            annual_divisor: to_u32(m.annual_divisor, "annual_divisor")?,
            total_interest: m.total_interest,
            total_tax: m.total_tax,
            lifecycle: lifecycle(m.printed_by, m.printed_date, m.posted_by, m.posted_date)?,
            post_account_id: m.post_account_id.map(AccountId::from_uuid),
            check_voucher_number: m.check_voucher_number,
            created_at: utc(m.created_at),
            created_by: UserId::from_uuid(m.created_by),
            updated_at: utc(m.updated_at),
            updated_by: UserId::from_uuid(m.updated_by),
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(accrual_batches::ActiveModel {
            id: Set(self.id.into_inner()),
            organization_id: Set(self.organization_id.into_inner()),
            branch_id: Set(self.branch_id.into_inner()),
            document_no: Set(self.document_no.clone()),
            last_computation_date: Set(self.last_computation_date),
            new_computation_date: Set(self.new_computation_date),
            account_id: Set(self.account_id.map(AccountId::into_inner)),
            member_type_id: Set(self.member_type_id.map(MemberTypeId::into_inner)),
            include_closed_account: Set(self.include_closed_account),
            include_existing_computed_interest: Set(self.include_existing_computed_interest),
            balance_basis: Set(self.balance_basis.as_str().to_string()),
            interest_tax_rate: Set(self.interest_tax_rate),
            annual_divisor: Set(to_i32(self.annual_divisor, "annual_divisor")?),
            total_interest: Set(self.total_interest),
            total_tax: Set(self.total_tax),
            printed_by: Set(self.lifecycle.printed_by().map(UserId::into_inner)),
            printed_date: Set(self.lifecycle.printed_date().map(stored)),
            posted_by: Set(self.lifecycle.posted_by().map(UserId::into_inner)),
            posted_date: Set(self.lifecycle.posted_date().map(stored)),
            post_account_id: Set(self.post_account_id.map(AccountId::into_inner)),
            check_voucher_number: Set(self.check_voucher_number.clone()),
            created_at: Set(stored(self.created_at)),
            created_by: Set(self.created_by.into_inner()),
            updated_at: Set(stored(self.updated_at)),
            updated_by: Set(self.updated_by.into_inner()),
        })
    }
}

impl Mapped for AccrualEntry {
    type Model = accrual_entries::Model;
    type ActiveModel = accrual_entries::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: AccrualEntryId::from_uuid(m.id),
            batch_id: AccrualBatchId::from_uuid(m.batch_id),
            account_id: AccountId::from_uuid(m.account_id),
            member_profile_id: MemberProfileId::from_uuid(m.member_profile_id),
            principal_basis: m.principal_basis,
            ending_balance: m.ending_balance,
            interest_rate: m.interest_rate,
            interest_amount: m.interest_amount,
            interest_tax: m.interest_tax,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(accrual_entries::ActiveModel {
            id: Set(self.id.into_inner()),
            batch_id: Set(self.batch_id.into_inner()),
            account_id: Set(self.account_id.into_inner()),
            member_profile_id: Set(self.member_profile_id.into_inner()),
            principal_basis: Set(self.principal_basis),
            ending_balance: Set(self.ending_balance),
            interest_rate: Set(self.interest_rate),
            interest_amount: Set(self.interest_amount),
            interest_tax: Set(self.interest_tax),
        })
    }
}

impl Mapped for DistributionBatch {
    type Model = distribution_batches::Model;
    type ActiveModel = distribution_batches::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: DistributionBatchId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            branch_id: BranchId::from_uuid(m.branch_id),
            member_profile_id: MemberProfileId::from_uuid(m.member_profile_id),
            member_type_id: m.member_type_id.map(MemberTypeId::from_uuid),
            name: m.name,
            description: m.description,
            amount: m.amount,
            computation_type: parse(&m.computation_type)?,
            date_of_death: m.date_of_death,
            extension_only: m.extension_only,
            account_id: m.account_id.map(AccountId::from_uuid),
            computation_date: m.computation_date,
            total_amount: m.total_amount,
            lifecycle: lifecycle(m.printed_by, m.printed_date, m.posted_by, m.posted_date)?,
            post_account_id: m.post_account_id.map(AccountId::from_uuid),
            check_voucher_number: m.check_voucher_number,
            created_at: utc(m.created_at),
            created_by: UserId::from_uuid(m.created_by),
            updated_at: utc(m.updated_at),
            updated_by: UserId::from_uuid(m.updated_by),
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(distribution_batches::ActiveModel {
            id: Set(self.id.into_inner()),
            organization_id: Set(self.organization_id.into_inner()),
            branch_id: Set(self.branch_id.into_inner()),
            member_profile_id: Set(self.member_profile_id.into_inner()),
            member_type_id: Set(self.member_type_id.map(MemberTypeId::into_inner)),
            name: Set(self.name.clone()),
            description: Set(self.description.clone()),
            amount: Set(self.amount),
            computation_type: Set(self.computation_type.as_str().to_string()),
            date_of_death: Set(self.date_of_death),
            extension_only: Set(self.extension_only),
            account_id: Set(self.account_id.map(AccountId::into_inner)),
            computation_date: Set(self.computation_date),
            total_amount: Set(self.total_amount),
            printed_by: Set(self.lifecycle.printed_by().map(UserId::into_inner)),
            printed_date: Set(self.lifecycle.printed_date().map(stored)),
            posted_by: Set(self.lifecycle.posted_by().map(UserId::into_inner)),
            posted_date: Set(self.lifecycle.posted_date().map(stored)),
            post_account_id: Set(self.post_account_id.map(AccountId::into_inner)),
            check_voucher_number: Set(self.check_voucher_number.clone()),
            created_at: Set(stored(self.created_at)),
            created_by: Set(self.created_by.into_inner()),
            updated_at: Set(stored(self.updated_at)),
            updated_by: Set(self.updated_by.into_inner()),
        })
    }
}

impl Mapped for AdditionalBeneficiary {
    type Model = distribution_beneficiaries::Model;
    type ActiveModel = distribution_beneficiaries::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: BeneficiaryId::from_uuid(m.id),
            batch_id: DistributionBatchId::from_uuid(m.batch_id),
            member_type_id: MemberTypeId::from_uuid(m.member_type_id),
            number_of_members: to_u32(m.number_of_members, "number_of_members")?,
            ratio: m.ratio,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(distribution_beneficiaries::ActiveModel {
            id: Set(self.id.into_inner()),
            batch_id: Set(self.batch_id.into_inner()),
            member_type_id: Set(self.member_type_id.into_inner()),
            number_of_members: Set(to_i32(self.number_of_members, "number_of_members")?),
            ratio: Set(self.ratio),
        })
    }
}

impl Mapped for AmountTableRow {
    type Model = distribution_amount_rows::Model;
    type ActiveModel = distribution_amount_rows::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        Ok(Self {
            id: AmountRowId::from_uuid(m.id),
            batch_id: DistributionBatchId::from_uuid(m.batch_id),
            month_from: to_u32(m.month_from, "month_from")?,
            month_to: to_u32(m.month_to, "month_to")?,
            amount: m.amount,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        Ok(distribution_amount_rows::ActiveModel {
            id: Set(self.id.into_inner()),
            batch_id: Set(self.batch_id.into_inner()),
            month_from: Set(to_i32(self.month_from, "month_from")?),
            month_to: Set(to_i32(self.month_to, "month_to")?),
            amount: Set(self.amount),
        })
    }
}

impl Mapped for DistributionEntry {
    type Model = distribution_entries::Model;
    type ActiveModel = distribution_entries::ActiveModel;

    fn from_model(m: Self::Model) -> Result<Self, StoreError> {
        let recipient = match (
            m.recipient_kind.as_str(),
            m.member_profile_id,
            m.beneficiary_id,
            m.ordinal,
        ) {
            (PRIMARY, Some(member), None, None) => Recipient::Primary {
                member_profile_id: MemberProfileId::from_uuid(member),
            },
            (BENEFICIARY, None, Some(beneficiary), Some(ordinal)) => Recipient::Beneficiary {
                beneficiary_id: BeneficiaryId::from_uuid(beneficiary),
                ordinal: to_u32(ordinal, "ordinal")?,
            },
            (kind, ..) => {
                return Err(StoreError::Corrupt(format!(
                    "distribution entry {} has inconsistent {kind} recipient",
                    m.id
                )));
            }
        };

        Ok(Self {
            id: DistributionEntryId::from_uuid(m.id),
            batch_id: DistributionBatchId::from_uuid(m.batch_id),
            position: to_u32(m.position, "position")?,
            recipient,
            amount: m.amount,
        })
    }

    fn to_active(&self) -> Result<Self::ActiveModel, StoreError> {
        let (kind, member, beneficiary, ordinal) = match self.recipient {
            Recipient::Primary { member_profile_id } => {
                (PRIMARY, Some(member_profile_id.into_inner()), None, None)
            }
            Recipient::Beneficiary {
                beneficiary_id,
                ordinal,
            } => (
                BENEFICIARY,
                None,
                Some(beneficiary_id.into_inner()),
                Some(to_i32(ordinal, "ordinal")?),
            ),
        };

        Ok(distribution_entries::ActiveModel {
            id: Set(self.id.into_inner()),
            batch_id: Set(self.batch_id.into_inner()),
            position: Set(to_i32(self.position, "position")?),
            recipient_kind: Set(kind.to_string()),
            member_profile_id: Set(member),
            beneficiary_id: Set(beneficiary),
            ordinal: Set(ordinal),
            amount: Set(self.amount),
        })
    }
}
