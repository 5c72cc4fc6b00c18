//! Read-only records owned by the surrounding CRUD layer.
//!
//! The engine reads these to decide eligibility, rates and divisors; it never
//! writes them.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecoop_shared::types::{
    AccountId, BranchId, MemberProfileId, MemberTypeId, OrganizationId, SavingsAccountId,
};

/// Per-branch computation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSettings {
    /// The branch these settings belong to.
    pub branch_id: BranchId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Day-count divisor for interest (typically 360 or 365).
    pub annual_divisor: Option<u32>,
    /// Default withholding tax rate on interest, as a fraction.
    pub interest_tax_rate: Option<Decimal>,
}

/// Which rate schedule applies to a savings account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    /// Flat rate only.
    None,
    /// Rate by the year the member entered their current member type.
    Year,
    /// Rate by the date the member entered their current member type.
    Date,
    /// Rate by the closing balance of the window.
    #[default]
    Amount,
}

impl InterestType {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Year => "year",
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }
}

impl std::str::FromStr for InterestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "year" => Ok(Self::Year),
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            _ => Err(format!("Unknown interest type: {s}")),
        }
    }
}

/// Balance band with its own annual rate.
///
/// `to_balance` of `None` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    /// Lowest balance in the band, inclusive.
    pub from_balance: Decimal,
    /// Highest balance in the band, inclusive.
    pub to_balance: Option<Decimal>,
    /// Annual rate as a fraction.
    pub rate: Decimal,
}

impl RateTier {
    /// Returns true if `balance` falls inside the band.
    #[must_use]
    pub fn contains(&self, balance: Decimal) -> bool {
        balance >= self.from_balance && self.to_balance.is_none_or(|to| balance <= to)
    }
}

/// Calendar-year band, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRate {
    /// First year of the band.
    pub from_year: i32,
    /// Last year of the band.
    pub to_year: i32,
    /// Annual rate as a fraction.
    pub rate: Decimal,
}

/// Date band, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRate {
    /// First day of the band.
    pub from_date: NaiveDate,
    /// Last day of the band.
    pub to_date: NaiveDate,
    /// Annual rate as a fraction.
    pub rate: Decimal,
}

/// A member's savings sub-ledger on one general ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsAccount {
    /// Unique identifier.
    pub id: SavingsAccountId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// General ledger account holding the deposits.
    pub account_id: AccountId,
    /// Account holder.
    pub member_profile_id: MemberProfileId,
    /// Holder's member type.
    pub member_type_id: MemberTypeId,
    /// Date of the holder's latest member-type change, if any.
    pub member_type_since: Option<NaiveDate>,
    /// Flat annual rate as a fraction.
    pub interest_rate: Decimal,
    /// Schedule that may override the flat rate.
    pub interest_type: InterestType,
    /// Balance bands, used by [`InterestType::Amount`].
    pub rate_tiers: Vec<RateTier>,
    /// Year bands, used by [`InterestType::Year`].
    pub rates_by_year: Vec<YearRate>,
    /// Date bands, used by [`InterestType::Date`].
    pub rates_by_date: Vec<DateRate>,
    /// Closing balance below which interest is withheld.
    pub minimum_balance: Decimal,
    /// Fee charged instead of interest when under the minimum.
    pub charges: Decimal,
    /// Whether interest is subject to withholding tax.
    pub is_taxable: bool,
    /// Whether the account is closed.
    pub is_closed: bool,
}

impl SavingsAccount {
    /// Annual rate for a window that closes at `closing_balance`.
    ///
    /// The first matching band of the account's schedule wins. Without a
    /// match, or without a member-type date for the year and date schedules,
    /// the flat rate applies.
    #[must_use]
    pub fn rate_for(&self, closing_balance: Decimal) -> Decimal {
        let scheduled = match self.interest_type {
            InterestType::None => None,
            InterestType::Amount => self
                .rate_tiers
                .iter()
                .find(|tier| tier.contains(closing_balance))
                .map(|tier| tier.rate),
            InterestType::Year => self.member_type_since.and_then(|since| {
                self.rates_by_year
                    .iter()
                    .find(|band| (band.from_year..=band.to_year).contains(&since.year()))
                    .map(|band| band.rate)
            }),
            InterestType::Date => self.member_type_since.and_then(|since| {
                self.rates_by_date
                    .iter()
                    .find(|band| (band.from_date..=band.to_date).contains(&since))
                    .map(|band| band.rate)
            }),
        };
        scheduled.unwrap_or(self.interest_rate)
    }
}

/// Filter for savings account lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavingsAccountFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Branch scope.
    pub branch_id: Option<BranchId>,
    /// General ledger account.
    pub account_id: Option<AccountId>,
    /// Member type.
    pub member_type_id: Option<MemberTypeId>,
    /// Include closed accounts.
    pub include_closed: bool,
}

impl SavingsAccountFilter {
    /// Returns true if the account passes the filter.
    #[must_use]
    pub fn matches(&self, account: &SavingsAccount) -> bool {
        self.organization_id.is_none_or(|id| account.organization_id == id)
            && self.branch_id.is_none_or(|id| account.branch_id == id)
            && self.account_id.is_none_or(|id| account.account_id == id)
            && self.member_type_id.is_none_or(|id| account.member_type_id == id)
            && (self.include_closed || !account.is_closed)
    }
}

/// Membership facts used for age-based amount tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Unique identifier.
    pub id: MemberProfileId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Home branch.
    pub branch_id: BranchId,
    /// Member type.
    pub member_type_id: MemberTypeId,
    /// Date the member joined.
    pub membership_date: NaiveDate,
}

/// Filter for member profile lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberProfileFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Member type.
    pub member_type_id: Option<MemberTypeId>,
}

impl MemberProfileFilter {
    /// Returns true if the profile passes the filter.
    #[must_use]
    pub fn matches(&self, profile: &MemberProfile) -> bool {
        self.organization_id.is_none_or(|id| profile.organization_id == id)
            && self.member_type_id.is_none_or(|id| profile.member_type_id == id)
    }
}

/// Filter for branch settings lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSettingsFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
}

impl BranchSettingsFilter {
    /// Returns true if the settings pass the filter.
    #[must_use]
    pub fn matches(&self, settings: &BranchSettings) -> bool {
        self.organization_id.is_none_or(|id| settings.organization_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(tiers: Vec<RateTier>) -> SavingsAccount {
        SavingsAccount {
            id: SavingsAccountId::new(),
            organization_id: OrganizationId::new(),
            branch_id: BranchId::new(),
            account_id: AccountId::new(),
            member_profile_id: MemberProfileId::new(),
            member_type_id: MemberTypeId::new(),
            member_type_since: None,
            interest_rate: dec!(0.02),
            interest_type: InterestType::Amount,
            rate_tiers: tiers,
            rates_by_year: vec![],
            rates_by_date: vec![],
            minimum_balance: dec!(0),
            charges: dec!(0),
            is_taxable: true,
            is_closed: false,
        }
    }

    #[test]
    fn test_rate_falls_back_to_flat() {
        assert_eq!(account(vec![]).rate_for(dec!(5000)), dec!(0.02));
    }

    #[test]
    fn test_rate_tier_lookup() {
        let acct = account(vec![
            RateTier {
                from_balance: dec!(0),
                to_balance: Some(dec!(9999.99)),
                rate: dec!(0.01),
            },
            RateTier {
                from_balance: dec!(10000),
                to_balance: None,
                rate: dec!(0.03),
            },
        ]);
        assert_eq!(acct.rate_for(dec!(500)), dec!(0.01));
        assert_eq!(acct.rate_for(dec!(10000)), dec!(0.03));
        assert_eq!(acct.rate_for(dec!(-1)), dec!(0.02));
    }

    #[test]
    fn test_rate_by_year_of_member_type_change() {
        let mut acct = account(vec![]);
        acct.interest_type = InterestType::Year;
        acct.rates_by_year = vec![
            YearRate {
                from_year: 2010,
                to_year: 2019,
                rate: dec!(0.025),
            },
            YearRate {
                from_year: 2020,
                to_year: 2029,
                rate: dec!(0.015),
            },
        ];

        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.02));
        acct.member_type_since = NaiveDate::from_ymd_opt(2019, 12, 31);
        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.025));
        acct.member_type_since = NaiveDate::from_ymd_opt(2020, 1, 1);
        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.015));
        acct.member_type_since = NaiveDate::from_ymd_opt(2031, 6, 1);
        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.02));
    }

    #[test]
    fn test_rate_by_date_of_member_type_change() {
        let mut acct = account(vec![]);
        acct.interest_type = InterestType::Date;
        acct.rates_by_date = vec![DateRate {
            from_date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            rate: dec!(0.05),
        }];

        acct.member_type_since = NaiveDate::from_ymd_opt(2023, 3, 31);
        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.05));
        acct.member_type_since = NaiveDate::from_ymd_opt(2023, 4, 1);
        assert_eq!(acct.rate_for(dec!(1000)), dec!(0.02));
    }

    #[test]
    fn test_schedule_only_reads_its_own_bands() {
        let mut acct = account(vec![RateTier {
            from_balance: dec!(0),
            to_balance: None,
            rate: dec!(0.04),
        }]);
        acct.member_type_since = NaiveDate::from_ymd_opt(2015, 1, 1);
        acct.rates_by_year = vec![YearRate {
            from_year: 2000,
            to_year: 2030,
            rate: dec!(0.01),
        }];

        assert_eq!(acct.rate_for(dec!(100)), dec!(0.04));
        acct.interest_type = InterestType::Year;
        assert_eq!(acct.rate_for(dec!(100)), dec!(0.01));
        acct.interest_type = InterestType::None;
        assert_eq!(acct.rate_for(dec!(100)), dec!(0.02));
    }

    #[test]
    fn test_interest_type_storage_form() {
        for kind in [
            InterestType::None,
            InterestType::Year,
            InterestType::Date,
            InterestType::Amount,
        ] {
            assert_eq!(kind.as_str().parse::<InterestType>(), Ok(kind));
        }
        assert!("monthly".parse::<InterestType>().is_err());
    }

    #[test]
    fn test_closed_accounts_filtered() {
        let mut acct = account(vec![]);
        acct.is_closed = true;
        assert!(!SavingsAccountFilter::default().matches(&acct));
        let filter = SavingsAccountFilter {
            include_closed: true,
            ..SavingsAccountFilter::default()
        };
        assert!(filter.matches(&acct));
    }
}
