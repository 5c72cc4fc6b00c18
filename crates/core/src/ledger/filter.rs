//! Caller-side scoping for ledger queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ecoop_shared::types::{AccountId, BranchId, MemberProfileId, OrganizationId};

use super::entry::{EntrySource, LedgerEntry, PaymentType};

/// Narrows a set of ledger entries before aggregation.
///
/// Every `None` field matches everything. `as_of` is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Branch scope.
    pub branch_id: Option<BranchId>,
    /// General ledger account.
    pub account_id: Option<AccountId>,
    /// Member sub-ledger.
    pub member_profile_id: Option<MemberProfileId>,
    /// Payment medium.
    pub type_of_payment: Option<PaymentType>,
    /// Business origin.
    pub source: Option<EntrySource>,
    /// Producing batch.
    pub reference_batch_id: Option<Uuid>,
    /// Latest entry date included.
    pub as_of: Option<NaiveDate>,
}

impl LedgerFilter {
    /// Filter scoped to one organization branch.
    #[must_use]
    pub fn branch(organization_id: OrganizationId, branch_id: BranchId) -> Self {
        Self {
            organization_id: Some(organization_id),
            branch_id: Some(branch_id),
            ..Self::default()
        }
    }

    /// Restricts to one account.
    #[must_use]
    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Restricts to one member sub-ledger.
    #[must_use]
    pub fn member(mut self, member_profile_id: MemberProfileId) -> Self {
        self.member_profile_id = Some(member_profile_id);
        self
    }

    /// Restricts to entries dated on or before `date`.
    #[must_use]
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Restricts to rows produced by one batch.
    #[must_use]
    pub fn reference_batch(mut self, batch_id: Uuid) -> Self {
        self.reference_batch_id = Some(batch_id);
        self
    }

    /// Returns true if the entry passes every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.organization_id.is_none_or(|id| entry.organization_id == id)
            && self.branch_id.is_none_or(|id| entry.branch_id == id)
            && self.account_id.is_none_or(|id| entry.account_id == id)
            && self
                .member_profile_id
                .is_none_or(|id| entry.member_profile_id == Some(id))
            && self.type_of_payment.is_none_or(|t| entry.type_of_payment == t)
            && self.source.is_none_or(|s| entry.source == s)
            && self
                .reference_batch_id
                .is_none_or(|id| entry.reference_batch_id == Some(id))
            && self.as_of.is_none_or(|date| entry.entry_date <= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::fixtures::entry;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_filter_matches_everything() {
        let row = entry(
            AccountId::new(),
            None,
            dec!(1),
            dec!(0),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(LedgerFilter::default().matches(&row));
    }

    #[test]
    fn test_member_and_as_of() {
        let account = AccountId::new();
        let member = MemberProfileId::new();
        let jan = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        let filter = LedgerFilter::default().account(account).member(member).as_of(jan);

        assert!(filter.matches(&entry(account, Some(member), dec!(0), dec!(5), jan)));
        assert!(!filter.matches(&entry(account, Some(member), dec!(0), dec!(5), feb)));
        assert!(!filter.matches(&entry(account, None, dec!(0), dec!(5), jan)));
        assert!(!filter.matches(&entry(AccountId::new(), Some(member), dec!(0), dec!(5), jan)));
    }
}
