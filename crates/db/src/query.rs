//! Translates engine filters into `SeaORM` conditions.

use sea_orm::{ColumnTrait, Condition};

use ecoop_core::accrual::{AccrualBatchFilter, AccrualEntryFilter};
use ecoop_core::distribution::{BatchChildFilter, DistributionBatchFilter};
use ecoop_core::ledger::LedgerFilter;
use ecoop_core::lifecycle::BatchState;
use ecoop_core::reference::{BranchSettingsFilter, MemberProfileFilter, SavingsAccountFilter};

use crate::entities::{
    accrual_batches, accrual_entries, branch_settings, distribution_amount_rows,
    distribution_batches, distribution_beneficiaries, distribution_entries, ledger_entries,
    member_profiles, savings_accounts,
};

/// State is derived from which lifecycle stamps are present.
fn state_condition<C: ColumnTrait>(state: BatchState, printed: C, posted: C) -> Condition {
    match state {
        BatchState::Draft => Condition::all().add(printed.is_null()).add(posted.is_null()),
        BatchState::Printed => Condition::all().add(printed.is_not_null()).add(posted.is_null()),
        BatchState::Posted => Condition::all().add(posted.is_not_null()),
    }
}

pub fn ledger(f: &LedgerFilter) -> Condition {
    use ledger_entries::Column;

    Condition::all()
        .add_option(f.organization_id.map(|id| Column::OrganizationId.eq(id.into_inner())))
        .add_option(f.branch_id.map(|id| Column::BranchId.eq(id.into_inner())))
        .add_option(f.account_id.map(|id| Column::AccountId.eq(id.into_inner())))
        .add_option(f.member_profile_id.map(|id| Column::MemberProfileId.eq(id.into_inner())))
        .add_option(f.type_of_payment.map(|t| Column::TypeOfPayment.eq(t.as_str())))
        .add_option(f.source.map(|s| Column::Source.eq(s.as_str())))
        .add_option(f.reference_batch_id.map(|id| Column::ReferenceBatchId.eq(id)))
        .add_option(f.as_of.map(|date| Column::EntryDate.lte(date)))
}

pub fn branch_settings(f: &BranchSettingsFilter) -> Condition {
    Condition::all().add_option(
        f.organization_id
            .map(|id| branch_settings::Column::OrganizationId.eq(id.into_inner())),
    )
}

pub fn savings_accounts(f: &SavingsAccountFilter) -> Condition {
    use savings_accounts::Column;

    let condition = Condition::all()
        .add_option(f.organization_id.map(|id| Column::OrganizationId.eq(id.into_inner())))
        .add_option(f.branch_id.map(|id| Column::BranchId.eq(id.into_inner())))
        .add_option(f.account_id.map(|id| Column::AccountId.eq(id.into_inner())))
        .add_option(f.member_type_id.map(|id| Column::MemberTypeId.eq(id.into_inner())));

    if f.include_closed {
        condition
    } else {
        condition.add(Column::IsClosed.eq(false))
    }
}

pub fn member_profiles(f: &MemberProfileFilter) -> Condition {
    use member_profiles::Column;

    Condition::all()
        .add_option(f.organization_id.map(|id| Column::OrganizationId.eq(id.into_inner())))
        .add_option(f.member_type_id.map(|id| Column::MemberTypeId.eq(id.into_inner())))
}

pub fn accrual_batches(f: &AccrualBatchFilter) -> Condition {
    use accrual_batches::Column;

    Condition::all()
        .add_option(f.organization_id.map(|id| Column::OrganizationId.eq(id.into_inner())))
        .add_option(f.branch_id.map(|id| Column::BranchId.eq(id.into_inner())))
        .add_option(
            f.state
                .map(|s| state_condition(s, Column::PrintedDate, Column::PostedDate)),
        )
        .add_option(f.overlapping.map(|(last, new)| {
            Condition::all()
                .add(Column::LastComputationDate.lt(new))
                .add(Column::NewComputationDate.gt(last))
        }))
}

pub fn accrual_entries(f: &AccrualEntryFilter) -> Condition {
    use accrual_entries::Column;

    Condition::all()
        .add_option(f.batch_id.map(|id| Column::BatchId.eq(id.into_inner())))
        .add_option(f.account_id.map(|id| Column::AccountId.eq(id.into_inner())))
}

pub fn distribution_batches(f: &DistributionBatchFilter) -> Condition {
    use distribution_batches::Column;

    Condition::all()
        .add_option(f.organization_id.map(|id| Column::OrganizationId.eq(id.into_inner())))
        .add_option(f.branch_id.map(|id| Column::BranchId.eq(id.into_inner())))
        .add_option(f.member_profile_id.map(|id| Column::MemberProfileId.eq(id.into_inner())))
        .add_option(
            f.state
                .map(|s| state_condition(s, Column::PrintedDate, Column::PostedDate)),
        )
}

/// Child tables of a distribution batch all key on `batch_id`.
fn batch_children<C: ColumnTrait>(f: &BatchChildFilter, batch_column: C) -> Condition {
    Condition::all().add_option(f.batch_id.map(|id| batch_column.eq(id.into_inner())))
}

pub fn beneficiaries(f: &BatchChildFilter) -> Condition {
    batch_children(f, distribution_beneficiaries::Column::BatchId)
}

pub fn amount_rows(f: &BatchChildFilter) -> Condition {
    batch_children(f, distribution_amount_rows::Column::BatchId)
}

pub fn distribution_entries(f: &BatchChildFilter) -> Condition {
    batch_children(f, distribution_entries::Column::BatchId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    use ecoop_core::ledger::EntrySource;
    use ecoop_shared::types::{AccountId, BranchId, OrganizationId};

    fn sql<E: EntityTrait>(condition: Condition) -> String {
        E::find()
            .filter(condition)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_empty_ledger_filter_applies_no_predicate() {
        let sql = sql::<ledger_entries::Entity>(ledger(&LedgerFilter::default()));

        for predicate in [
            r#""organization_id" ="#,
            r#""branch_id" ="#,
            r#""account_id" ="#,
            r#""member_profile_id" ="#,
            r#""type_of_payment" ="#,
            r#""source" ="#,
            r#""reference_batch_id" ="#,
            r#""entry_date" <="#,
        ] {
            assert!(!sql.contains(predicate), "{predicate} in {sql}");
        }
    }

    #[test]
    fn test_ledger_filter_columns() {
        let filter = LedgerFilter {
            source: Some(EntrySource::SavingsInterest),
            ..LedgerFilter::branch(OrganizationId::new(), BranchId::new())
        }
        .account(AccountId::new())
        .as_of(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let sql = sql::<ledger_entries::Entity>(ledger(&filter));

        assert!(sql.contains(r#""organization_id" ="#), "{sql}");
        assert!(sql.contains(r#""account_id" ="#), "{sql}");
        assert!(sql.contains("'savings_interest'"), "{sql}");
        assert!(sql.contains(r#""entry_date" <= '2024-01-31'"#), "{sql}");
        assert!(!sql.contains(r#""member_profile_id" ="#), "{sql}");
    }

    #[test]
    fn test_open_accounts_only_by_default() {
        let open =
            sql::<savings_accounts::Entity>(savings_accounts(&SavingsAccountFilter::default()));
        assert!(open.contains(r#""is_closed" = FALSE"#), "{open}");

        let all = sql::<savings_accounts::Entity>(savings_accounts(&SavingsAccountFilter {
            include_closed: true,
            ..SavingsAccountFilter::default()
        }));
        assert!(!all.contains(r#""is_closed" ="#), "{all}");
    }

    #[test]
    fn test_posted_overlapping_accrual_batches() {
        let filter = AccrualBatchFilter {
            state: Some(BatchState::Posted),
            overlapping: Some((
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )),
            ..AccrualBatchFilter::default()
        };

        let sql = sql::<accrual_batches::Entity>(accrual_batches(&filter));

        assert!(sql.contains(r#""posted_date" IS NOT NULL"#), "{sql}");
        assert!(sql.contains(r#""last_computation_date" < '2024-01-31'"#), "{sql}");
        assert!(sql.contains(r#""new_computation_date" > '2023-12-31'"#), "{sql}");
    }

    #[test]
    fn test_printed_state_condition() {
        let filter = DistributionBatchFilter {
            state: Some(BatchState::Printed),
            ..DistributionBatchFilter::default()
        };

        let sql = sql::<distribution_batches::Entity>(distribution_batches(&filter));

        assert!(sql.contains(r#""printed_date" IS NOT NULL"#), "{sql}");
        assert!(sql.contains(r#""posted_date" IS NULL"#), "{sql}");
    }
}
