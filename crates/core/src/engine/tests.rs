use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ecoop_shared::types::{
    AccountId, BranchId, MemberProfileId, MemberTypeId, OrganizationId, UserId,
};
use ecoop_shared::EngineConfig;

use super::*;
use crate::accrual::generator::fixtures::{deposit, deposit_on, jan_params, savings};
use crate::accrual::{AccrualBatch, AccrualBatchFilter, AccrualParams, BalanceBasis};
use crate::distribution::{
    AmountRowInput, BeneficiaryInput, ComputationType, DistributionError, DistributionInput,
    Recipient,
};
use crate::ledger::EntrySource;
use crate::lifecycle::{BatchState, StateConflict};
use crate::posting::PostParams;
use crate::reference::{BranchSettings, MemberProfile, SavingsAccount};
use crate::store::MemoryStore;

struct Fixture {
    engine: Arc<BatchEngine<MemoryStore>>,
    store: MemoryStore,
    org: OrganizationId,
    branch: BranchId,
    user: UserId,
}

impl Fixture {
    async fn new() -> Self {
        let store = MemoryStore::new();
        let org = OrganizationId::new();
        let branch = BranchId::new();
        store
            .seed(vec![BranchSettings {
                branch_id: branch,
                organization_id: org,
                annual_divisor: Some(360),
                interest_tax_rate: Some(dec!(0.2)),
            }])
            .await
            .unwrap();
        Self {
            engine: Arc::new(BatchEngine::new(store.clone(), &EngineConfig::default())),
            store,
            org,
            branch,
            user: UserId::new(),
        }
    }

    /// One savings account holding 100000 since before January.
    async fn saver(&self) -> SavingsAccount {
        let account = savings(self.org, self.branch, AccountId::new());
        self.store.seed(vec![account.clone()]).await.unwrap();
        self.store
            .seed(vec![deposit(&account, dec!(100000))])
            .await
            .unwrap();
        account
    }

    async fn ledger_rows(&self, reference: uuid::Uuid) -> Vec<LedgerEntry> {
        self.store
            .snapshot(&LedgerFilter::default().reference_batch(reference))
            .await
            .unwrap()
    }

    async fn member(&self) -> MemberProfile {
        let profile = MemberProfile {
            id: MemberProfileId::new(),
            organization_id: self.org,
            branch_id: self.branch,
            member_type_id: MemberTypeId::new(),
            membership_date: NaiveDate::from_ymd_opt(2015, 3, 10).unwrap(),
        };
        self.store.seed(vec![profile.clone()]).await.unwrap();
        profile
    }

    fn flat_input(&self, member: &MemberProfile, amount: Decimal) -> DistributionInput {
        DistributionInput {
            organization_id: self.org,
            branch_id: self.branch,
            member_profile_id: member.id,
            member_type_id: Some(member.member_type_id),
            name: "Mutual aid".into(),
            description: String::new(),
            amount,
            computation_type: ComputationType::Flat,
            date_of_death: None,
            extension_only: false,
            account_id: None,
            computation_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            beneficiaries: vec![group(2, dec!(1)), group(1, dec!(2))],
            amount_table: vec![],
        }
    }
}

fn group(number_of_members: u32, ratio: Decimal) -> BeneficiaryInput {
    BeneficiaryInput {
        member_type_id: MemberTypeId::new(),
        number_of_members,
        ratio,
    }
}

fn post_params() -> PostParams {
    PostParams {
        entry_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        ..PostParams::new(AccountId::new())
    }
}

fn assert_conflict(err: &EngineError, required: BatchState, actual: BatchState) {
    match err {
        EngineError::StateConflict(conflict) => {
            assert_eq!(*conflict, StateConflict { required, actual });
        }
        other => panic!("expected state conflict, got {other:?}"),
    }
}

// ============================================================================
// Accrual
// ============================================================================

#[tokio::test]
async fn test_preview_accrual_writes_nothing() {
    let fx = Fixture::new().await;
    fx.saver().await;

    let preview = fx.engine.preview_accrual(&jan_params(fx.org, fx.branch)).await.unwrap();
    assert_eq!(preview.totals.total_interest, dec!(166.67));
    assert_eq!(preview.totals.total_tax, dec!(33.33));
    assert_eq!(preview.annual_divisor, 360);

    let batches: Vec<AccrualBatch> = fx
        .store
        .snapshot(&AccrualBatchFilter::default())
        .await
        .unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_create_accrual_batch_stages_draft() {
    let fx = Fixture::new().await;
    let account = fx.saver().await;

    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    assert_eq!(batch.state(), BatchState::Draft);
    assert_eq!(batch.interest_tax_rate, dec!(0.2));

    let view = fx.engine.accrual_view(batch.id).await.unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].member_profile_id, account.member_profile_id);
    assert_eq!(view.entries[0].ending_balance, dec!(100133.34));
    assert_eq!(view.totals.total_interest, batch.total_interest);
    assert!(fx.ledger_rows(batch.id.into_inner()).await.is_empty());
}

#[tokio::test]
async fn test_regenerate_accrual_is_idempotent() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    let before = fx.engine.accrual_view(batch.id).await.unwrap();

    let after = fx.engine.regenerate_accrual(batch.id, fx.user).await.unwrap();
    let amounts = |view: &AccrualView| {
        view.entries
            .iter()
            .map(|e| (e.account_id, e.member_profile_id, e.interest_amount, e.interest_tax))
            .collect::<Vec<_>>()
    };
    assert_eq!(amounts(&before), amounts(&after));
    assert_eq!(before.totals, after.totals);
}

#[tokio::test]
async fn test_regenerate_requires_draft() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();

    let err = fx.engine.regenerate_accrual(batch.id, fx.user).await.unwrap_err();
    assert_conflict(&err, BatchState::Draft, BatchState::Printed);
}

#[tokio::test]
async fn test_post_from_draft_conflicts_without_writes() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();

    let err = fx
        .engine
        .post_accrual(batch.id, &post_params(), fx.user)
        .await
        .unwrap_err();
    assert_conflict(&err, BatchState::Printed, BatchState::Draft);
    assert_eq!(err.http_status_code(), 400);
    assert!(fx.ledger_rows(batch.id.into_inner()).await.is_empty());
}

#[tokio::test]
async fn test_print_post_accrual() {
    let fx = Fixture::new().await;
    let account = fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();

    let printed = fx.engine.print_accrual(batch.id, fx.user).await.unwrap();
    assert_eq!(printed.state(), BatchState::Printed);
    assert_eq!(printed.lifecycle.printed_by(), Some(fx.user));

    let params = post_params();
    let receipt = fx.engine.post_accrual(batch.id, &params, fx.user).await.unwrap();
    assert_eq!(receipt.rows_written, 4);
    assert!(receipt.totals.is_balanced);
    assert_eq!(receipt.totals.debit, dec!(200.00));

    let view = fx.engine.accrual_view(batch.id).await.unwrap();
    assert_eq!(view.batch.state(), BatchState::Posted);
    assert_eq!(view.batch.post_account_id, Some(params.post_account_id));

    let rows = fx.ledger_rows(batch.id.into_inner()).await;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.source == EntrySource::SavingsInterest));

    let balance = fx
        .engine
        .account_balance(
            fx.org,
            fx.branch,
            account.account_id,
            Some(account.member_profile_id),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(balance.credit - balance.debit, dec!(100133.34));
}

#[tokio::test]
async fn test_undo_print_after_post_conflicts() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();

    let draft = fx.engine.undo_print_accrual(batch.id, fx.user).await.unwrap();
    assert_eq!(draft.state(), BatchState::Draft);
    assert_eq!(draft.lifecycle.printed_by(), None);

    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();
    fx.engine
        .post_accrual(batch.id, &post_params(), fx.user)
        .await
        .unwrap();

    let err = fx.engine.undo_print_accrual(batch.id, fx.user).await.unwrap_err();
    assert_conflict(&err, BatchState::Printed, BatchState::Posted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_posts_write_once() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();

    let batch_id = batch.id;
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&fx.engine);
            let user = fx.user;
            tokio::spawn(async move { engine.post_accrual(batch_id, &post_params(), user).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for joined in futures::future::join_all(handles).await {
        match joined.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => {
                assert_conflict(&err, BatchState::Printed, BatchState::Posted);
                conflicts += 1;
            }
        }
    }
    assert_eq!((successes, conflicts), (1, 1));
    assert_eq!(fx.ledger_rows(batch.id.into_inner()).await.len(), 4);
}

#[tokio::test]
async fn test_failed_post_rolls_back() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let batch = fx
        .engine
        .create_accrual_batch(&jan_params(fx.org, fx.branch), fx.user)
        .await
        .unwrap();
    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();

    fx.store.fail_nth_create::<LedgerEntry>(3).await;
    let err = fx
        .engine
        .post_accrual(batch.id, &post_params(), fx.user)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));
    assert!(err.is_retryable());

    assert!(fx.ledger_rows(batch.id.into_inner()).await.is_empty());
    let view = fx.engine.accrual_view(batch.id).await.unwrap();
    assert_eq!(view.batch.state(), BatchState::Printed);

    let receipt = fx
        .engine
        .post_accrual(batch.id, &post_params(), fx.user)
        .await
        .unwrap();
    assert_eq!(receipt.rows_written, 4);
}

#[tokio::test]
async fn test_posted_sub_ledgers_are_skipped() {
    let fx = Fixture::new().await;
    fx.saver().await;
    let params = jan_params(fx.org, fx.branch);
    let batch = fx.engine.create_accrual_batch(&params, fx.user).await.unwrap();
    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();
    fx.engine
        .post_accrual(batch.id, &post_params(), fx.user)
        .await
        .unwrap();

    let again = fx.engine.preview_accrual(&params).await.unwrap();
    assert!(again.lines.is_empty());

    let forced = AccrualParams {
        include_existing_computed_interest: true,
        ..params
    };
    let again = fx.engine.preview_accrual(&forced).await.unwrap();
    assert_eq!(again.lines.len(), 1);
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

#[tokio::test]
async fn test_post_average_daily_with_below_minimum_charge() {
    let fx = Fixture::new().await;

    let healthy = savings(fx.org, fx.branch, AccountId::new());
    let mut charged = savings(fx.org, fx.branch, AccountId::new());
    charged.minimum_balance = dec!(500);
    charged.charges = dec!(25);
    fx.store
        .seed(vec![healthy.clone(), charged.clone()])
        .await
        .unwrap();
    fx.store
        .seed(vec![
            deposit(&healthy, dec!(100000)),
            deposit_on(&healthy, dec!(30000), jan(16)),
            deposit(&charged, dec!(100)),
        ])
        .await
        .unwrap();

    let params = AccrualParams {
        balance_basis: BalanceBasis::AverageDaily,
        ..jan_params(fx.org, fx.branch)
    };
    let batch = fx.engine.create_accrual_batch(&params, fx.user).await.unwrap();
    // (14 * 100000 + 16 * 130000) / 30 = 116000; 116000 * 0.02 * 30 / 360 = 193.33
    assert_eq!(batch.total_interest, dec!(168.33));
    assert_eq!(batch.total_tax, dec!(38.67));

    fx.engine.print_accrual(batch.id, fx.user).await.unwrap();
    let tax_account = AccountId::new();
    let post = PostParams {
        tax_account_id: Some(tax_account),
        ..post_params()
    };
    let receipt = fx.engine.post_accrual(batch.id, &post, fx.user).await.unwrap();
    assert_eq!(receipt.rows_written, 6);
    assert!(receipt.totals.is_balanced);
    assert_eq!(receipt.totals.debit, dec!(257.00));
    assert_eq!(receipt.totals.credit, dec!(257.00));

    let rows = fx.ledger_rows(batch.id.into_inner()).await;
    let charge: Vec<&LedgerEntry> = rows
        .iter()
        .filter(|r| r.account_id == charged.account_id)
        .collect();
    assert_eq!(charge.len(), 1);
    assert_eq!(charge[0].debit, dec!(25));
    assert!(charge[0].credit.is_zero());
    assert_eq!(charge[0].member_profile_id, Some(charged.member_profile_id));
    assert!(rows.iter().any(|r| r.account_id == post.post_account_id
        && r.credit == dec!(25)
        && r.debit.is_zero()));

    let interest: Vec<&LedgerEntry> = rows
        .iter()
        .filter(|r| r.account_id == healthy.account_id)
        .collect();
    assert!(interest.iter().any(|r| r.credit == dec!(193.33)));
    assert!(interest.iter().any(|r| r.debit == dec!(38.67)));
    assert!(rows.iter().any(|r| r.account_id == tax_account && r.credit == dec!(38.67)));

    let balance = fx
        .engine
        .account_balance(
            fx.org,
            fx.branch,
            charged.account_id,
            Some(charged.member_profile_id),
            jan(31),
        )
        .await
        .unwrap();
    assert_eq!(balance.credit - balance.debit, dec!(75));
}

#[tokio::test]
async fn test_preview_lowest_daily_basis() {
    let fx = Fixture::new().await;
    let account = fx.saver().await;
    let mut withdrawal = deposit_on(&account, Decimal::ZERO, jan(10));
    withdrawal.debit = dec!(40000);
    fx.store
        .seed(vec![withdrawal, deposit_on(&account, dec!(40000), jan(20))])
        .await
        .unwrap();

    let params = AccrualParams {
        balance_basis: BalanceBasis::LowestDaily,
        ..jan_params(fx.org, fx.branch)
    };
    let preview = fx.engine.preview_accrual(&params).await.unwrap();
    let line = &preview.lines[0];
    assert_eq!(line.principal_basis, dec!(60000));
    // 60000 * 0.02 * 30 / 360
    assert_eq!(line.interest_amount, dec!(100.00));
    assert_eq!(line.ending_balance, dec!(100080.00));
}

#[tokio::test]
async fn test_missing_settings() {
    let store = MemoryStore::new();
    let engine = BatchEngine::new(store, &EngineConfig::default());
    let branch = BranchId::new();

    let err = engine
        .preview_accrual(&jan_params(OrganizationId::new(), branch))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingBranchSettings(id) if id == branch));
}

#[tokio::test]
async fn test_config_divisor_and_request_tax_rate() {
    let store = MemoryStore::new();
    let config = EngineConfig {
        default_annual_divisor: Some(365),
        ..EngineConfig::default()
    };
    let engine = BatchEngine::new(store, &config);
    let mut params = jan_params(OrganizationId::new(), BranchId::new());

    let err = engine.preview_accrual(&params).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingTaxRate));

    params.interest_tax_rate = Some(dec!(0.1));
    let preview = engine.preview_accrual(&params).await.unwrap();
    assert_eq!(preview.annual_divisor, 365);
    assert_eq!(preview.interest_tax_rate, dec!(0.1));
}

#[tokio::test]
async fn test_unknown_batch_is_not_found() {
    let fx = Fixture::new().await;
    let err = fx
        .engine
        .print_accrual(ecoop_shared::types::AccrualBatchId::new(), fx.user)
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

// ============================================================================
// Distribution
// ============================================================================

#[tokio::test]
async fn test_create_distribution_batch() {
    let fx = Fixture::new().await;
    let member = fx.member().await;

    let batch = fx
        .engine
        .create_distribution_batch(&fx.flat_input(&member, dec!(1000)), fx.user)
        .await
        .unwrap();
    assert_eq!(batch.total_amount, dec!(1000));

    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    let amounts: Vec<Decimal> = view.entries.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![dec!(0), dec!(250), dec!(250), dec!(500)]);
    assert_eq!(
        view.entries[0].recipient,
        Recipient::Primary {
            member_profile_id: member.id
        }
    );
    assert_eq!(view.beneficiaries.len(), 2);
}

#[tokio::test]
async fn test_preview_distribution_unknown_member() {
    let fx = Fixture::new().await;
    let ghost = MemberProfile {
        id: MemberProfileId::new(),
        organization_id: fx.org,
        branch_id: fx.branch,
        member_type_id: MemberTypeId::new(),
        membership_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    };
    let err = fx
        .engine
        .preview_distribution(&fx.flat_input(&ghost, dec!(1000)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_beneficiary_edits_recompute_shares() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let mut input = fx.flat_input(&member, dec!(1000));
    input.beneficiaries.clear();
    let batch = fx.engine.create_distribution_batch(&input, fx.user).await.unwrap();

    let added = fx
        .engine
        .add_beneficiary(batch.id, group(4, dec!(1)), fx.user)
        .await
        .unwrap();
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.entries.len(), 5);
    assert_eq!(view.entries[0].amount, dec!(0));
    assert!(view.entries[1..].iter().all(|e| e.amount == dec!(250)));

    fx.engine
        .update_beneficiary(added.id, group(3, dec!(1)), fx.user)
        .await
        .unwrap();
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.entries.len(), 4);
    let shares: Decimal = view.entries[1..].iter().map(|e| e.amount).sum();
    assert_eq!(shares, dec!(1000));
    assert_eq!(view.batch.total_amount, dec!(1000));

    fx.engine.delete_beneficiary(added.id, fx.user).await.unwrap();
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].amount, dec!(1000));
}

#[tokio::test]
async fn test_invalid_beneficiary_rejected() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let batch = fx
        .engine
        .create_distribution_batch(&fx.flat_input(&member, dec!(1000)), fx.user)
        .await
        .unwrap();

    let err = fx
        .engine
        .add_beneficiary(batch.id, group(0, dec!(1)), fx.user)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Distribution(DistributionError::EmptyBeneficiaryGroup)
    ));
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.beneficiaries.len(), 2);
}

#[tokio::test]
async fn test_oversized_ratio_rolls_back_edit() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let batch = fx
        .engine
        .create_distribution_batch(&fx.flat_input(&member, dec!(1000000000)), fx.user)
        .await
        .unwrap();

    let huge = Decimal::from_scientific("1e20").unwrap();
    let err = fx
        .engine
        .add_beneficiary(batch.id, group(1, huge), fx.user)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Distribution(DistributionError::AmountOverflow)
    ));
    assert_eq!(err.http_status_code(), 400);

    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.beneficiaries.len(), 2);
    assert_eq!(view.batch.total_amount, dec!(1000000000));
}

#[tokio::test]
async fn test_child_edits_require_draft() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let batch = fx
        .engine
        .create_distribution_batch(&fx.flat_input(&member, dec!(1000)), fx.user)
        .await
        .unwrap();
    fx.engine.print_distribution(batch.id, fx.user).await.unwrap();

    let err = fx
        .engine
        .add_beneficiary(batch.id, group(1, dec!(1)), fx.user)
        .await
        .unwrap_err();
    assert_conflict(&err, BatchState::Draft, BatchState::Printed);

    let row = AmountRowInput {
        month_from: 0,
        month_to: 12,
        amount: dec!(10),
    };
    let err = fx.engine.add_amount_row(batch.id, row, fx.user).await.unwrap_err();
    assert_conflict(&err, BatchState::Draft, BatchState::Printed);
}

#[tokio::test]
async fn test_table_lookup_batch() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let mut input = fx.flat_input(&member, dec!(0));
    input.beneficiaries.clear();
    input.computation_type = ComputationType::TableLookup;

    let err = fx
        .engine
        .create_distribution_batch(&input, fx.user)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Distribution(DistributionError::NoMatchingRow { .. })
    ));

    input.amount_table = vec![AmountRowInput {
        month_from: 0,
        month_to: 1200,
        amount: dec!(5000),
    }];
    let batch = fx.engine.create_distribution_batch(&input, fx.user).await.unwrap();
    assert_eq!(batch.total_amount, dec!(5000));

    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    let band = view.amount_table[0].id;
    fx.engine
        .update_amount_row(
            band,
            AmountRowInput {
                month_from: 0,
                month_to: 1200,
                amount: dec!(7500),
            },
            fx.user,
        )
        .await
        .unwrap();
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.batch.total_amount, dec!(7500));

    fx.engine.delete_amount_row(band, fx.user).await.unwrap();
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert!(view.entries.is_empty());
    assert_eq!(view.batch.total_amount, dec!(0));

    let err = fx.engine.print_distribution(batch.id, fx.user).await.unwrap_err();
    assert!(matches!(err, EngineError::NothingToPrint));

    let err = fx.engine.regenerate_distribution(batch.id, fx.user).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Distribution(DistributionError::NoMatchingRow { .. })
    ));
}

#[tokio::test]
async fn test_overlapping_amount_row_rejected() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let mut input = fx.flat_input(&member, dec!(100));
    input.amount_table = vec![AmountRowInput {
        month_from: 0,
        month_to: 24,
        amount: dec!(10),
    }];
    let batch = fx.engine.create_distribution_batch(&input, fx.user).await.unwrap();

    let overlap = AmountRowInput {
        month_from: 12,
        month_to: 36,
        amount: dec!(20),
    };
    let err = fx.engine.add_amount_row(batch.id, overlap, fx.user).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Distribution(DistributionError::OverlappingRows { .. })
    ));
    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.amount_table.len(), 1);
}

#[tokio::test]
async fn test_post_distribution() {
    let fx = Fixture::new().await;
    let member = fx.member().await;
    let payout = AccountId::new();
    let mut input = fx.flat_input(&member, dec!(1000));
    input.account_id = Some(payout);
    let batch = fx.engine.create_distribution_batch(&input, fx.user).await.unwrap();

    fx.engine.print_distribution(batch.id, fx.user).await.unwrap();
    let params = PostParams {
        check_voucher_number: Some("CV-0042".into()),
        ..post_params()
    };
    let receipt = fx
        .engine
        .post_distribution(batch.id, &params, fx.user)
        .await
        .unwrap();
    assert_eq!(receipt.rows_written, 6);
    assert_eq!(receipt.totals.credit, dec!(1000));

    let rows = fx.ledger_rows(batch.id.into_inner()).await;
    assert!(rows.iter().all(|r| r.source == EntrySource::MutualFund));
    assert!(rows
        .iter()
        .filter(|r| r.credit > Decimal::ZERO)
        .all(|r| r.account_id == payout));
    assert!(rows
        .iter()
        .all(|r| r.check_voucher_number.as_deref() == Some("CV-0042")));

    let view = fx.engine.distribution_view(batch.id).await.unwrap();
    assert_eq!(view.batch.state(), BatchState::Posted);

    let err = fx
        .engine
        .delete_beneficiary(view.beneficiaries[0].id, fx.user)
        .await
        .unwrap_err();
    assert_conflict(&err, BatchState::Draft, BatchState::Posted);

    let err = fx.engine.undo_print_distribution(batch.id, fx.user).await.unwrap_err();
    assert_conflict(&err, BatchState::Printed, BatchState::Posted);
}
