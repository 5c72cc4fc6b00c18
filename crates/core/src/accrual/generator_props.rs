//! Property-based tests for the accrual generator.

use std::collections::HashSet;

use proptest::prelude::*;
use rust_decimal::Decimal;

use ecoop_shared::types::{AccountId, BranchId, MoneyScale, OrganizationId};

use crate::accrual::generator::fixtures::{deposit, jan_params, savings};
use crate::accrual::generator::{AccrualGenerator, AccrualRun};
use crate::ledger::LedgerEntry;
use crate::reference::SavingsAccount;

/// Strategy for account balances in cents.
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for tax rates between 0 and 1 at four decimal places.
fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn book(balances: &[Decimal]) -> (OrganizationId, BranchId, Vec<SavingsAccount>, Vec<LedgerEntry>) {
    let (org, branch) = (OrganizationId::new(), BranchId::new());
    let account_id = AccountId::new();
    let accounts: Vec<SavingsAccount> = balances
        .iter()
        .map(|_| savings(org, branch, account_id))
        .collect();
    let ledger = accounts
        .iter()
        .zip(balances)
        .filter(|(_, balance)| !balance.is_zero())
        .map(|(account, balance)| deposit(account, *balance))
        .collect();
    (org, branch, accounts, ledger)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Generation is idempotent over identical inputs
    // =========================================================================

    #[test]
    fn prop_generation_is_idempotent(
        balances in prop::collection::vec(balance_strategy(), 0..12),
        tax in tax_rate_strategy(),
    ) {
        let (org, branch, accounts, ledger) = book(&balances);
        let params = jan_params(org, branch);
        let run = AccrualRun {
            params: &params,
            annual_divisor: 365,
            interest_tax_rate: tax,
            scale: MoneyScale::default(),
        };

        let first = AccrualGenerator::generate(&run, &accounts, &ledger, &HashSet::new()).unwrap();
        let second = AccrualGenerator::generate(&run, &accounts, &ledger, &HashSet::new()).unwrap();
        prop_assert_eq!(first, second);
    }

    // =========================================================================
    // One line per eligible account, totals are plain sums, tax never exceeds interest
    // =========================================================================

    #[test]
    fn prop_lines_and_totals(
        balances in prop::collection::vec(balance_strategy(), 0..12),
        tax in tax_rate_strategy(),
    ) {
        let (org, branch, accounts, ledger) = book(&balances);
        let params = jan_params(org, branch);
        let run = AccrualRun {
            params: &params,
            annual_divisor: 360,
            interest_tax_rate: tax,
            scale: MoneyScale::default(),
        };

        let result = AccrualGenerator::generate(&run, &accounts, &ledger, &HashSet::new()).unwrap();
        prop_assert_eq!(result.lines.len(), accounts.len());

        let interest: Decimal = result.lines.iter().map(|l| l.interest_amount).sum();
        let taxes: Decimal = result.lines.iter().map(|l| l.interest_tax).sum();
        prop_assert_eq!(result.totals.total_interest, interest);
        prop_assert_eq!(result.totals.total_tax, taxes);

        for line in &result.lines {
            prop_assert!(line.interest_amount >= Decimal::ZERO);
            prop_assert!(line.interest_tax <= line.interest_amount);
            prop_assert!(line.interest_amount.scale() <= 2);
        }
    }
}
