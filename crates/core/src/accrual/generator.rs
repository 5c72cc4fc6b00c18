//! Interest accrual generation.
//!
//! Pure and side-effect free: the engine loads accounts and ledger rows, and
//! this module turns them into interest lines. Running it twice over the same
//! inputs yields the same lines.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use rust_decimal::Decimal;

use ecoop_shared::types::{AccountId, MemberProfileId, MoneyScale};

use crate::ledger::LedgerEntry;
use crate::reference::SavingsAccount;

use super::basis::{position_as_of, principal_basis};
use super::error::AccrualError;
use super::types::{AccrualComputation, AccrualLine, AccrualParams, AccrualTotals};

/// Key identifying a member's savings sub-ledger.
pub type SubLedgerKey = (AccountId, MemberProfileId);

/// Resolved settings for one accrual run.
#[derive(Debug, Clone, Copy)]
pub struct AccrualRun<'a> {
    /// The request.
    pub params: &'a AccrualParams,
    /// Day-count divisor from branch settings.
    pub annual_divisor: u32,
    /// Tax rate from the request or the branch default.
    pub interest_tax_rate: Decimal,
    /// Rounding precision.
    pub scale: MoneyScale,
}

/// Stateless interest accrual generator.
pub struct AccrualGenerator;

impl AccrualGenerator {
    /// Computes one interest line per eligible savings account.
    ///
    /// Accounts are eligible when they match the request's scope and filters,
    /// are open (unless closed accounts are included), and are not in
    /// `already_computed` (unless existing interest is included).
    ///
    /// # Errors
    ///
    /// Returns an error if the window is empty, the tax rate is out of range,
    /// or the divisor is zero.
    pub fn generate(
        run: &AccrualRun<'_>,
        accounts: &[SavingsAccount],
        ledger: &[LedgerEntry],
        already_computed: &HashSet<SubLedgerKey>,
    ) -> Result<AccrualComputation, AccrualError> {
        if run.annual_divisor == 0 {
            return Err(AccrualError::ZeroDivisor);
        }
        run.params.validate(run.interest_tax_rate)?;

        let params = run.params;
        let by_sub_ledger = group_sub_ledgers(ledger, params);

        let mut eligible: Vec<&SavingsAccount> = accounts
            .iter()
            .filter(|account| is_eligible(account, params, already_computed))
            .collect();
        eligible.sort_by_key(|account| (account.account_id, account.member_profile_id));

        let lines: Vec<AccrualLine> = eligible
            .par_iter()
            .map(|account| {
                let rows = by_sub_ledger
                    .get(&(account.account_id, account.member_profile_id))
                    .map_or(&[][..], Vec::as_slice);
                compute_line(run, account, rows)
            })
            .collect::<Result<_, _>>()?;

        let totals = AccrualTotals::from_lines(&lines).ok_or(AccrualError::TotalsOverflow)?;
        Ok(AccrualComputation {
            annual_divisor: run.annual_divisor,
            interest_tax_rate: run.interest_tax_rate,
            days: params.days(),
            lines,
            totals,
        })
    }
}

fn group_sub_ledgers<'a>(
    ledger: &'a [LedgerEntry],
    params: &AccrualParams,
) -> HashMap<SubLedgerKey, Vec<&'a LedgerEntry>> {
    let mut grouped: HashMap<SubLedgerKey, Vec<&LedgerEntry>> = HashMap::new();
    for entry in ledger {
        if entry.organization_id != params.organization_id
            || entry.branch_id != params.branch_id
            || entry.entry_date > params.new_computation_date
        {
            continue;
        }
        if let Some(member) = entry.member_profile_id {
            grouped.entry((entry.account_id, member)).or_default().push(entry);
        }
    }
    grouped
}

fn is_eligible(
    account: &SavingsAccount,
    params: &AccrualParams,
    already_computed: &HashSet<SubLedgerKey>,
) -> bool {
    account.organization_id == params.organization_id
        && account.branch_id == params.branch_id
        && params.account_id.is_none_or(|id| account.account_id == id)
        && params.member_type_id.is_none_or(|id| account.member_type_id == id)
        && (params.include_closed_account || !account.is_closed)
        && (params.include_existing_computed_interest
            || !already_computed.contains(&(account.account_id, account.member_profile_id)))
}

/// `basis * rate * days / divisor`, or `None` when it does not fit a `Decimal`.
fn simple_interest(basis: Decimal, rate: Decimal, days: i64, divisor: u32) -> Option<Decimal> {
    basis
        .checked_mul(rate)?
        .checked_mul(Decimal::from(days))?
        .checked_div(Decimal::from(divisor))
}

fn compute_line(
    run: &AccrualRun<'_>,
    account: &SavingsAccount,
    rows: &[&LedgerEntry],
) -> Result<AccrualLine, AccrualError> {
    let params = run.params;
    let scale = run.scale;
    let last = params.last_computation_date;
    let new = params.new_computation_date;
    let overflow = || AccrualError::AmountOverflow(account.account_id);

    let basis = principal_basis(params.balance_basis, rows, last, new, scale);
    let closing = position_as_of(rows, new);
    let rate = scale.round_rate(account.rate_for(closing));

    let (interest, tax) = if closing < account.minimum_balance {
        // Below minimum: no interest, and the maintenance charge if any.
        (-scale.round_money(account.charges), Decimal::ZERO)
    } else if basis.is_sign_negative() || basis.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let interest = simple_interest(basis, rate, params.days(), run.annual_divisor)
            .map(|raw| scale.round_money(raw))
            .ok_or_else(overflow)?;
        let tax = if account.is_taxable && interest > Decimal::ZERO {
            interest
                .checked_mul(run.interest_tax_rate)
                .map(|raw| scale.round_money(raw))
                .ok_or_else(overflow)?
        } else {
            Decimal::ZERO
        };
        (interest, tax)
    };

    let ending_balance = closing
        .checked_add(interest)
        .and_then(|balance| balance.checked_sub(tax))
        .ok_or_else(overflow)?;

    Ok(AccrualLine {
        account_id: account.account_id,
        member_profile_id: account.member_profile_id,
        principal_basis: basis,
        ending_balance,
        interest_rate: rate,
        // normalize -0 from a zero charge
        interest_amount: if interest.is_zero() { Decimal::ZERO } else { interest },
        interest_tax: tax,
    })
}
