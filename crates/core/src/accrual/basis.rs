//! Principal basis from a member's savings sub-ledger.
//!
//! Savings deposits are credit-normal, so positions are `credit - debit`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ecoop_shared::types::MoneyScale;

use crate::ledger::{BalanceSummary, LedgerEntry, NormalBalance};

use super::types::BalanceBasis;

const SAVINGS: NormalBalance = NormalBalance::CreditNormal;

/// Position of the sub-ledger at the end of `date`.
pub fn position_as_of(entries: &[&LedgerEntry], date: NaiveDate) -> Decimal {
    BalanceSummary::aggregate(entries.iter().copied().filter(|e| e.entry_date <= date))
        .position(SAVINGS)
}

/// End-of-day positions for each day in `(last, new]`.
pub fn daily_positions(entries: &[&LedgerEntry], last: NaiveDate, new: NaiveDate) -> Vec<Decimal> {
    let mut deltas: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.entry_date > last && e.entry_date <= new) {
        *deltas.entry(entry.entry_date).or_default() +=
            SAVINGS.calculate_balance_change(entry.debit, entry.credit);
    }

    let mut running = position_as_of(entries, last);
    last.iter_days()
        .skip(1)
        .take_while(|day| *day <= new)
        .map(|day| {
            if let Some(delta) = deltas.get(&day) {
                running += *delta;
            }
            running
        })
        .collect()
}

/// Balance the interest is computed on.
pub fn principal_basis(
    basis: BalanceBasis,
    entries: &[&LedgerEntry],
    last: NaiveDate,
    new: NaiveDate,
    scale: MoneyScale,
) -> Decimal {
    match basis {
        BalanceBasis::Opening => position_as_of(entries, last),
        BalanceBasis::Ending => position_as_of(entries, new),
        BalanceBasis::LowestDaily => daily_positions(entries, last, new)
            .into_iter()
            .min()
            .unwrap_or_else(|| position_as_of(entries, last)),
        BalanceBasis::AverageDaily => {
            let days = daily_positions(entries, last, new);
            if days.is_empty() {
                return position_as_of(entries, last);
            }
            let sum: Decimal = days.iter().copied().sum();
            scale.round_money(sum / Decimal::from(days.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::fixtures::entry;
    use ecoop_shared::types::AccountId;
    use rust_decimal_macros::dec;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn sample() -> Vec<LedgerEntry> {
        let account = AccountId::new();
        vec![
            // 1000 deposited before the window
            entry(account, None, dec!(0), dec!(1000), d(1, 1)),
            // 400 withdrawn on day 2 of the window
            entry(account, None, dec!(400), dec!(0), d(1, 3)),
            // 900 deposited on the last day
            entry(account, None, dec!(0), dec!(900), d(1, 5)),
            // after the window
            entry(account, None, dec!(0), dec!(5000), d(1, 6)),
        ]
    }

    #[test]
    fn test_daily_positions() {
        let rows = sample();
        let refs: Vec<&LedgerEntry> = rows.iter().collect();
        let days = daily_positions(&refs, d(1, 1), d(1, 5));
        assert_eq!(days, vec![dec!(1000), dec!(600), dec!(600), dec!(1500)]);
    }

    #[test]
    fn test_each_basis() {
        let rows = sample();
        let refs: Vec<&LedgerEntry> = rows.iter().collect();
        let scale = MoneyScale::default();
        let basis = |kind| principal_basis(kind, &refs, d(1, 1), d(1, 5), scale);

        assert_eq!(basis(BalanceBasis::Opening), dec!(1000));
        assert_eq!(basis(BalanceBasis::Ending), dec!(1500));
        assert_eq!(basis(BalanceBasis::LowestDaily), dec!(600));
        // (1000 + 600 + 600 + 1500) / 4
        assert_eq!(basis(BalanceBasis::AverageDaily), dec!(925));
    }

    #[test]
    fn test_empty_ledger_is_zero() {
        let scale = MoneyScale::default();
        let empty = |kind| principal_basis(kind, &[], d(1, 1), d(1, 31), scale);
        assert_eq!(empty(BalanceBasis::AverageDaily), dec!(0));
        assert_eq!(empty(BalanceBasis::LowestDaily), dec!(0));
    }
}
