//! Balance aggregation over ledger entries.
//!
//! The aggregator is a pure fold: it never filters. Callers narrow the entry
//! set first (see [`LedgerFilter`](super::LedgerFilter)) and then reduce it.

use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;

/// Which side increases an account's position.
///
/// - Asset/Expense: position += debit - credit (debit-normal)
/// - Liability/Equity/Revenue, including member savings deposits:
///   position += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    DebitNormal,
    /// Credit-normal accounts (Liability, Equity, Revenue, savings deposits).
    CreditNormal,
}

impl NormalBalance {
    /// Calculates the position change for one debit/credit pair.
    #[must_use]
    pub fn calculate_balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit - credit,
            Self::CreditNormal => credit - debit,
        }
    }
}

/// Debit and credit totals of a set of ledger entries.
///
/// `balance` is always `debit - credit`; positive means a net debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Net balance (debit - credit).
    pub balance: Decimal,
}

impl BalanceSummary {
    /// The empty summary.
    pub const ZERO: Self = Self {
        debit: Decimal::ZERO,
        credit: Decimal::ZERO,
        balance: Decimal::ZERO,
    };

    /// Creates a summary from raw totals.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            balance: debit - credit,
        }
    }

    /// Reduces a set of entries into totals. Empty input yields [`Self::ZERO`].
    pub fn aggregate<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries
            .into_iter()
            .fold(Self::ZERO, |mut acc, entry| {
                acc.add_entry(entry);
                acc
            })
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Decimal) {
        self.debit += amount;
        self.balance = self.debit - self.credit;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Decimal) {
        self.credit += amount;
        self.balance = self.debit - self.credit;
    }

    /// Adds both sides of one entry.
    pub fn add_entry(&mut self, entry: &LedgerEntry) {
        self.debit += entry.debit;
        self.credit += entry.credit;
        self.balance = self.debit - self.credit;
    }

    /// Merges two partial summaries.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self::new(self.debit + other.debit, self.credit + other.credit)
    }

    /// Account position under the given normal balance.
    #[must_use]
    pub fn position(&self, normal: NormalBalance) -> Decimal {
        normal.calculate_balance_change(self.debit, self.credit)
    }
}

impl Add for BalanceSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.combine(rhs)
    }
}
