//! Money and rate rounding.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal` rounded half-to-even at a fixed scale.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Default number of decimal places for posted amounts.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Default number of decimal places for interest and tax rates.
pub const DEFAULT_RATE_SCALE: u32 = 6;

/// Largest scale a `Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Rounding precision for amounts and rates.
///
/// Uses banker's rounding (`MidpointNearestEven`) everywhere so that
/// repeated rounding of many small amounts does not drift in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyScale {
    /// Decimal places kept on monetary amounts.
    pub money: u32,
    /// Decimal places kept on rates.
    pub rate: u32,
}

impl Default for MoneyScale {
    fn default() -> Self {
        Self {
            money: DEFAULT_MONEY_SCALE,
            rate: DEFAULT_RATE_SCALE,
        }
    }
}

impl MoneyScale {
    /// Creates a scale with explicit money and rate precision.
    #[must_use]
    pub const fn new(money: u32, rate: u32) -> Self {
        Self { money, rate }
    }

    /// Rounds a monetary amount to the money scale.
    #[must_use]
    pub fn round_money(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.money, RoundingStrategy::MidpointNearestEven)
    }

    /// Rounds a rate to the rate scale.
    #[must_use]
    pub fn round_rate(&self, rate: Decimal) -> Decimal {
        rate.round_dp_with_strategy(self.rate, RoundingStrategy::MidpointNearestEven)
    }

    /// Smallest representable amount at the money scale (0.01 for scale 2).
    #[must_use]
    pub fn unit(&self) -> Decimal {
        Decimal::new(1, self.money)
    }
}
