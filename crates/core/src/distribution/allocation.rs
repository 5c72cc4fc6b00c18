//! Equal split of an amount using the Largest Remainder Method.
//!
//! The sum of the parts always equals the (rounded) total: no cent is lost
//! or created.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Allocate `total` equally across `count` recipients.
    ///
    /// Each part is rounded down to `decimal_places`; the leftover units go to
    /// the first recipients, one each.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use ecoop_core::distribution::AllocationUtil;
    ///
    /// // 100 / 3 = [33.34, 33.33, 33.33], sum = 100.00
    /// let result = AllocationUtil::allocate_equal(dec!(100), 3, 2);
    /// assert_eq!(result.iter().sum::<rust_decimal::Decimal>(), dec!(100));
    /// ```
    #[must_use]
    pub fn allocate_equal(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }

        let total_rounded =
            total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
        if count == 1 {
            return vec![total_rounded];
        }

        let count_dec = Decimal::from(count);
        let unit = Decimal::new(1, decimal_places);

        let base = (total_rounded / count_dec)
            .round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        let remainder = total_rounded - base * count_dec;

        let extra_count = (remainder / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_usize()
            .unwrap_or(0);

        (0..count)
            .map(|i| if i < extra_count { base + unit } else { base })
            .collect()
    }

    /// Weighted shares of `total`, each rounded down to `decimal_places`.
    ///
    /// The shares never sum to more than `total`; the caller owns the remainder.
    /// Returns `None` when an intermediate product leaves the `Decimal` range.
    #[must_use]
    pub fn floor_shares(
        total: Decimal,
        weights: &[Decimal],
        decimal_places: u32,
    ) -> Option<Vec<Decimal>> {
        let weight_sum = weights
            .iter()
            .try_fold(Decimal::ZERO, |sum, w| sum.checked_add(*w))?;
        if weight_sum <= Decimal::ZERO {
            return Some(vec![Decimal::ZERO; weights.len()]);
        }
        weights
            .iter()
            .map(|w| {
                let share = total.checked_mul(*w)?.checked_div(weight_sum)?;
                Some(share.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // =========================================================================
    // allocate_equal tests
    // =========================================================================

    #[test]
    fn test_allocate_equal_empty() {
        assert!(AllocationUtil::allocate_equal(dec!(100), 0, 2).is_empty());
    }

    #[test]
    fn test_allocate_equal_single() {
        assert_eq!(AllocationUtil::allocate_equal(dec!(100), 1, 2), vec![dec!(100)]);
    }

    #[test]
    fn test_allocate_equal_thirds() {
        let result = AllocationUtil::allocate_equal(dec!(100), 3, 2);
        assert_eq!(result, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_allocate_equal_sum_invariant() {
        let test_cases = [
            (dec!(100), 3),
            (dec!(100), 7),
            (dec!(1000), 3),
            (dec!(0.01), 3),
            (dec!(999.99), 7),
        ];

        for (total, count) in test_cases {
            let result = AllocationUtil::allocate_equal(total, count, 2);
            assert_eq!(
                result.iter().sum::<Decimal>(),
                total,
                "Sum invariant failed for total={total}, count={count}"
            );
        }
    }

    // =========================================================================
    // floor_shares tests
    // =========================================================================

    #[test]
    fn test_floor_shares_never_exceed_total() {
        let shares = AllocationUtil::floor_shares(dec!(0.02), &[dec!(1), dec!(1), dec!(1)], 2);
        assert_eq!(shares, Some(vec![dec!(0.00), dec!(0.00), dec!(0.00)]));

        let shares = AllocationUtil::floor_shares(dec!(1000), &[dec!(1), dec!(1), dec!(1)], 2);
        assert_eq!(shares, Some(vec![dec!(333.33), dec!(333.33), dec!(333.33)]));
    }

    #[test]
    fn test_floor_shares_exact_weights() {
        let shares = AllocationUtil::floor_shares(dec!(1000), &[dec!(2), dec!(2)], 2);
        assert_eq!(shares, Some(vec![dec!(500), dec!(500)]));
    }

    #[test]
    fn test_floor_shares_zero_weights() {
        let shares = AllocationUtil::floor_shares(dec!(1000), &[dec!(0)], 2);
        assert_eq!(shares, Some(vec![dec!(0)]));
    }

    #[test]
    fn test_floor_shares_overflow_is_none() {
        let huge = Decimal::from_scientific("1e20").unwrap();
        assert_eq!(
            AllocationUtil::floor_shares(dec!(1000000000), &[huge, dec!(1)], 2),
            None
        );
        assert_eq!(AllocationUtil::floor_shares(dec!(1), &[Decimal::MAX, Decimal::MAX], 2), None);
    }
}
