//! Property-based tests for the distribution generator.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use ecoop_shared::types::{MemberTypeId, MoneyScale};

use super::generator::{DistributionGenerator, DistributionRequest};
use super::types::{BeneficiaryInput, ComputationType, LineRecipient};

/// Strategy for principals in cents.
fn principal_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for beneficiary groups with positive ratios.
fn groups_strategy() -> impl Strategy<Value = Vec<BeneficiaryInput>> {
    prop::collection::vec((1u32..6, 1i64..500i64), 0..6).prop_map(|groups| {
        groups
            .into_iter()
            .map(|(number_of_members, ratio)| BeneficiaryInput {
                member_type_id: MemberTypeId::new(),
                number_of_members,
                ratio: Decimal::new(ratio, 2),
            })
            .collect()
    })
}

fn request<'a>(amount: Decimal, groups: &'a [BeneficiaryInput]) -> DistributionRequest<'a> {
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    DistributionRequest {
        computation_type: ComputationType::Flat,
        amount,
        membership_date: day,
        date_of_death: None,
        computation_date: day,
        beneficiaries: groups,
        amount_table: &[],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Lines always sum exactly to the principal
    // =========================================================================

    #[test]
    fn prop_lines_sum_to_principal(
        amount in principal_strategy(),
        groups in groups_strategy(),
    ) {
        let result =
            DistributionGenerator::compute(&request(amount, &groups), MoneyScale::default())
                .unwrap();
        let sum: Decimal = result.lines.iter().map(|l| l.amount).sum();
        prop_assert_eq!(sum, amount);
        prop_assert_eq!(result.total, amount);
    }

    // =========================================================================
    // One line per individual plus the primary, none negative
    // =========================================================================

    #[test]
    fn prop_one_line_per_individual(
        amount in principal_strategy(),
        groups in groups_strategy(),
    ) {
        let result =
            DistributionGenerator::compute(&request(amount, &groups), MoneyScale::default())
                .unwrap();
        let individuals: u32 = groups.iter().map(|g| g.number_of_members).sum();

        prop_assert_eq!(result.lines.len(), individuals as usize + 1);
        prop_assert_eq!(result.lines[0].recipient, LineRecipient::Primary);
        for line in &result.lines {
            prop_assert!(line.amount >= Decimal::ZERO);
        }
    }

    // =========================================================================
    // Individuals of one group differ by at most one cent
    // =========================================================================

    #[test]
    fn prop_group_members_share_evenly(
        amount in principal_strategy(),
        groups in groups_strategy(),
    ) {
        let result =
            DistributionGenerator::compute(&request(amount, &groups), MoneyScale::default())
                .unwrap();
        for index in 0..groups.len() {
            let amounts: Vec<Decimal> = result
                .lines
                .iter()
                .filter(|l| {
                    matches!(l.recipient, LineRecipient::Beneficiary { group, .. } if group == index)
                })
                .map(|l| l.amount)
                .collect();
            let max = amounts.iter().max().copied().unwrap_or_default();
            let min = amounts.iter().min().copied().unwrap_or_default();
            prop_assert!(max - min <= Decimal::new(1, 2));
        }
    }
}
