//! Fund distribution generation.
//!
//! The principal `D` is split by weight across co-beneficiary groups. Each
//! group share is rounded down, split evenly across its individuals, and the
//! primary member receives whatever is left, so the lines always sum to `D`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ecoop_shared::types::MoneyScale;

use super::allocation::AllocationUtil;
use super::error::DistributionError;
use super::table::{elapsed_months, lookup, validate_table};
use super::types::{
    AmountRowInput, BeneficiaryInput, ComputationType, DistributionComputation, DistributionLine,
    LineRecipient,
};

/// Everything one distribution computation reads.
#[derive(Debug, Clone, Copy)]
pub struct DistributionRequest<'a> {
    /// Flat or table lookup.
    pub computation_type: ComputationType,
    /// Principal for flat batches.
    pub amount: Decimal,
    /// Primary member's join date.
    pub membership_date: NaiveDate,
    /// End of membership, when known.
    pub date_of_death: Option<NaiveDate>,
    /// Fallback end of membership.
    pub computation_date: NaiveDate,
    /// Co-beneficiary groups, in display order.
    pub beneficiaries: &'a [BeneficiaryInput],
    /// Age bands.
    pub amount_table: &'a [AmountRowInput],
}

/// Stateless fund distribution generator.
pub struct DistributionGenerator;

impl DistributionGenerator {
    /// Validates the principal, groups and table that a batch would persist.
    pub fn validate(
        amount: Decimal,
        beneficiaries: &[BeneficiaryInput],
        amount_table: &[AmountRowInput],
    ) -> Result<(), DistributionError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DistributionError::NegativeAmount(amount));
        }
        beneficiaries.iter().try_for_each(BeneficiaryInput::validate)?;
        validate_table(amount_table)
    }

    /// Resolves `D` and splits it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid inputs, or `NoMatchingRow` when
    /// a table lookup finds no band for the elapsed months.
    pub fn compute(
        request: &DistributionRequest<'_>,
        scale: MoneyScale,
    ) -> Result<DistributionComputation, DistributionError> {
        Self::validate(request.amount, request.beneficiaries, request.amount_table)?;

        let (principal, elapsed) = match request.computation_type {
            ComputationType::Flat => (request.amount, None),
            ComputationType::TableLookup => {
                let end = request.date_of_death.unwrap_or(request.computation_date);
                let months = elapsed_months(request.membership_date, end);
                (lookup(request.amount_table, months)?, Some(months))
            }
        };
        let principal = scale.round_money(principal);

        let lines = Self::split(principal, request.beneficiaries, scale)?;
        let total = lines.iter().map(|line| line.amount).sum();

        Ok(DistributionComputation {
            principal,
            elapsed_months: elapsed,
            lines,
            total,
        })
    }

    /// Splits an already-rounded principal; the primary line comes first.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` when the weighted shares leave the `Decimal`
    /// range.
    pub fn split(
        principal: Decimal,
        beneficiaries: &[BeneficiaryInput],
        scale: MoneyScale,
    ) -> Result<Vec<DistributionLine>, DistributionError> {
        let weights = beneficiaries
            .iter()
            .map(BeneficiaryInput::units)
            .collect::<Result<Vec<_>, _>>()?;
        let shares = AllocationUtil::floor_shares(principal, &weights, scale.money)
            .ok_or(DistributionError::AmountOverflow)?;

        let mut individual_lines = Vec::new();
        for (group, (beneficiary, share)) in beneficiaries.iter().zip(shares).enumerate() {
            let count = usize::try_from(beneficiary.number_of_members).unwrap_or(0);
            let parts = AllocationUtil::allocate_equal(share, count, scale.money);
            individual_lines.extend(parts.into_iter().zip(1u32..).map(|(amount, ordinal)| {
                DistributionLine {
                    recipient: LineRecipient::Beneficiary { group, ordinal },
                    amount,
                }
            }));
        }

        let allocated: Decimal = individual_lines.iter().map(|line| line.amount).sum();
        let mut lines = Vec::with_capacity(individual_lines.len() + 1);
        lines.push(DistributionLine {
            recipient: LineRecipient::Primary,
            amount: principal - allocated,
        });
        lines.extend(individual_lines);
        Ok(lines)
    }
}
