//! Age-based amount table: validation, lookup and elapsed months.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::error::DistributionError;
use super::types::AmountRowInput;

/// Whole months from `from` to `to`; zero when `to` precedes `from`.
#[must_use]
pub fn elapsed_months(from: NaiveDate, to: NaiveDate) -> u32 {
    let years = to.year() - from.year();
    let months = i64::from(years) * 12 + i64::from(to.month()) - i64::from(from.month());
    let months = if to.day() < from.day() { months - 1 } else { months };
    u32::try_from(months.max(0)).unwrap_or(u32::MAX)
}

/// Rejects inverted rows, negative amounts and overlapping month ranges.
pub fn validate_table(rows: &[AmountRowInput]) -> Result<(), DistributionError> {
    for row in rows {
        if row.month_from > row.month_to {
            return Err(DistributionError::InvertedRow {
                month_from: row.month_from,
                month_to: row.month_to,
            });
        }
        if row.amount.is_sign_negative() && !row.amount.is_zero() {
            return Err(DistributionError::NegativeRowAmount(row.amount));
        }
    }

    let mut sorted: Vec<&AmountRowInput> = rows.iter().collect();
    sorted.sort_by_key(|row| (row.month_from, row.month_to));
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if second.month_from <= first.month_to {
            return Err(DistributionError::OverlappingRows {
                first_from: first.month_from,
                first_to: first.month_to,
                second_from: second.month_from,
                second_to: second.month_to,
            });
        }
    }
    Ok(())
}

/// Amount of the row covering `months`.
pub fn lookup(rows: &[AmountRowInput], months: u32) -> Result<Decimal, DistributionError> {
    rows.iter()
        .find(|row| row.month_from <= months && months <= row.month_to)
        .map(|row| row.amount)
        .ok_or(DistributionError::NoMatchingRow { months })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn row(month_from: u32, month_to: u32, amount: Decimal) -> AmountRowInput {
        AmountRowInput {
            month_from,
            month_to,
            amount,
        }
    }

    #[rstest]
    #[case((2020, 1, 15), (2020, 1, 31), 0)]
    #[case((2020, 1, 15), (2020, 2, 14), 0)]
    #[case((2020, 1, 15), (2020, 2, 15), 1)]
    #[case((2020, 1, 15), (2023, 7, 20), 42)]
    #[case((2020, 5, 1), (2019, 1, 1), 0)]
    fn test_elapsed_months(
        #[case] from: (i32, u32, u32),
        #[case] to: (i32, u32, u32),
        #[case] expected: u32,
    ) {
        let from = NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap();
        let to = NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap();
        assert_eq!(elapsed_months(from, to), expected);
    }

    #[test]
    fn test_validate_accepts_disjoint_rows() {
        let rows = vec![row(13, 24, dec!(5000)), row(0, 12, dec!(2000))];
        assert!(validate_table(&rows).is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_and_inversion() {
        let overlapping = vec![row(0, 12, dec!(2000)), row(12, 24, dec!(5000))];
        assert!(matches!(
            validate_table(&overlapping),
            Err(DistributionError::OverlappingRows { .. })
        ));

        let inverted = vec![row(24, 12, dec!(5000))];
        assert_eq!(
            validate_table(&inverted),
            Err(DistributionError::InvertedRow {
                month_from: 24,
                month_to: 12
            })
        );

        let negative = vec![row(0, 12, dec!(-1))];
        assert_eq!(
            validate_table(&negative),
            Err(DistributionError::NegativeRowAmount(dec!(-1)))
        );
    }

    #[test]
    fn test_lookup() {
        let rows = vec![row(0, 12, dec!(2000)), row(13, 24, dec!(5000))];
        assert_eq!(lookup(&rows, 12), Ok(dec!(2000)));
        assert_eq!(lookup(&rows, 13), Ok(dec!(5000)));
        assert_eq!(lookup(&rows, 25), Err(DistributionError::NoMatchingRow { months: 25 }));
    }
}
