//! Post request parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ecoop_shared::types::AccountId;

use crate::ledger::PaymentType;

/// Operator-supplied parameters for posting a printed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParams {
    /// Contra account debited for interest and payouts.
    pub post_account_id: AccountId,
    /// Account credited with withheld tax; the post account when absent.
    pub tax_account_id: Option<AccountId>,
    /// Accounting date; the posting day when absent.
    pub entry_date: Option<NaiveDate>,
    /// Check voucher, which makes the rows check payments.
    pub check_voucher_number: Option<String>,
}

impl PostParams {
    /// Parameters with only the contra account set.
    #[must_use]
    pub const fn new(post_account_id: AccountId) -> Self {
        Self {
            post_account_id,
            tax_account_id: None,
            entry_date: None,
            check_voucher_number: None,
        }
    }

    /// Voucher number with surrounding whitespace removed, if non-empty.
    #[must_use]
    pub fn voucher(&self) -> Option<&str> {
        self.check_voucher_number
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Check when a voucher is given, cash otherwise.
    #[must_use]
    pub fn payment_type(&self) -> PaymentType {
        if self.voucher().is_some() {
            PaymentType::Check
        } else {
            PaymentType::Cash
        }
    }

    /// Account receiving withheld tax.
    #[must_use]
    pub fn tax_account(&self) -> AccountId {
        self.tax_account_id.unwrap_or(self.post_account_id)
    }
}
