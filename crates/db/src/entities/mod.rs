//! `SeaORM` entity definitions.

pub mod accrual_batches;
pub mod accrual_entries;
pub mod branch_settings;
pub mod distribution_amount_rows;
pub mod distribution_batches;
pub mod distribution_beneficiaries;
pub mod distribution_entries;
pub mod ledger_entries;
pub mod member_profiles;
pub mod savings_account_date_rates;
pub mod savings_account_rate_tiers;
pub mod savings_account_year_rates;
pub mod savings_accounts;
