//! Ledger, reference and batch tables for the computation engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOWN_SQL).await?;
        Ok(())
    }
}

const UP_SQL: &str = r"
-- ============================================================
-- LEDGER (append-only)
-- ============================================================

CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    account_id UUID NOT NULL,
    member_profile_id UUID,
    employee_user_id UUID,
    debit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    source VARCHAR(32) NOT NULL,
    type_of_payment VARCHAR(16) NOT NULL,
    transaction_id UUID,
    transaction_batch_id UUID,
    reference_batch_id UUID,
    entry_date DATE NOT NULL,
    check_voucher_number VARCHAR(64),
    description TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT ledger_entries_one_side CHECK (
        debit >= 0 AND credit >= 0 AND (debit = 0) <> (credit = 0)
    )
);

CREATE INDEX idx_ledger_entries_account
    ON ledger_entries (organization_id, branch_id, account_id, entry_date);
CREATE INDEX idx_ledger_entries_member
    ON ledger_entries (member_profile_id, account_id)
    WHERE member_profile_id IS NOT NULL;
CREATE INDEX idx_ledger_entries_reference
    ON ledger_entries (reference_batch_id)
    WHERE reference_batch_id IS NOT NULL;

-- ============================================================
-- REFERENCE DATA
-- ============================================================

CREATE TABLE branch_settings (
    branch_id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    annual_divisor INTEGER CHECK (annual_divisor > 0),
    interest_tax_rate NUMERIC(9, 6) CHECK (interest_tax_rate BETWEEN 0 AND 1)
);

CREATE TABLE member_profiles (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    member_type_id UUID NOT NULL,
    membership_date DATE NOT NULL
);

CREATE TABLE savings_accounts (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    account_id UUID NOT NULL,
    member_profile_id UUID NOT NULL REFERENCES member_profiles(id),
    member_type_id UUID NOT NULL,
    member_type_since DATE,
    interest_rate NUMERIC(9, 6) NOT NULL DEFAULT 0,
    interest_type VARCHAR(16) NOT NULL DEFAULT 'amount'
        CHECK (interest_type IN ('none', 'year', 'date', 'amount')),
    minimum_balance NUMERIC(20, 4) NOT NULL DEFAULT 0,
    charges NUMERIC(20, 4) NOT NULL DEFAULT 0,
    is_taxable BOOLEAN NOT NULL DEFAULT TRUE,
    is_closed BOOLEAN NOT NULL DEFAULT FALSE,
    UNIQUE (account_id, member_profile_id)
);

CREATE TABLE savings_account_rate_tiers (
    id UUID PRIMARY KEY,
    savings_account_id UUID NOT NULL REFERENCES savings_accounts(id) ON DELETE CASCADE,
    from_balance NUMERIC(20, 4) NOT NULL,
    to_balance NUMERIC(20, 4),
    rate NUMERIC(9, 6) NOT NULL
);

CREATE TABLE savings_account_year_rates (
    id UUID PRIMARY KEY,
    savings_account_id UUID NOT NULL REFERENCES savings_accounts(id) ON DELETE CASCADE,
    from_year INTEGER NOT NULL,
    to_year INTEGER NOT NULL,
    rate NUMERIC(9, 6) NOT NULL,
    CHECK (from_year <= to_year)
);

CREATE TABLE savings_account_date_rates (
    id UUID PRIMARY KEY,
    savings_account_id UUID NOT NULL REFERENCES savings_accounts(id) ON DELETE CASCADE,
    from_date DATE NOT NULL,
    to_date DATE NOT NULL,
    rate NUMERIC(9, 6) NOT NULL,
    CHECK (from_date <= to_date)
);

-- ============================================================
-- SAVINGS INTEREST ACCRUAL
-- ============================================================

CREATE TABLE accrual_batches (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    document_no VARCHAR(64) NOT NULL,
    last_computation_date DATE NOT NULL,
    new_computation_date DATE NOT NULL,
    account_id UUID,
    member_type_id UUID,
    include_closed_account BOOLEAN NOT NULL DEFAULT FALSE,
    include_existing_computed_interest BOOLEAN NOT NULL DEFAULT FALSE,
    balance_basis VARCHAR(16) NOT NULL,
    interest_tax_rate NUMERIC(9, 6) NOT NULL,
    annual_divisor INTEGER NOT NULL CHECK (annual_divisor > 0),
    total_interest NUMERIC(20, 4) NOT NULL DEFAULT 0,
    total_tax NUMERIC(20, 4) NOT NULL DEFAULT 0,
    printed_by UUID,
    printed_date TIMESTAMPTZ,
    posted_by UUID,
    posted_date TIMESTAMPTZ,
    post_account_id UUID,
    check_voucher_number VARCHAR(64),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by UUID NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by UUID NOT NULL,
    CONSTRAINT accrual_batches_window CHECK (new_computation_date > last_computation_date),
    CONSTRAINT accrual_batches_posted_printed CHECK (posted_date IS NULL OR printed_date IS NOT NULL)
);

CREATE INDEX idx_accrual_batches_window
    ON accrual_batches (organization_id, branch_id, last_computation_date, new_computation_date);

CREATE TABLE accrual_entries (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES accrual_batches(id) ON DELETE CASCADE,
    account_id UUID NOT NULL,
    member_profile_id UUID NOT NULL,
    principal_basis NUMERIC(20, 4) NOT NULL,
    ending_balance NUMERIC(20, 4) NOT NULL,
    interest_rate NUMERIC(9, 6) NOT NULL,
    interest_amount NUMERIC(20, 4) NOT NULL,
    interest_tax NUMERIC(20, 4) NOT NULL,
    UNIQUE (batch_id, account_id, member_profile_id)
);

-- ============================================================
-- MUTUAL FUND DISTRIBUTION
-- ============================================================

CREATE TABLE distribution_batches (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    member_profile_id UUID NOT NULL,
    member_type_id UUID,
    name VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    computation_type VARCHAR(32) NOT NULL,
    date_of_death DATE,
    extension_only BOOLEAN NOT NULL DEFAULT FALSE,
    account_id UUID,
    computation_date DATE NOT NULL,
    total_amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    printed_by UUID,
    printed_date TIMESTAMPTZ,
    posted_by UUID,
    posted_date TIMESTAMPTZ,
    post_account_id UUID,
    check_voucher_number VARCHAR(64),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by UUID NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by UUID NOT NULL,
    CONSTRAINT distribution_batches_posted_printed CHECK (posted_date IS NULL OR printed_date IS NOT NULL)
);

CREATE TABLE distribution_beneficiaries (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES distribution_batches(id) ON DELETE CASCADE,
    member_type_id UUID NOT NULL,
    number_of_members INTEGER NOT NULL CHECK (number_of_members > 0),
    ratio NUMERIC(20, 6) NOT NULL CHECK (ratio > 0)
);

CREATE TABLE distribution_amount_rows (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES distribution_batches(id) ON DELETE CASCADE,
    month_from INTEGER NOT NULL CHECK (month_from >= 0),
    month_to INTEGER NOT NULL CHECK (month_to >= month_from),
    amount NUMERIC(20, 4) NOT NULL
);

CREATE TABLE distribution_entries (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES distribution_batches(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    recipient_kind VARCHAR(16) NOT NULL CHECK (recipient_kind IN ('primary', 'beneficiary')),
    member_profile_id UUID,
    beneficiary_id UUID,
    ordinal INTEGER,
    amount NUMERIC(20, 4) NOT NULL,
    UNIQUE (batch_id, position)
);
";

const DOWN_SQL: &str = r"
DROP TABLE IF EXISTS distribution_entries;
DROP TABLE IF EXISTS distribution_amount_rows;
DROP TABLE IF EXISTS distribution_beneficiaries;
DROP TABLE IF EXISTS distribution_batches;
DROP TABLE IF EXISTS accrual_entries;
DROP TABLE IF EXISTS accrual_batches;
DROP TABLE IF EXISTS savings_account_date_rates;
DROP TABLE IF EXISTS savings_account_year_rates;
DROP TABLE IF EXISTS savings_account_rate_tiers;
DROP TABLE IF EXISTS savings_accounts;
DROP TABLE IF EXISTS member_profiles;
DROP TABLE IF EXISTS branch_settings;
DROP TABLE IF EXISTS ledger_entries;
";
