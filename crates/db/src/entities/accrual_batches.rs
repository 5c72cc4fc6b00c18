//! `SeaORM` Entity for accrual_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accrual_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub document_no: String,
    pub last_computation_date: Date,
    pub new_computation_date: Date,
    pub account_id: Option<Uuid>,
    pub member_type_id: Option<Uuid>,
    pub include_closed_account: bool,
    pub include_existing_computed_interest: bool,
    pub balance_basis: String,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub interest_tax_rate: Decimal,
    pub annual_divisor: i32,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub total_interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub total_tax: Decimal,
    pub printed_by: Option<Uuid>,
    pub printed_date: Option<DateTimeWithTimeZone>,
    pub posted_by: Option<Uuid>,
    pub posted_date: Option<DateTimeWithTimeZone>,
    pub post_account_id: Option<Uuid>,
    pub check_voucher_number: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Uuid,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accrual_entries::Entity")]
    AccrualEntries,
}

impl Related<super::accrual_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccrualEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
