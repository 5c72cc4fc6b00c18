//! `SeaORM` Entity for ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Option<Uuid>,
    pub employee_user_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub credit: Decimal,
    pub source: String,
    pub type_of_payment: String,
    pub transaction_id: Option<Uuid>,
    pub transaction_batch_id: Option<Uuid>,
    pub reference_batch_id: Option<Uuid>,
    pub entry_date: Date,
    pub check_voucher_number: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
