//! `SeaORM` Entity for distribution_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "distribution_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub member_profile_id: Uuid,
    pub member_type_id: Option<Uuid>,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub amount: Decimal,
    pub computation_type: String,
    pub date_of_death: Option<Date>,
    pub extension_only: bool,
    pub account_id: Option<Uuid>,
    pub computation_date: Date,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub total_amount: Decimal,
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
    #[sea_orm(has_many = "super::distribution_beneficiaries::Entity")]
    Beneficiaries,
    #[sea_orm(has_many = "super::distribution_amount_rows::Entity")]
    AmountRows,
    #[sea_orm(has_many = "super::distribution_entries::Entity")]
    Entries,
}

impl Related<super::distribution_beneficiaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beneficiaries.def()
    }
}

impl Related<super::distribution_amount_rows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AmountRows.def()
    }
}

impl Related<super::distribution_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
