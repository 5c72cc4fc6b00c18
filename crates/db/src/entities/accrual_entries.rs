//! `SeaORM` Entity for accrual_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accrual_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub principal_basis: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub ending_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub interest_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub interest_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub interest_tax: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accrual_batches::Entity",
        from = "Column::BatchId",
        to = "super::accrual_batches::Column::Id"
    )]
    AccrualBatches,
}

impl Related<super::accrual_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccrualBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
