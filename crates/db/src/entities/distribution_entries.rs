//! `SeaORM` Entity for distribution_entries table.
//!
//! `recipient_kind` is `primary` (with `member_profile_id`) or `beneficiary`
//! (with `beneficiary_id` and `ordinal`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "distribution_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub position: i32,
    pub recipient_kind: String,
    pub member_profile_id: Option<Uuid>,
    pub beneficiary_id: Option<Uuid>,
    pub ordinal: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::distribution_batches::Entity",
        from = "Column::BatchId",
        to = "super::distribution_batches::Column::Id"
    )]
    DistributionBatches,
}

impl Related<super::distribution_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DistributionBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
