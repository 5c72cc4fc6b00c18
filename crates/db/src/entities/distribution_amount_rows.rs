//! `SeaORM` Entity for distribution_amount_rows table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "distribution_amount_rows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub month_from: i32,
    pub month_to: i32,
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
