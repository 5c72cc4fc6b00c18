//! `SeaORM` Entity for distribution_beneficiaries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "distribution_beneficiaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub member_type_id: Uuid,
    pub number_of_members: i32,
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub ratio: Decimal,
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
