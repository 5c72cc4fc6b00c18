//! `SeaORM` Entity for savings_account_year_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "savings_account_year_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub savings_account_id: Uuid,
    pub from_year: i32,
    pub to_year: i32,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub rate: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::savings_accounts::Entity",
        from = "Column::SavingsAccountId",
        to = "super::savings_accounts::Column::Id"
    )]
    SavingsAccounts,
}

impl Related<super::savings_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
