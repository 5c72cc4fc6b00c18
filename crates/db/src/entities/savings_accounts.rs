//! `SeaORM` Entity for savings_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "savings_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Uuid,
    pub member_type_id: Uuid,
    pub member_type_since: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub interest_rate: Decimal,
    pub interest_type: String,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub minimum_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub charges: Decimal,
    pub is_taxable: bool,
    pub is_closed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::savings_account_rate_tiers::Entity")]
    RateTiers,
    #[sea_orm(has_many = "super::savings_account_year_rates::Entity")]
    YearRates,
    #[sea_orm(has_many = "super::savings_account_date_rates::Entity")]
    DateRates,
}

impl Related<super::savings_account_rate_tiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RateTiers.def()
    }
}

impl Related<super::savings_account_year_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::YearRates.def()
    }
}

impl Related<super::savings_account_date_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateRates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
