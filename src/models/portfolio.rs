use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolios")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: String,

    // Never debited below zero: the conditional debit in PortfolioService is
    // the only code path that subtracts from it.
    pub balance: Decimal,

    // Advisory running total of realized P&L. Kept in step with each close
    // but derived data, not authoritative.
    pub total_profit_loss: Decimal,

    // Onboarding preferences: 'stocks', 'crypto', 'forex'
    pub track: Option<String>,
    // 'beginner', 'intermediate', 'advanced'
    pub experience: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trade::Entity")]
    Trade,
}

impl Related<super::trade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trade.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
