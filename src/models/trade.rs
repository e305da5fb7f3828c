use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 'buy' opens a long, 'sell' opens a short. A sell never reduces an
/// existing long; longs are unwound through the close endpoint only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    #[sea_orm(string_value = "buy")]
    Buy,
    #[sea_orm(string_value = "sell")]
    Sell,
}

/// State machine: open -> closed, exactly once. No cancel, no partial close.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

// exit_price, exit_time and pnl are NULL together (open) or set together
// (closed). A closed row is never touched again.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trades")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,

    // Advisory levels, displayed but never triggered by any engine
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,

    // Risk metrics derived from the advisory levels at open time
    pub risk_amount: Option<Decimal>,
    pub reward_amount: Option<Decimal>,
    pub rr_ratio: Option<Decimal>,

    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
    pub entry_time: DateTimeUtc,
    pub exit_time: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolio::Entity",
        from = "Column::UserId",
        to = "super::portfolio::Column::UserId"
    )]
    Portfolio,
}

impl Related<super::portfolio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
