// Request/response shapes for the trading API (camelCase on the wire)
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::trade::TradeSide;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTradeRequest {
    #[validate(length(min = 1, max = 20, message = "symbol is required"))]
    pub symbol: String,
    pub side: TradeSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloseTradeRequest {
    pub exit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct OnboardPortfolioRequest {
    pub track: Option<String>,
    pub experience: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub id: i32,
    pub user_id: String,
    pub balance: Decimal,
    pub total_profit_loss: Decimal,
    pub track: Option<String>,
    pub experience: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::models::portfolio::Model> for PortfolioResponse {
    fn from(p: crate::models::portfolio::Model) -> Self {
        PortfolioResponse {
            id: p.id,
            user_id: p.user_id,
            balance: p.balance,
            total_profit_loss: p.total_profit_loss,
            track: p.track,
            experience: p.experience,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
