use actix_web::{get, post, web, HttpResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use validator::Validate;

use crate::errors::LedgerError;
use crate::middleware::AuthUser;
use crate::models::dto::{CloseTradeRequest, CreateTradeRequest};
use crate::models::trade::{self, TradeStatus};
use crate::services::ledger_service::LedgerService;

/// POST /api/trades - open a trade against the caller's portfolio
pub async fn create_trade(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
    request: web::Json<CreateTradeRequest>,
) -> Result<HttpResponse, LedgerError> {
    if let Err(errors) = request.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let created =
        LedgerService::open_trade(db.get_ref(), &auth_user.user_id, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// POST /api/trades/{id}/close - close an open trade at the supplied
/// exit price (quoted at the edge, not by the ledger)
#[post("/{trade_id}/close")]
pub async fn close_trade(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<CloseTradeRequest>,
) -> Result<HttpResponse, LedgerError> {
    let trade_id = path.into_inner();
    let closed = LedgerService::close_trade(
        db.get_ref(),
        &auth_user.user_id,
        trade_id,
        request.exit_price,
    )
    .await?;
    Ok(HttpResponse::Ok().json(closed))
}

/// GET /api/trades - the caller's trades, newest first
#[get("")]
pub async fn get_all_trades(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
) -> Result<HttpResponse, LedgerError> {
    let trades = trade::Entity::find()
        .filter(trade::Column::UserId.eq(&auth_user.user_id))
        .order_by_desc(trade::Column::EntryTime)
        .order_by_desc(trade::Column::Id)
        .all(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(trades))
}

/// GET /api/trades/open - open positions, newest first
#[get("/open")]
pub async fn get_open_trades(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
) -> Result<HttpResponse, LedgerError> {
    let trades = trade::Entity::find()
        .filter(trade::Column::UserId.eq(&auth_user.user_id))
        .filter(trade::Column::Status.eq(TradeStatus::Open))
        .order_by_desc(trade::Column::EntryTime)
        .order_by_desc(trade::Column::Id)
        .all(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(trades))
}

/// GET /api/trades/closed - closed trades, most recently closed first
#[get("/closed")]
pub async fn get_closed_trades(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
) -> Result<HttpResponse, LedgerError> {
    let trades = trade::Entity::find()
        .filter(trade::Column::UserId.eq(&auth_user.user_id))
        .filter(trade::Column::Status.eq(TradeStatus::Closed))
        .order_by_desc(trade::Column::ExitTime)
        .order_by_desc(trade::Column::Id)
        .all(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(trades))
}

pub fn trade_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trades")
            .route("", web::post().to(create_trade))
            .service(get_all_trades)
            .service(get_open_trades)
            .service(get_closed_trades)
            .service(close_trade),
    );
}
