use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::LedgerError;
use crate::middleware::AuthUser;
use crate::models::dto::{OnboardPortfolioRequest, PortfolioResponse};
use crate::services::portfolio_service::PortfolioService;

/// GET /api/portfolio - the caller's portfolio, created on first access
#[get("")]
pub async fn get_portfolio(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
) -> Result<HttpResponse, LedgerError> {
    let portfolio = PortfolioService::get_or_create(db.get_ref(), &auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(PortfolioResponse::from(portfolio)))
}

/// POST /api/portfolio/onboard - explicit creation with trading preferences;
/// 400 if a portfolio already exists
#[post("/onboard")]
pub async fn onboard_portfolio(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
    request: web::Json<OnboardPortfolioRequest>,
) -> Result<HttpResponse, LedgerError> {
    let request = request.into_inner();
    let portfolio = PortfolioService::create(
        db.get_ref(),
        &auth_user.user_id,
        request.track,
        request.experience,
    )
    .await?;
    Ok(HttpResponse::Created().json(PortfolioResponse::from(portfolio)))
}

/// POST /api/portfolio/reset - restore the starting SimCash and wipe the
/// trade history in one transaction
#[post("/reset")]
pub async fn reset_portfolio(
    db: web::Data<DatabaseConnection>,
    auth_user: AuthUser,
) -> Result<HttpResponse, LedgerError> {
    let portfolio = PortfolioService::reset(db.get_ref(), &auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(PortfolioResponse::from(portfolio)))
}

pub fn portfolio_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/portfolio")
            .service(get_portfolio)
            .service(onboard_portfolio)
            .service(reset_portfolio),
    );
}
