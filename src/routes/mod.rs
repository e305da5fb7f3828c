pub mod health;
pub mod portfolio;
pub mod trade;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(trade::trade_routes)
            .configure(portfolio::portfolio_routes),
    );
}
