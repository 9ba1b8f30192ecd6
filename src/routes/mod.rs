pub mod health;
pub mod auth;
pub mod quotes;
pub mod ai;
pub mod portfolio;
pub mod watchlist;
pub mod feedback;
pub mod practice;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(quotes::quotes_routes)
            .configure(ai::ai_routes)
            .configure(portfolio::configure)
            .configure(watchlist::configure)
            .configure(feedback::configure)
            .configure(practice::configure)
    );
}
