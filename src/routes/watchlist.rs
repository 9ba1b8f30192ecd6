use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::dto::AddWatchlistRequest;
use crate::services::watchlist_service::WatchlistService;

/// GET /watchlist - Liste de surveillance (PROTÉGÉE)
#[get("")]
pub async fn get_watchlist(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match WatchlistService::list(db.get_ref(), auth_user.user_id).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        })),
    }
}

/// POST /watchlist - Ajouter un symbole (idempotent) (PROTÉGÉE)
pub async fn add_to_watchlist(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<AddWatchlistRequest>,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    match WatchlistService::add(db.get_ref(), auth_user.user_id, &body.symbol, body.name.clone()).await
    {
        Ok(entry) => HttpResponse::Created().json(entry),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to add to watchlist: {}", e)
        })),
    }
}

/// DELETE /watchlist/{symbol} - Retirer un symbole (PROTÉGÉE)
pub async fn remove_from_watchlist(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> impl Responder {
    let symbol = path.into_inner();

    match WatchlistService::remove(db.get_ref(), auth_user.user_id, &symbol).await {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "removed": removed
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to remove from watchlist: {}", e)
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/watchlist")
            .service(get_watchlist)
            .route("", web::post().to(add_to_watchlist))
            .route("/{symbol}", web::delete().to(remove_from_watchlist)),
    );
}
