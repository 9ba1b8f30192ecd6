use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

use crate::config::Config;
use crate::middleware::AuthUser;
use crate::models::dto::PracticeStartRequest;
use crate::services::market_cache::MarketCache;
use crate::services::practice_service::PracticeEngine;

/// POST /practice/start - Démarrer une session simulée (PROTÉGÉE)
pub async fn start_practice(
    auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    cache: web::Data<MarketCache>,
    engine: web::Data<PracticeEngine>,
    body: web::Json<PracticeStartRequest>,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Seed: dernières quotes connues (réelles ou placeholder)
    let mut seed = Vec::with_capacity(body.symbols.len());
    for symbol in &body.symbols {
        let quote = cache.get_or_fetch(client.get_ref(), config.get_ref(), symbol).await;
        seed.push(quote);
    }

    // 2. Démarrer la marche aléatoire (remplace une session existante)
    let symbols: Vec<String> = seed.iter().map(|q| q.symbol.clone()).collect();
    engine.start(auth_user.user_id, seed);

    HttpResponse::Created().json(serde_json::json!({
        "status": "started",
        "symbols": symbols
    }))
}

/// GET /practice/quotes - Snapshot courant de la simulation (PROTÉGÉE)
#[get("/quotes")]
pub async fn practice_quotes(auth_user: AuthUser, engine: web::Data<PracticeEngine>) -> impl Responder {
    match engine.quotes(auth_user.user_id) {
        Some(quotes) => HttpResponse::Ok().json(quotes),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "No active practice session"
        })),
    }
}

/// POST /practice/stop - Arrêter la session (le ticker est annulé) (PROTÉGÉE)
#[post("/stop")]
pub async fn stop_practice(auth_user: AuthUser, engine: web::Data<PracticeEngine>) -> impl Responder {
    let stopped = engine.stop(auth_user.user_id);

    HttpResponse::Ok().json(serde_json::json!({
        "success": stopped
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/practice")
            .route("/start", web::post().to(start_practice))
            .service(practice_quotes)
            .service(stop_practice),
    );
}
