use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, ColumnTrait, QueryOrder, Set, ActiveModelTrait, ModelTrait};
use validator::Validate;

use crate::config::Config;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateHoldingRequest, HoldingView};
use crate::models::portfolio_holdings;
use crate::services::market_cache::MarketCache;
use crate::services::portfolio_service::PortfolioService;

/// GET /portfolio - Holdings avec champs dérivés recalculés (PROTÉGÉE)
#[get("")]
pub async fn get_portfolio(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    cache: web::Data<MarketCache>,
) -> impl Responder {
    // 1. Charger les holdings de l'utilisateur
    let holdings = portfolio_holdings::Entity::find()
        .filter(portfolio_holdings::Column::UserId.eq(auth_user.user_id))
        .order_by_asc(portfolio_holdings::Column::Id)
        .all(db.get_ref())
        .await;

    let holdings = match holdings {
        Ok(holdings) => holdings,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    // 2. Enrichir chaque ligne avec la dernière quote (cache, sinon fetch)
    let mut views: Vec<HoldingView> = Vec::with_capacity(holdings.len());
    for holding in &holdings {
        let quote = cache
            .get_or_fetch(client.get_ref(), config.get_ref(), &holding.symbol)
            .await;
        views.push(PortfolioService::enrich(holding, Some(&quote)));
    }

    HttpResponse::Ok().json(views)
}

/// POST /portfolio - Ajouter un holding (PROTÉGÉE)
pub async fn create_holding(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateHoldingRequest>,
) -> impl Responder {
    // Validation AVANT tout appel réseau ou base
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    let new_holding = portfolio_holdings::ActiveModel {
        user_id: Set(auth_user.user_id),
        symbol: Set(body.symbol.trim().to_uppercase()),
        name: Set(body.name.clone()),
        shares: Set(body.shares),
        avg_price: Set(body.avg_price),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_holding.insert(db.get_ref()).await {
        Ok(holding) => HttpResponse::Created().json(holding),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create holding: {}", e)
        })),
    }
}

/// DELETE /portfolio/{id} - Retirer un holding (PROTÉGÉE)
pub async fn delete_holding(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> impl Responder {
    let holding_id = path.into_inner();

    // 1. Charger le holding et vérifier qu'il appartient bien à l'utilisateur
    let holding = match portfolio_holdings::Entity::find_by_id(holding_id)
        .one(db.get_ref())
        .await
    {
        Ok(Some(holding)) => holding,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Holding not found"
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }));
        }
    };

    if holding.user_id != auth_user.user_id {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Holding does not belong to this user"
        }));
    }

    // 2. Supprimer (une seule opération, pas d'états intermédiaires)
    match holding.delete(db.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to delete holding: {}", e)
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/portfolio")
            .service(get_portfolio)
            .route("", web::post().to(create_holding))
            .route("/{id}", web::delete().to(delete_holding)),
    );
}
