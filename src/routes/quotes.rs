use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::config::Config;
use crate::middleware::AuthUser;
use crate::models::dto::{HistoryRequest, HistoryResponse, QuotesRequest, QuotesResponse, SearchResponse};
use crate::services::market_cache::MarketCache;
use crate::services::quote_service::QuoteService;

const DEFAULT_SEARCH_LIMIT: usize = 10;

/// POST /quotes - Quote-fetch: soit {symbols}, soit {search, limit} (PROTÉGÉE)
pub async fn fetch_quotes(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    cache: web::Data<MarketCache>,
    body: web::Json<QuotesRequest>,
) -> HttpResponse {
    // Mode recherche: {search, limit}
    if let Some(query) = &body.search {
        let limit = body.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let results = QuoteService::search(client.get_ref(), config.get_ref(), query, limit).await;
        return HttpResponse::Ok().json(SearchResponse { search_results: results });
    }

    // Mode quotes: {symbols}
    let symbols: Vec<String> = match &body.symbols {
        Some(symbols) if !symbols.is_empty() => {
            symbols.iter().map(|s| s.trim().to_uppercase()).collect()
        }
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Either 'symbols' or 'search' is required"
            }));
        }
    };

    let total_requested = symbols.len();
    let (mut quotes, total_retrieved) =
        QuoteService::fetch_quotes(client.get_ref(), config.get_ref(), &symbols).await;

    // Alimenter le cache et le suivi du poller, puis tagger les catégories
    cache.track(&symbols);
    cache.insert_quotes(&quotes);
    QuoteService::assign_categories(&mut quotes);

    HttpResponse::Ok().json(QuotesResponse {
        stocks: quotes,
        total_requested,
        total_retrieved,
    })
}

/// GET /stocks - Liste de stocks suivie, servie depuis le cache (PROTÉGÉE)
#[get("/stocks")]
pub async fn list_stocks(_auth_user: AuthUser, cache: web::Data<MarketCache>) -> HttpResponse {
    let stocks = cache.snapshot();
    let total_requested = stocks.len();
    let total_retrieved = stocks.iter().filter(|q| !q.is_sample).count();

    HttpResponse::Ok().json(QuotesResponse {
        stocks,
        total_requested,
        total_retrieved,
    })
}

/// POST /quotes/refresh - Refetch manuel hors-bande, débouncé (PROTÉGÉE)
#[post("/refresh")]
pub async fn refresh_quotes(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    cache: web::Data<MarketCache>,
) -> HttpResponse {
    cache.request_refresh(client.get_ref().clone(), config.get_ref().clone());

    HttpResponse::Accepted().json(serde_json::json!({
        "status": "refresh scheduled"
    }))
}

/// POST /quotes/history - Historique de prix {symbol, timeRange} (PROTÉGÉE)
#[post("/history")]
pub async fn fetch_history(
    _auth_user: AuthUser,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
    body: web::Json<HistoryRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    let symbol = body.symbol.trim().to_uppercase();
    let data =
        QuoteService::fetch_history(client.get_ref(), config.get_ref(), &symbol, &body.time_range)
            .await;

    HttpResponse::Ok().json(HistoryResponse {
        symbol,
        time_range: body.time_range.clone(),
        data,
    })
}

pub fn quotes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_stocks).service(
        web::scope("/quotes")
            .route("", web::post().to(fetch_quotes))
            .service(refresh_quotes)
            .service(fetch_history),
    );
}
