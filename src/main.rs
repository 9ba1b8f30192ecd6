mod models;
mod routes;
mod db;
mod services;
mod utils;
mod middleware;
mod config;

use actix_web::{App, HttpServer, web};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::market_cache::MarketCache;
use crate::services::practice_service::PracticeEngine;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    println!("🔌 Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    println!("✅ Database connected!");

    let http_client = reqwest::Client::new();
    let market_cache = MarketCache::new();
    let practice_engine = PracticeEngine::new();

    // Refresh périodique des quotes (5 min); le handle scopé vit jusqu'à l'arrêt
    let _poll_handle = market_cache.start_polling(http_client.clone(), config.clone());

    if let Some(site_url) = &config.site_url {
        println!("🌐 Serving frontend at {}", site_url);
    }
    println!("🚀 Starting server on http://{}:{}", config.host, config.port);

    let bind_addr = (config.host.clone(), config.port);
    let db_data = web::Data::new(db);
    HttpServer::new(move || {
        App::new()
            // L'audio base64 peut approcher 34MB encodé (plafond 25MB décodé)
            .app_data(web::JsonConfig::default().limit(40 * 1024 * 1024))
            .app_data(db_data.clone())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(http_client.clone()))
            .app_data(web::Data::new(market_cache.clone()))
            .app_data(web::Data::new(practice_engine.clone()))
            .configure(routes::configure_routes)
    })
        .bind(bind_addr)?
        .run()
        .await
}
