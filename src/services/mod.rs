pub mod quote_service;
pub mod market_cache;
pub mod portfolio_service;
pub mod watchlist_service;
pub mod prediction_service;
pub mod chat_service;
pub mod transcription_service;
pub mod practice_service;
