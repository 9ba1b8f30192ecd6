use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use chrono::{Duration, Utc};
use tracing::warn;

use crate::config::Config;
use crate::models::dto::{CandlePoint, QuoteSnapshot, SearchResult};
use crate::utils::retry::retry_with_backoff;

/// Catégories UI assignées en round-robin positionnel (index % 5)
pub const CATEGORIES: [&str; 5] = ["Technology", "Finance", "Healthcare", "Energy", "Consumer"];

/// Liste par défaut ("favoris") montrée quand la recherche est vide
pub const DEFAULT_SYMBOLS: [(&str, &str); 8] = [
    ("AAPL", "Apple Inc"),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc"),
    ("AMZN", "Amazon.com Inc"),
    ("TSLA", "Tesla Inc"),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc"),
    ("NFLX", "Netflix Inc"),
];

const RETRY_ATTEMPTS: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 200;

/// Taxonomie plate: réseau, rate-limit, JSON malformé.
/// La politique est partout la même: log + donnée de substitution, jamais d'erreur dure.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Quote provider rate limit exceeded")]
    RateLimited,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

// Réponse /quote du fournisseur
#[derive(Debug, Deserialize)]
struct ProviderQuote {
    #[serde(rename = "c")]
    current: f64,
    #[serde(rename = "d")]
    change: Option<f64>,
    #[serde(rename = "dp")]
    change_percent: Option<f64>,
    #[serde(rename = "v")]
    volume: Option<i64>,
}

// Réponse /search du fournisseur
#[derive(Debug, Deserialize)]
struct ProviderSearch {
    result: Vec<SearchResult>,
}

// Réponse /stock/candle du fournisseur
#[derive(Debug, Deserialize)]
struct ProviderCandles {
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    v: Vec<i64>,
}

pub struct QuoteService;

impl QuoteService {
    /// Récupère les quotes pour une liste de symboles.
    /// Chaque échec individuel est remplacé par une quote placeholder, de sorte
    /// que la collection retournée a toujours la longueur demandée.
    /// Retourne aussi le nombre de quotes réellement récupérées.
    pub async fn fetch_quotes(
        client: &reqwest::Client,
        config: &Config,
        symbols: &[String],
    ) -> (Vec<QuoteSnapshot>, usize) {
        let fetches = symbols.iter().map(|symbol| Self::fetch_quote(client, config, symbol));
        let results = futures::future::join_all(fetches).await;

        let mut retrieved = 0;
        let quotes = results
            .into_iter()
            .zip(symbols.iter())
            .map(|(result, symbol)| match result {
                Ok(quote) => {
                    retrieved += 1;
                    quote
                }
                Err(e) => {
                    warn!("Quote fetch failed for {}: {} (substituting sample data)", symbol, e);
                    Self::placeholder_quote(symbol)
                }
            })
            .collect();

        (quotes, retrieved)
    }

    /// Une quote, avec retry sur les erreurs transitoires
    pub async fn fetch_quote(
        client: &reqwest::Client,
        config: &Config,
        symbol: &str,
    ) -> Result<QuoteSnapshot, QuoteError> {
        retry_with_backoff(
            RETRY_ATTEMPTS,
            std::time::Duration::from_millis(RETRY_BASE_DELAY_MS),
            || Self::fetch_quote_once(client, config, symbol),
        )
        .await
    }

    async fn fetch_quote_once(
        client: &reqwest::Client,
        config: &Config,
        symbol: &str,
    ) -> Result<QuoteSnapshot, QuoteError> {
        let url = format!("{}/quote", config.quote_api_url);
        let response = client
            .get(&url)
            .query(&[("symbol", symbol), ("token", &config.quote_api_key)])
            .send()
            .await?;

        if response.status().as_u16() == 429 {
            return Err(QuoteError::RateLimited);
        }

        let quote: ProviderQuote = response
            .json()
            .await
            .map_err(|e| QuoteError::MalformedResponse(e.to_string()))?;

        // Le fournisseur renvoie des zéros pour un symbole inconnu
        if quote.current <= 0.0 {
            return Err(QuoteError::MalformedResponse(format!(
                "No quote data for symbol {}",
                symbol
            )));
        }

        Ok(QuoteSnapshot {
            symbol: symbol.to_uppercase(),
            price: quote.current,
            change: quote.change.unwrap_or(0.0),
            change_percent: quote.change_percent.unwrap_or(0.0),
            volume: quote.volume.unwrap_or(0),
            category: None,
            is_sample: false,
        })
    }

    /// Recherche de symboles. Requête vide (après trim) => liste par défaut.
    /// Erreur fournisseur => résultat vide, jamais d'erreur dure.
    pub async fn search(
        client: &reqwest::Client,
        config: &Config,
        query: &str,
        limit: usize,
    ) -> Vec<SearchResult> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Self::default_results(limit);
        }

        match Self::search_provider(client, config, trimmed).await {
            Ok(mut results) => {
                results.truncate(limit);
                results
            }
            Err(e) => {
                warn!("Symbol search failed for '{}': {}", trimmed, e);
                Vec::new()
            }
        }
    }

    async fn search_provider(
        client: &reqwest::Client,
        config: &Config,
        query: &str,
    ) -> Result<Vec<SearchResult>, QuoteError> {
        let url = format!("{}/search", config.quote_api_url);
        let response = client
            .get(&url)
            .query(&[("q", query), ("token", &config.quote_api_key)])
            .send()
            .await?;

        if response.status().as_u16() == 429 {
            return Err(QuoteError::RateLimited);
        }

        let search: ProviderSearch = response
            .json()
            .await
            .map_err(|e| QuoteError::MalformedResponse(e.to_string()))?;

        Ok(search.result)
    }

    /// Liste par défaut, tronquée à `limit`
    pub fn default_results(limit: usize) -> Vec<SearchResult> {
        DEFAULT_SYMBOLS
            .iter()
            .take(limit)
            .map(|(symbol, description)| SearchResult {
                symbol: symbol.to_string(),
                description: description.to_string(),
                display_symbol: symbol.to_string(),
                security_type: "Common Stock".to_string(),
            })
            .collect()
    }

    /// Historique de prix pour un symbole.
    /// Erreur ou réponse vide => série placeholder, l'écran ne rend jamais vide.
    pub async fn fetch_history(
        client: &reqwest::Client,
        config: &Config,
        symbol: &str,
        time_range: &str,
    ) -> Vec<CandlePoint> {
        match Self::fetch_candles(client, config, symbol, time_range).await {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => {
                warn!("Empty candle response for {} ({}), substituting sample series", symbol, time_range);
                Self::placeholder_history(time_range)
            }
            Err(e) => {
                warn!("Candle fetch failed for {} ({}): {}", symbol, time_range, e);
                Self::placeholder_history(time_range)
            }
        }
    }

    async fn fetch_candles(
        client: &reqwest::Client,
        config: &Config,
        symbol: &str,
        time_range: &str,
    ) -> Result<Vec<CandlePoint>, QuoteError> {
        let (resolution, days) = Self::range_params(time_range);
        let to = Utc::now().timestamp();
        let from = (Utc::now() - Duration::days(days)).timestamp();

        let url = format!("{}/stock/candle", config.quote_api_url);
        let response = client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("resolution", resolution),
                ("from", &from.to_string()),
                ("to", &to.to_string()),
                ("token", &config.quote_api_key),
            ])
            .send()
            .await?;

        if response.status().as_u16() == 429 {
            return Err(QuoteError::RateLimited);
        }

        let candles: ProviderCandles = response
            .json()
            .await
            .map_err(|e| QuoteError::MalformedResponse(e.to_string()))?;

        if candles.s != "ok" {
            return Err(QuoteError::MalformedResponse(format!(
                "Provider status '{}' for {}",
                candles.s, symbol
            )));
        }

        let date_format = if Self::is_intraday(resolution) { "%Y-%m-%d %H:%M" } else { "%Y-%m-%d" };

        let points = candles
            .t
            .iter()
            .zip(candles.c.iter())
            .enumerate()
            .map(|(i, (timestamp, close))| CandlePoint {
                date: chrono::DateTime::from_timestamp(*timestamp, 0)
                    .map(|d| d.format(date_format).to_string())
                    .unwrap_or_default(),
                price: *close,
                volume: candles.v.get(i).copied().unwrap_or(0),
            })
            .collect();

        Ok(points)
    }

    /// timeRange -> (résolution fournisseur, fenêtre en jours)
    pub fn range_params(time_range: &str) -> (&'static str, i64) {
        match time_range {
            "1D" => ("5", 1),
            "1W" => ("60", 7),
            "1M" => ("D", 30),
            "3M" => ("D", 90),
            "1Y" => ("W", 365),
            _ => ("D", 30),
        }
    }

    fn is_intraday(resolution: &str) -> bool {
        resolution != "D" && resolution != "W"
    }

    /// Nombre de points générés pour une série placeholder
    fn placeholder_point_count(time_range: &str) -> usize {
        match time_range {
            "1D" => 24,
            "1W" => 28,
            "1M" => 30,
            "3M" => 90,
            "1Y" => 52,
            _ => 30,
        }
    }

    /// Quote placeholder: forme déterministe, valeurs aléatoires.
    /// Prix dans [150, 250], marquée is_sample pour le badge UI.
    pub fn placeholder_quote(symbol: &str) -> QuoteSnapshot {
        let mut rng = rand::thread_rng();
        let price: f64 = rng.gen_range(150.0..=250.0);
        let change: f64 = rng.gen_range(-5.0..=5.0);

        QuoteSnapshot {
            symbol: symbol.to_uppercase(),
            price: (price * 100.0).round() / 100.0,
            change: (change * 100.0).round() / 100.0,
            change_percent: (change / price * 10000.0).round() / 100.0,
            volume: rng.gen_range(1_000_000..=10_000_000),
            category: None,
            is_sample: true,
        }
    }

    /// Collection placeholder de la même longueur que la demande
    pub fn placeholder_quotes(symbols: &[String]) -> Vec<QuoteSnapshot> {
        symbols.iter().map(|s| Self::placeholder_quote(s)).collect()
    }

    /// Série historique placeholder: marche aléatoire autour d'un prix de départ
    pub fn placeholder_history(time_range: &str) -> Vec<CandlePoint> {
        let mut rng = rand::thread_rng();
        let count = Self::placeholder_point_count(time_range);
        let mut price: f64 = rng.gen_range(150.0..=250.0);
        let now = Utc::now();

        (0..count)
            .map(|i| {
                let pct: f64 = rng.gen_range(-2.0..=2.0);
                price *= 1.0 + pct / 100.0;
                let date = now - Duration::days((count - 1 - i) as i64);
                CandlePoint {
                    date: date.format("%Y-%m-%d").to_string(),
                    price: (price * 100.0).round() / 100.0,
                    volume: rng.gen_range(1_000_000..=10_000_000),
                }
            })
            .collect()
    }

    /// Assigne les catégories UI en round-robin positionnel
    pub fn assign_categories(quotes: &mut [QuoteSnapshot]) {
        for (i, quote) in quotes.iter_mut().enumerate() {
            quote.category = Some(CATEGORIES[i % CATEGORIES.len()].to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_collection_matches_requested_length() {
        let symbols: Vec<String> = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut quotes = QuoteService::placeholder_quotes(&symbols);
        QuoteService::assign_categories(&mut quotes);

        assert_eq!(quotes.len(), symbols.len());
        for (i, quote) in quotes.iter().enumerate() {
            assert!(quote.price >= 150.0 && quote.price <= 250.0);
            assert!(quote.is_sample);
            assert_eq!(quote.category.as_deref(), Some(CATEGORIES[i % 5]));
        }
    }

    #[test]
    fn test_default_results_respect_limit() {
        let results = QuoteService::default_results(3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].security_type, "Common Stock");

        // Limite plus grande que la liste: on retourne tout
        let results = QuoteService::default_results(100);
        assert_eq!(results.len(), DEFAULT_SYMBOLS.len());
    }

    #[test]
    fn test_range_params_mapping() {
        assert_eq!(QuoteService::range_params("1D"), ("5", 1));
        assert_eq!(QuoteService::range_params("1Y"), ("W", 365));
        // Valeur inconnue: défaut 1 mois
        assert_eq!(QuoteService::range_params("zzz"), ("D", 30));
    }

    #[test]
    fn test_placeholder_history_is_never_empty() {
        for range in ["1D", "1W", "1M", "3M", "1Y", "unknown"] {
            let series = QuoteService::placeholder_history(range);
            assert!(!series.is_empty());
            for point in &series {
                assert!(point.price > 0.0);
                assert!(point.volume >= 1_000_000);
            }
        }
    }
}
