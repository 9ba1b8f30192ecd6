// Cache de quotes côté serveur: le pattern fetch / refresh périodique / snapshot.
// Un poller re-fetch l'ensemble des symboles suivis toutes les 5 minutes;
// un point d'entrée manuel force un refresh hors-bande, coalescé par debounce.
// Pas de déduplication des requêtes en vol: dernière écriture gagne.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use crate::config::Config;
use crate::models::dto::QuoteSnapshot;
use crate::services::quote_service::{QuoteService, DEFAULT_SYMBOLS};
use crate::utils::debounce::Debouncer;
use crate::utils::poller::PollHandle;

/// Intervalle du refresh périodique (5 minutes)
const POLL_INTERVAL: Duration = Duration::from_secs(300);
/// Fenêtre d'inactivité du refresh manuel
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct MarketCache {
    quotes: Arc<DashMap<String, QuoteSnapshot>>,
    // Ordre d'insertion préservé: le round-robin des catégories dépend de la position
    tracked: Arc<Mutex<Vec<String>>>,
    refresh_debouncer: Arc<Debouncer>,
}

impl MarketCache {
    pub fn new() -> Self {
        let tracked: Vec<String> = DEFAULT_SYMBOLS.iter().map(|(s, _)| s.to_string()).collect();

        MarketCache {
            quotes: Arc::new(DashMap::new()),
            tracked: Arc::new(Mutex::new(tracked)),
            refresh_debouncer: Arc::new(Debouncer::new(REFRESH_DEBOUNCE)),
        }
    }

    /// Ajoute des symboles au suivi (le poller les rafraîchira aussi)
    pub fn track(&self, symbols: &[String]) {
        let mut tracked = self.tracked.lock().unwrap();
        for symbol in symbols {
            let upper = symbol.to_uppercase();
            if !tracked.contains(&upper) {
                tracked.push(upper);
            }
        }
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        self.tracked.lock().unwrap().clone()
    }

    pub fn insert_quotes(&self, quotes: &[QuoteSnapshot]) {
        for quote in quotes {
            self.quotes.insert(quote.symbol.clone(), quote.clone());
        }
    }

    pub fn get(&self, symbol: &str) -> Option<QuoteSnapshot> {
        self.quotes.get(&symbol.to_uppercase()).map(|q| q.clone())
    }

    /// Vue courante de la liste suivie, catégories assignées.
    /// Les symboles pas encore rafraîchis sortent en placeholder: jamais de liste vide.
    pub fn snapshot(&self) -> Vec<QuoteSnapshot> {
        let tracked = self.tracked_symbols();
        let mut quotes: Vec<QuoteSnapshot> = tracked
            .iter()
            .map(|symbol| {
                self.get(symbol)
                    .unwrap_or_else(|| QuoteService::placeholder_quote(symbol))
            })
            .collect();

        QuoteService::assign_categories(&mut quotes);
        quotes
    }

    /// Quote depuis le cache, sinon fetch + track.
    /// En cas d'échec complet on retourne un placeholder (politique uniforme).
    pub async fn get_or_fetch(
        &self,
        client: &reqwest::Client,
        config: &Config,
        symbol: &str,
    ) -> QuoteSnapshot {
        if let Some(quote) = self.get(symbol) {
            return quote;
        }

        let symbols = vec![symbol.to_uppercase()];
        let (quotes, _) = QuoteService::fetch_quotes(client, config, &symbols).await;
        self.track(&symbols);
        self.insert_quotes(&quotes);
        quotes.into_iter().next().unwrap_or_else(|| QuoteService::placeholder_quote(symbol))
    }

    /// Re-fetch tous les symboles suivis et remplace le contenu du cache
    pub async fn refresh(&self, client: &reqwest::Client, config: &Config) {
        let tracked = self.tracked_symbols();
        if tracked.is_empty() {
            return;
        }

        let (quotes, retrieved) = QuoteService::fetch_quotes(client, config, &tracked).await;
        self.insert_quotes(&quotes);
        info!("Market cache refreshed: {}/{} quotes retrieved", retrieved, tracked.len());
    }

    /// Refresh manuel hors-bande, coalescé: plusieurs demandes dans la fenêtre
    /// de 500ms ne déclenchent qu'un seul fetch (la dernière génération gagne)
    pub fn request_refresh(&self, client: reqwest::Client, config: Config) {
        let cache = self.clone();
        self.refresh_debouncer.trigger(move || async move {
            cache.refresh(&client, &config).await;
        });
    }

    /// Démarre le refresh périodique. Le handle retourné est scopé:
    /// le dropper arrête la tâche.
    pub fn start_polling(&self, client: reqwest::Client, config: Config) -> PollHandle {
        let cache = self.clone();
        PollHandle::spawn(POLL_INTERVAL, move || {
            let cache = cache.clone();
            let client = client.clone();
            let config = config.clone();
            async move {
                cache.refresh(&client, &config).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_never_renders_empty() {
        let cache = MarketCache::new();

        // Cache vide (aucun poll encore passé): la liste sort en placeholders
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), DEFAULT_SYMBOLS.len());
        assert!(snapshot.iter().all(|q| q.is_sample));
        assert!(snapshot.iter().all(|q| q.category.is_some()));
    }

    #[test]
    fn test_insert_replaces_placeholder_in_snapshot() {
        let cache = MarketCache::new();

        let real = QuoteSnapshot {
            symbol: "AAPL".to_string(),
            price: 187.42,
            change: 1.23,
            change_percent: 0.66,
            volume: 52_000_000,
            category: None,
            is_sample: false,
        };
        cache.insert_quotes(std::slice::from_ref(&real));

        let snapshot = cache.snapshot();
        let aapl = snapshot.iter().find(|q| q.symbol == "AAPL").unwrap();
        assert!(!aapl.is_sample);
        assert_eq!(aapl.price, 187.42);
    }

    #[test]
    fn test_track_deduplicates_symbols() {
        let cache = MarketCache::new();
        let before = cache.tracked_symbols().len();

        cache.track(&["AAPL".to_string(), "shop".to_string(), "SHOP".to_string()]);

        let tracked = cache.tracked_symbols();
        // AAPL était déjà suivi, SHOP ne compte qu'une fois
        assert_eq!(tracked.len(), before + 1);
        assert!(tracked.contains(&"SHOP".to_string()));
    }
}
