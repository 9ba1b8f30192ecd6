// Mode practice: marche aléatoire de prix côté serveur, une session par utilisateur.
// Toutes les 5 secondes chaque symbole est perturbé d'un pourcentage uniforme
// dans [-2%, +2%]. change et changePercent s'accumulent additivement entre les
// ticks, sans remise à zéro ni plancher: les longues sessions dérivent
// arbitrairement loin de la valeur de départ (simplification assumée).

use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;

use crate::models::dto::QuoteSnapshot;
use crate::utils::poller::PollHandle;

/// Intervalle entre deux ticks de simulation
const TICK_INTERVAL: Duration = Duration::from_secs(5);
/// Amplitude maximale d'un tick, en pourcentage
const MAX_TICK_PERCENT: f64 = 2.0;

struct PracticeSession {
    quotes: Arc<RwLock<Vec<QuoteSnapshot>>>,
    // Scopé à la session: dropper la session annule le ticker
    _ticker: PollHandle,
}

#[derive(Clone)]
pub struct PracticeEngine {
    sessions: Arc<DashMap<i32, PracticeSession>>,
}

/// Applique un tick de marche aléatoire à une quote.
/// Le prix est mis à jour multiplicativement; change/changePercent additivement.
pub fn walk_tick(quote: &mut QuoteSnapshot, pct: f64) {
    let delta = quote.price * pct / 100.0;
    quote.price += delta;
    quote.change += delta;
    quote.change_percent += pct;
}

impl PracticeEngine {
    pub fn new() -> Self {
        PracticeEngine {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Démarre (ou remplace) la session practice d'un utilisateur.
    /// Les quotes de départ sont marquées sample: le mode entier est simulé.
    pub fn start(&self, user_id: i32, seed: Vec<QuoteSnapshot>) {
        let mut quotes = seed;
        for quote in &mut quotes {
            quote.is_sample = true;
        }

        let shared = Arc::new(RwLock::new(quotes));
        let tick_target = shared.clone();

        let ticker = PollHandle::spawn(TICK_INTERVAL, move || {
            let tick_target = tick_target.clone();
            async move {
                let mut quotes = match tick_target.write() {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
                let mut rng = rand::thread_rng();
                for quote in quotes.iter_mut() {
                    let pct = rng.gen_range(-MAX_TICK_PERCENT..=MAX_TICK_PERCENT);
                    walk_tick(quote, pct);
                }
            }
        });

        // Remplacer une session existante droppe son ancien ticker
        self.sessions.insert(
            user_id,
            PracticeSession {
                quotes: shared,
                _ticker: ticker,
            },
        );
    }

    /// Snapshot courant de la simulation, ou None si aucune session active
    pub fn quotes(&self, user_id: i32) -> Option<Vec<QuoteSnapshot>> {
        self.sessions
            .get(&user_id)
            .and_then(|session| session.quotes.read().ok().map(|q| q.clone()))
    }

    /// Arrête la session. Le drop de la session aborte le ticker.
    pub fn stop(&self, user_id: i32) -> bool {
        self.sessions.remove(&user_id).is_some()
    }

    pub fn is_active(&self, user_id: i32) -> bool {
        self.sessions.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quote(price: f64) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: "AAPL".to_string(),
            price,
            change: 1.5,
            change_percent: 0.75,
            volume: 1_000_000,
            category: None,
            is_sample: true,
        }
    }

    #[test]
    fn test_walk_tick_accumulates_additively() {
        let mut quote = sample_quote(200.0);

        walk_tick(&mut quote, 2.0);
        assert!((quote.price - 204.0).abs() < 1e-9);
        assert!((quote.change - 5.5).abs() < 1e-9);
        assert!((quote.change_percent - 2.75).abs() < 1e-9);

        // Deuxième tick: le change repart du cumul, pas d'une base fixe
        walk_tick(&mut quote, -1.0);
        assert!((quote.price - 201.96).abs() < 1e-9);
        assert!((quote.change - 3.46).abs() < 1e-9);
        assert!((quote.change_percent - 1.75).abs() < 1e-9);
    }

    // Comportement observé, pas un contrat: la mise à jour du prix est
    // multiplicative (1 + pct/100 avec pct > -100), donc le prix reste
    // positif même si changePercent dérive sans borne. Aucun plancher
    // n'est garanti par l'API.
    #[test]
    fn test_observed_price_stays_positive_over_long_runs() {
        let mut quote = sample_quote(0.50);
        let mut rng = rand::thread_rng();

        for _ in 0..10_000 {
            let pct = rng.gen_range(-MAX_TICK_PERCENT..=MAX_TICK_PERCENT);
            walk_tick(&mut quote, pct);
            assert!(quote.price > 0.0);
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let engine = PracticeEngine::new();
        assert!(engine.quotes(1).is_none());

        engine.start(1, vec![sample_quote(100.0)]);
        assert!(engine.is_active(1));

        let quotes = engine.quotes(1).unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes[0].is_sample);

        assert!(engine.stop(1));
        assert!(!engine.is_active(1));
        assert!(!engine.stop(1));
    }
}
