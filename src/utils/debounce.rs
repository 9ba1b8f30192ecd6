// Debounce: retarder une action jusqu'à 500ms d'inactivité.
// Chaque déclenchement est taggé d'une génération; seule la génération la plus
// récente exécute l'action, une génération périmée ne s'exécute jamais.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Planifie `action` après `delay` d'inactivité.
    /// Un nouvel appel pendant la fenêtre redémarre le timer et invalide l'appel précédent.
    pub fn trigger<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        // 1. Prendre une nouvelle génération (invalide les timers en attente)
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let delay = self.delay;

        // 2. Attendre la fenêtre d'inactivité, puis vérifier qu'on est toujours le dernier
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == my_generation {
                action().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_trigger_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AtomicU32::new(0));

        // Trois déclenchements rapprochés: seuls 100ms s'écoulent entre chacun
        for i in 1..=3u32 {
            let fired = fired.clone();
            debouncer.trigger(move || async move {
                fired.store(i, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        // Seul le dernier déclenchement (i == 3) a exécuté son action
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_trigger_fires_once() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let count = Arc::new(AtomicU32::new(0));

        let c = count.clone();
        debouncer.trigger(move || async move {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
