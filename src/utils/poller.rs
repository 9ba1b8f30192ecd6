// Tâche périodique à durée de vie bornée: le handle est scopé, drop = abort.
// Remplace les timers avec cleanup manuel — le teardown est garanti, pas best-effort.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle d'une tâche périodique. La tâche tourne tant que le handle vit;
/// dropper le handle annule la tâche immédiatement.
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    /// Lance une tâche qui appelle `tick` toutes les `interval`.
    /// Le premier tick a lieu après un intervalle complet (pas au démarrage).
    pub fn spawn<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // Le premier tick de tokio::time::interval est immédiat: on le consomme
            timer.tick().await;
            loop {
                timer.tick().await;
                tick().await;
            }
        });

        PollHandle { handle }
    }

    /// Arrête la tâche explicitement (équivalent à dropper le handle)
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let _handle = PollHandle::spawn(Duration::from_secs(5), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_task() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let handle = PollHandle::spawn(Duration::from_secs(5), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        drop(handle);
        let before = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
    }
}
