//! Owner-keyed recurring background tasks.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Manages recurring background work (token renewal, release-history
/// polling) with lifecycle tied to the owner that started it.
///
/// At most one timer runs per owner: `start` for an owner that already has a
/// live task replaces it. `stop` is safe on owners that never started
/// anything, which keeps unmount paths unconditional.
#[derive(Default)]
pub struct PeriodicScheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl PeriodicScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin invoking `action` every `every`, replacing any previous task
    /// registered under the same owner. The first invocation happens one full
    /// interval after `start`, not immediately.
    ///
    /// `action` is a factory: each tick awaits a fresh future, so cancelling
    /// the owner aborts at an await point and a stale tick can never run
    /// after `stop` returns.
    pub async fn start<F, Fut>(&self, owner: &str, every: Duration, action: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.remove(owner) {
            previous.abort();
            debug!(owner, "replaced previous periodic task");
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately on the first tick; consume it so
            // the action only runs after a full period has elapsed.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                action().await;
            }
        });
        tasks.insert(owner.to_string(), handle);
    }

    /// Cancel the owner's task. No-op when the owner has nothing running.
    pub async fn stop(&self, owner: &str) {
        let mut tasks = self.tasks.lock().await;
        if let Some(handle) = tasks.remove(owner) {
            handle.abort();
            debug!(owner, "periodic task stopped");
        }
    }

    /// Cancel every task. Teardown path for process or session shutdown.
    pub async fn stop_all(&self) {
        let mut tasks = self.tasks.lock().await;
        for (owner, handle) in tasks.drain() {
            handle.abort();
            debug!(owner = %owner, "periodic task stopped");
        }
    }

    #[must_use]
    pub async fn is_running(&self, owner: &str) -> bool {
        self.tasks.lock().await.contains_key(owner)
    }

    /// Snapshot of owners with live timers, sorted for stable output.
    #[must_use]
    pub async fn active_owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.tasks.lock().await.keys().cloned().collect();
        owners.sort();
        owners
    }
}
