//! Version-scope coordinator tying channels, tabs, and background tasks
//! together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::channels::{ChannelRegistry, RealtimeTransport};
use crate::error::TransportError;
use crate::scheduler::PeriodicScheduler;
use crate::tabs::TabSessionManager;

/// Owner keys for the coordinator's own background tasks.
pub const OWNER_TOKEN_RENEWAL: &str = "session.token_renewal";
pub const OWNER_RELEASE_HISTORY: &str = "session.release_history";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the session access token is renewed while authenticated.
    pub token_renewal_interval: Duration,
    /// How often the release history is polled while authenticated.
    pub release_poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_renewal_interval: Duration::from_secs(120),
            release_poll_interval: Duration::from_secs(60),
        }
    }
}

/// Owns the channel registry, tab registry, and scheduler for one client
/// process, with constructor-injected transport and explicit teardown.
///
/// Entering a version joins its realtime channel; leaving it clears the tab
/// registry for that version and releases the channel, no matter how many
/// tabs were still open. Authentication gates the recurring tasks: they are
/// stopped the moment the precondition falls, not left to fire and no-op.
pub struct SessionCoordinator {
    channels: ChannelRegistry,
    tabs: Mutex<TabSessionManager>,
    scheduler: PeriodicScheduler,
    config: SessionConfig,
}

impl SessionCoordinator {
    pub fn new(transport: Arc<dyn RealtimeTransport>, config: SessionConfig) -> Self {
        Self {
            channels: ChannelRegistry::new(transport),
            tabs: Mutex::new(TabSessionManager::new()),
            scheduler: PeriodicScheduler::new(),
            config,
        }
    }

    /// Join the version's realtime channel. Called when the version editing
    /// scope mounts.
    pub async fn enter_version(&self, version_id: &str) -> Result<(), TransportError> {
        self.channels.join(version_id).await
    }

    /// Unconditional scope teardown: wipe the version's tab registry and
    /// release its channel membership. Fired on unmount regardless of how
    /// many tabs remain open.
    pub async fn leave_version(&self, version_id: &str) -> Result<(), TransportError> {
        self.tabs.lock().await.clear_version(version_id);
        debug!(version = version_id, "version scope torn down");
        self.channels.leave(version_id).await
    }

    /// Run `f` with exclusive access to the tab registry. Tab mutations are
    /// synchronous inside the closure, so activation exclusivity holds for
    /// every observer.
    pub async fn with_tabs<R>(&self, f: impl FnOnce(&mut TabSessionManager) -> R) -> R {
        let mut tabs = self.tabs.lock().await;
        f(&mut tabs)
    }

    /// Authentication established: start the token-renewal and
    /// release-history tasks at their configured intervals. Restarting an
    /// already-running pair replaces it.
    pub async fn on_authenticated<R, RFut, P, PFut>(&self, renew_token: R, poll_releases: P)
    where
        R: Fn() -> RFut + Send + Sync + 'static,
        RFut: Future<Output = ()> + Send + 'static,
        P: Fn() -> PFut + Send + Sync + 'static,
        PFut: Future<Output = ()> + Send + 'static,
    {
        self.scheduler
            .start(
                OWNER_TOKEN_RENEWAL,
                self.config.token_renewal_interval,
                renew_token,
            )
            .await;
        self.scheduler
            .start(
                OWNER_RELEASE_HISTORY,
                self.config.release_poll_interval,
                poll_releases,
            )
            .await;
    }

    /// Authentication lost: stop both tasks proactively. This is the
    /// precondition-falsification teardown, not a runtime check inside the
    /// actions.
    pub async fn on_unauthenticated(&self) {
        self.scheduler.stop(OWNER_TOKEN_RENEWAL).await;
        self.scheduler.stop(OWNER_RELEASE_HISTORY).await;
    }

    /// Full teardown: stop every background task and close every channel the
    /// process still holds open.
    pub async fn shutdown(&self) {
        self.scheduler.stop_all().await;
        self.channels.close_all().await;
    }

    #[must_use]
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    #[must_use]
    pub fn scheduler(&self) -> &PeriodicScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::{OWNER_RELEASE_HISTORY, OWNER_TOKEN_RENEWAL, SessionConfig, SessionCoordinator};
    use crate::channels::tests::RecordingTransport;
    use crate::tabs::{TabDescriptor, TabKind};

    fn coordinator() -> (SessionCoordinator, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (
            SessionCoordinator::new(transport.clone(), SessionConfig::default()),
            transport,
        )
    }

    #[tokio::test]
    async fn leaving_a_version_clears_tabs_and_releases_the_channel() {
        let (coordinator, transport) = coordinator();

        coordinator.enter_version("version-1").await.unwrap();
        coordinator
            .with_tabs(|tabs| {
                tabs.open("version-1", TabDescriptor::new("Home", "/", TabKind::Dashboard));
                tabs.open(
                    "version-1",
                    TabDescriptor::new("Endpoints", "/endpoints", TabKind::Endpoint),
                );
            })
            .await;

        coordinator.leave_version("version-1").await.unwrap();

        assert!(coordinator.with_tabs(|tabs| tabs.is_empty("version-1")).await);
        assert!(!coordinator.channels().is_open("version-1").await);
        let calls = transport.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["open:version-1", "close:version-1"]);
    }

    #[tokio::test]
    async fn leave_without_enter_is_harmless() {
        let (coordinator, transport) = coordinator();

        coordinator.leave_version("never-entered").await.unwrap();
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auth_lifecycle_starts_and_stops_background_tasks() {
        let (coordinator, _transport) = coordinator();
        let renewals = Arc::new(AtomicU64::new(0));

        let counter = renewals.clone();
        coordinator
            .on_authenticated(
                move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                },
                || async {},
            )
            .await;

        assert_eq!(
            coordinator.scheduler().active_owners().await,
            vec![OWNER_RELEASE_HISTORY, OWNER_TOKEN_RENEWAL]
        );

        tokio::time::sleep(SessionConfig::default().token_renewal_interval * 2).await;
        assert_eq!(renewals.load(Ordering::SeqCst), 2);

        coordinator.on_unauthenticated().await;
        assert!(coordinator.scheduler().active_owners().await.is_empty());

        let after_signout = renewals.load(Ordering::SeqCst);
        tokio::time::sleep(SessionConfig::default().token_renewal_interval * 3).await;
        assert_eq!(renewals.load(Ordering::SeqCst), after_signout);
    }

    #[tokio::test]
    async fn shutdown_stops_tasks_and_closes_channels() {
        let (coordinator, _transport) = coordinator();

        coordinator.enter_version("version-1").await.unwrap();
        coordinator.enter_version("version-2").await.unwrap();
        coordinator.on_authenticated(|| async {}, || async {}).await;

        coordinator.shutdown().await;

        assert!(coordinator.scheduler().active_owners().await.is_empty());
        assert!(coordinator.channels().active_channels().await.is_empty());
    }
}
