//! Per-request debug session gate.
//!
//! A client that wants verbose logging for one request sends an opaque
//! session token in `X-Debug-Session`. The gate turns the session's debug
//! channel on before the handler runs and off exactly once after the
//! response is produced, no matter what the handler did in between. Turning
//! a channel on/off is realtime-channel membership under the hood, so
//! concurrent requests sharing a session token reference-count naturally.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use atelier_session::{ChannelRegistry, TransportError};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::server::AppState;

pub const DEBUG_SESSION_HEADER: &str = "x-debug-session";

/// Tracks which debug sessions currently have verbose logging enabled.
pub struct DebugSessionGate {
    channels: Arc<ChannelRegistry>,
    turned_on: AtomicU64,
    turned_off: AtomicU64,
}

impl DebugSessionGate {
    pub fn new(channels: Arc<ChannelRegistry>) -> Self {
        Self {
            channels,
            turned_on: AtomicU64::new(0),
            turned_off: AtomicU64::new(0),
        }
    }

    /// Enable verbose logging for the session. Joins the session's debug
    /// channel; the on-transition is counted only when the channel actually
    /// opened.
    pub async fn enable(&self, session: &str) -> Result<(), TransportError> {
        let was_open = self.channels.is_open(session).await;
        self.channels.join(session).await?;
        if !was_open {
            self.turned_on.fetch_add(1, Ordering::Relaxed);
            debug!(session, "verbose logging enabled");
        }
        Ok(())
    }

    /// Disable verbose logging for the session. Leaving a session that was
    /// never enabled is a no-op, mirroring the registry's teardown-race
    /// tolerance.
    pub async fn disable(&self, session: &str) -> Result<(), TransportError> {
        let was_open = self.channels.is_open(session).await;
        self.channels.leave(session).await?;
        if was_open && !self.channels.is_open(session).await {
            self.turned_off.fetch_add(1, Ordering::Relaxed);
            debug!(session, "verbose logging disabled");
        }
        Ok(())
    }

    #[must_use]
    pub async fn is_verbose(&self, session: &str) -> bool {
        self.channels.is_open(session).await
    }

    #[must_use]
    pub async fn active_sessions(&self) -> Vec<String> {
        self.channels.active_channels().await
    }

    #[must_use]
    pub fn on_transitions(&self) -> u64 {
        self.turned_on.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn off_transitions(&self) -> u64 {
        self.turned_off.load(Ordering::Relaxed)
    }
}

type Finalizer = Box<dyn FnOnce(&HeaderMap) -> BoxFuture<'static, Result<(), String>> + Send>;

/// Explicit list of completion callbacks attached to one exchange, invoked
/// deterministically once the response exists. Failures are isolated per
/// finalizer and logged: observability must never fail the primary request.
#[derive(Default)]
pub struct ResponseFinalizers {
    finalizers: Vec<Finalizer>,
}

impl ResponseFinalizers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finalizer: Finalizer) {
        self.finalizers.push(finalizer);
    }

    pub async fn drain(self, response_headers: &HeaderMap) {
        for finalizer in self.finalizers {
            if let Err(error) = finalizer(response_headers).await {
                warn!(%error, "response finalizer failed");
            }
        }
    }
}

/// Middleware wrapping every debuggable route.
///
/// Entry side: a present `X-Debug-Session` header turns the session on and
/// registers the matching off-finalizer. Exit side: the finalizer re-reads
/// the header from the response at completion time, so a handler that
/// rewrites the header redirects the turn-off to whatever token is present
/// then; the entry value is only a fallback for responses that carry none.
pub async fn debug_session_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut finalizers = ResponseFinalizers::new();

    if let Some(entry_session) = session_token(request.headers()) {
        if let Err(error) = state.debug_gate.enable(&entry_session).await {
            // Degrade to "logging never turned on" rather than failing the
            // request.
            warn!(session = %entry_session, %error, "debug session enable failed");
        }
        let gate = state.debug_gate.clone();
        finalizers.push(Box::new(move |headers: &HeaderMap| {
            let session = session_token(headers).unwrap_or(entry_session);
            Box::pin(async move {
                gate.disable(&session)
                    .await
                    .map_err(|error| format!("debug session {session} disable failed: {error}"))
            })
        }));
    }

    let response = next.run(request).await;
    finalizers.drain(response.headers()).await;
    response
}

pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(DEBUG_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
