//! Router assembly and the liveness/debug handlers.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_session::{ChannelRegistry, RealtimeTransport, TransportError};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::auth;
use crate::config::Config;
use crate::debug_gate::{self, DebugSessionGate};

/// Default transport: channel transitions go to the log stream. The
/// realtime bridge replaces this in deployments that fan debug output out to
/// studio clients.
pub struct TracingTransport;

#[async_trait]
impl RealtimeTransport for TracingTransport {
    async fn open_channel(&self, channel_id: &str) -> Result<(), TransportError> {
        debug!(channel = channel_id, "debug channel opened");
        Ok(())
    }

    async fn close_channel(&self, channel_id: &str) -> Result<(), TransportError> {
        debug!(channel = channel_id, "debug channel closed");
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub channels: Arc<ChannelRegistry>,
    pub debug_gate: Arc<DebugSessionGate>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(TracingTransport))
    }

    #[must_use]
    pub fn with_transport(config: Config, transport: Arc<dyn RealtimeTransport>) -> Self {
        let channels = Arc::new(ChannelRegistry::new(transport));
        let debug_gate = Arc::new(DebugSessionGate::new(channels.clone()));
        Self {
            config,
            channels,
            debug_gate,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The debug gate wraps the token check so a session's on/off pairing
    // holds even for rejected requests, matching how the gate brackets the
    // whole handler chain.
    let guarded = Router::new()
        .route("/v1/debug/echo", post(debug_echo))
        .route("/v1/debug/sessions", get(debug_sessions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_cluster_token,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            debug_gate::debug_session_gate,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn health(State(state): State<AppState>) -> String {
    format!(
        "{} - Healthy {} server",
        timestamp(),
        state.config.service_name
    )
}

async fn ping() -> String {
    format!("{} - Pong!", timestamp())
}

/// Echoes the payload back; when the caller's debug session is live the
/// payload is also mirrored onto the verbose log stream.
async fn debug_echo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let session = debug_gate::session_token(&headers);
    if let Some(session) = &session
        && state.debug_gate.is_verbose(session).await
    {
        debug!(session = %session, payload = %payload, "debug echo");
    }
    Json(json!({ "echo": payload, "session": session }))
}

async fn debug_sessions(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sessions": state.debug_gate.active_sessions().await }))
}
