//! Cluster-token authentication middleware.

use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::server::AppState;

/// Require the shared cluster token on every request this layer guards.
///
/// The token arrives either as a bearer `Authorization` header or as a
/// `token` query parameter. Missing and mismatched tokens both answer 401
/// with a structured code; auth failures are never retried here.
pub async fn require_cluster_token(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let token = header_token
        .or_else(|| params.get("token").cloned())
        .ok_or(ApiError::MissingAccessToken)?;

    if token != state.config.cluster_token {
        return Err(ApiError::InvalidAccessToken);
    }

    Ok(next.run(request).await)
}
