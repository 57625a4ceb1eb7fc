//! Structured API errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no access token was provided in the 'Authorization' header or 'token' query parameter")]
    MissingAccessToken,

    #[error("the provided access token is not authorized for this cluster")]
    InvalidAccessToken,
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingAccessToken => "MISSING_ACCESS_TOKEN",
            Self::InvalidAccessToken => "INVALID_ACCESS_TOKEN",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingAccessToken | Self::InvalidAccessToken => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status(),
            Json(serde_json::json!({
                "error": "Unauthorized",
                "details": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
