//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure of a whole source fetch or of a sync request.
///
/// Per-record problems never show up here; they travel as
/// [`marketsync_engine::Error`] inside the fetched batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Transport error, timeout or non-success HTTP status
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The response envelope could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Unknown platform or unusable client settings
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Engine(#[from] marketsync_engine::Error),
}

impl SyncError {
    pub fn unknown_platform(platform: impl std::fmt::Display) -> Self {
        SyncError::Configuration(format!("no client registered for platform '{platform}'"))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else {
            SyncError::SourceUnavailable(err.to_string())
        }
    }
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Sync(SyncError::Configuration(msg)) => {
                (StatusCode::NOT_FOUND, "Unknown platform".to_string(), Some(msg.clone()))
            }
            AppError::Sync(
                e @ (SyncError::SourceUnavailable(_) | SyncError::MalformedResponse(_)),
            ) => {
                tracing::warn!("Source error: {}", e);
                (StatusCode::BAD_GATEWAY, "Source error".to_string(), Some(e.to_string()))
            }
            AppError::Sync(SyncError::Engine(e)) => {
                tracing::error!("Engine error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let unknown = AppError::from(SyncError::unknown_platform("hepsiburada")).into_response();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let upstream =
            AppError::from(SyncError::SourceUnavailable("timeout".into())).into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let bad = AppError::BadRequest("category id".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_platform_message() {
        assert_eq!(
            SyncError::unknown_platform("hepsiburada").to_string(),
            "configuration error: no client registered for platform 'hepsiburada'"
        );
    }
}
