//! Error types for the Folio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::render::RenderError;
use crate::storage::AssetError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
///
/// Everything a request can fail with is recovered here and mapped to a
/// status plus a terse message. Render failures keep their full context in
/// the server log only.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Asset missing: {0}")]
    AssetMissing(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            // Metadata said the asset exists but the bytes are gone. Keep it
            // distinguishable from a plain unknown-document 404 in logs.
            AssetError::Missing(key) => AppError::AssetMissing(key),
            AssetError::InvalidKey(key) => AppError::BadRequest(format!("invalid asset key: {}", key)),
            AssetError::Io(e) => AppError::Render(RenderError::Sandbox(format!("asset read failed: {}", e))),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::AssetMissing(key) => {
                tracing::warn!("document metadata references missing asset '{}'", key);
                (
                    StatusCode::NOT_FOUND,
                    "asset_missing",
                    "Document file is missing".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Render(e) => {
                // Timeout and sandbox details are operator information; the
                // caller only learns that rendering failed.
                tracing::error!("render pipeline failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_error",
                    "Render error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
