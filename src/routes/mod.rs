//! Route modules for Folio Server

pub mod health;
pub mod pages;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Assemble the application router. Middleware layers (trace, CORS) are
/// added by the binary; tests drive this router directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/documents", pages::router())
        .with_state(state)
}
