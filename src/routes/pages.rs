//! Page render endpoint
//!
//! `GET /documents/:id/page/:n.png` — renders one page of a document to a
//! watermarked PNG. Restricted documents require a bearer token, accepted
//! from the `Authorization` header or the `t` query parameter. Responses
//! are never cacheable: each request re-renders from source.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::auth::extract_token;
use crate::catalog::is_valid_document_id;
use crate::error::AppError;
use crate::events::CatalogEvent;
use crate::render::access::{self, Access};
use crate::render::watermark;
use crate::state::AppState;

/// Query parameters for page rendering
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Bearer token for clients that cannot set headers (`<img src>`).
    pub t: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:id/page/:page", get(render_page))
}

/// Parse a `{n}.png` path segment and clamp it into `[1, max_page]`.
///
/// Out-of-range and non-numeric values never reject: high pages collapse to
/// the bound, everything else to 1.
pub fn parse_page(raw: &str, max_page: i64) -> i64 {
    let raw = raw.strip_suffix(".png").unwrap_or(raw);
    raw.trim().parse::<i64>().unwrap_or(1).clamp(1, max_page.max(1))
}

async fn render_page(
    State(state): State<AppState>,
    Path((id, page)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !is_valid_document_id(&id) {
        return Err(AppError::BadRequest("Invalid document id".to_string()));
    }
    let page = parse_page(&page, state.config().render.max_page);

    let document = state
        .catalog()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Document '{}' not found", id)))?;
    let asset = document
        .asset
        .clone()
        .ok_or_else(|| AppError::BadRequest("No PDF available".to_string()))?;

    // Header and query token carry equal trust; header wins when both are
    // present. Verification failure is indistinguishable from no token.
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let identity = extract_token(authorization, query.t.as_deref())
        .and_then(|token| state.verifier().verify(token));

    // The access gate runs before any bytes are loaded or sandbox spawned.
    if access::evaluate(&document, identity.as_ref()) == Access::Deny {
        return Err(AppError::Unauthorized);
    }

    let pdf = state.assets().read(&asset).await?;

    let label = watermark::label(identity.as_ref().map(|i| i.display_label()));
    let png = state.renderer().render_page(pdf, page, label).await?;

    tracing::debug!("rendered page {} of document '{}'", page, id);
    state.events().publish(CatalogEvent::PageRendered {
        document_id: id,
        page,
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(png))
        .unwrap();

    Ok(response)
}
