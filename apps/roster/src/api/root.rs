//! `GET /api`: the discovery document.

use super::AppState;
use super::error::ApiError;
use super::negotiate::{Negotiated, base_url, represent};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use roster_core::formats::XmlNames;
use roster_core::links::root_links;

const LINKS_XML: XmlNames = XmlNames::new("links", "link");

/// Root links for the apiroot media types, 204 for anything else.
pub async fn root(
    State(state): State<AppState>,
    headers: HeaderMap,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    if !media.is_api_root() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let links = root_links(&base_url(&state.config, &headers));
    represent(StatusCode::OK, &serde_json::to_value(links)?, &media, LINKS_XML)
}
