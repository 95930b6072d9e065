//! HTTP caching: `Cache-Control`, ETag validation and the server-side store.

use super::AppState;
use super::error::ApiError;
use super::versioning::API_VERSION;
use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use roster_core::cache::{etag, if_none_match};

/// A stored 200 response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub headers: HeaderMap,
    pub body: Bytes,
    pub etag: String,
}

impl CachedResponse {
    fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.headers_mut() = self.headers.clone();
        response
    }
}

fn cache_key(req: &Request) -> String {
    let value_of = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    };
    format!(
        "{} {} accept={} version={}",
        req.method(),
        req.uri(),
        value_of(header::ACCEPT),
        value_of(API_VERSION)
    )
}

/// 304 with the validator headers and no body.
fn not_modified(headers: &HeaderMap) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    for name in [header::ETAG, header::CACHE_CONTROL, header::AGE] {
        if let Some(value) = headers.get(&name) {
            response.headers_mut().insert(name, value.clone());
        }
    }
    response
}

fn matches_request(if_none: Option<&str>, tag: &str) -> bool {
    if_none.is_some_and(|value| if_none_match(value, tag))
}

/// Middleware over the company routes.
pub async fn cache_responses(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = req.method().clone();
    if !matches!(method, Method::GET | Method::HEAD) {
        let response = next.run(req).await;
        if method != Method::OPTIONS && response.status().is_success() {
            state.cache.lock().await.clear();
            tracing::debug!(%method, "response cache cleared");
        }
        return Ok(response);
    }

    let key = cache_key(&req);
    let if_none = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let hit = state.cache.lock().await.get(&key, state.tick());
    if let Some(hit) = hit {
        let mut response = hit.value.to_response();
        response
            .headers_mut()
            .insert(header::AGE, HeaderValue::from(hit.age));
        if matches_request(if_none.as_deref(), &hit.value.etag) {
            return Ok(not_modified(response.headers()));
        }
        return Ok(response);
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(ApiError::internal)?;
    let tag = etag(&body);
    let policy = &state.config.cache;
    parts.headers.insert(
        header::ETAG,
        HeaderValue::from_str(&tag).map_err(ApiError::internal)?,
    );
    parts.headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&policy.header_value()).map_err(ApiError::internal)?,
    );

    if policy.stores_responses() {
        let entry = CachedResponse {
            headers: parts.headers.clone(),
            body: body.clone(),
            etag: tag.clone(),
        };
        state
            .cache
            .lock()
            .await
            .insert(key, entry, state.tick(), policy.max_age);
    }

    if matches_request(if_none.as_deref(), &tag) {
        return Ok(not_modified(&parts.headers));
    }
    Ok(Response::from_parts(parts, Body::from(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_includes_accept_and_version() {
        let build = |accept: &'static str| {
            Request::builder()
                .uri("/api/companies?x=1")
                .header("accept", accept)
                .header("api-version", "2.0")
                .body(Body::empty())
                .unwrap_or_default()
        };
        let json = cache_key(&build("application/json"));
        let xml = cache_key(&build("application/xml"));
        assert_ne!(json, xml);
        assert!(json.starts_with("GET /api/companies?x=1"));
        assert!(json.ends_with("version=2.0"));
    }

    #[test]
    fn not_modified_keeps_validators_only() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ETAG, HeaderValue::from_static("\"abc\""));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = not_modified(&headers);
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().contains_key(header::ETAG));
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));
    }
}
