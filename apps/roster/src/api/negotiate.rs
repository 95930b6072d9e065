//! Request body parsing, `Accept` extraction and response encoding.

use super::error::ApiError;
use crate::config::AppConfig;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use roster_core::Validate;
use roster_core::formats::{MediaType, NegotiationError, XmlNames, encode, negotiate};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The media type negotiated from `Accept`. A missing header means JSON.
#[derive(Debug, Clone)]
pub struct Negotiated(pub MediaType);

impl<S: Send + Sync> FromRequestParts<S> for Negotiated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = accept_header(&parts.headers)?;
        Ok(Self(negotiate(accept)?))
    }
}

/// Like [`Negotiated`], but a missing or empty `Accept` header is a 400.
#[derive(Debug, Clone)]
pub struct RequiredMediaType(pub MediaType);

impl<S: Send + Sync> FromRequestParts<S> for RequiredMediaType {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = accept_header(&parts.headers)?
            .filter(|value| !value.trim().is_empty())
            .ok_or(NegotiationError::Malformed)?;
        Ok(Self(negotiate(Some(accept))?))
    }
}

fn accept_header(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    headers
        .get(header::ACCEPT)
        .map(|value| value.to_str().map_err(|_| NegotiationError::Malformed.into()))
        .transpose()
}

/// Encode `value` for `media` and set `Content-Type`.
pub fn represent(
    status: StatusCode,
    value: &Value,
    media: &MediaType,
    names: XmlNames,
) -> Result<Response, ApiError> {
    let body = encode(value, media, names)?;
    let content_type = HeaderValue::from_str(&media.to_string()).map_err(ApiError::internal)?;
    Ok((status, [(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Decode a JSON body. An empty or `null` body is a 400 with `null_message`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8], null_message: &str) -> Result<T, ApiError> {
    let body = body.trim_ascii();
    if body.is_empty() || body == b"null" {
        tracing::error!("{null_message}");
        return Err(ApiError::BadRequest(null_message.to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("The request body is not valid JSON: {err}")))
}

/// [`parse_body`], then run validation; failures are a 422.
pub fn validated<T>(body: &[u8], null_message: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = parse_body(body, null_message)?;
    value.validate().map_err(|errors| {
        tracing::error!(fields = errors.len(), "invalid model state");
        ApiError::Unprocessable(errors)
    })?;
    Ok(value)
}

/// Scheme and authority for generated links and `Location` headers.
pub fn base_url(config: &AppConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &config.base_url {
        return url.clone();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// A `Location` header value.
pub fn location(url: &str) -> Result<[(header::HeaderName, HeaderValue); 1], ApiError> {
    let value = HeaderValue::from_str(url).map_err(ApiError::internal)?;
    Ok([(header::LOCATION, value)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::EmployeeForCreation;

    #[test]
    fn null_and_empty_bodies_are_bad_requests() {
        for body in [&b""[..], b"  ", b"null"] {
            let result: Result<EmployeeForCreation, _> = parse_body(body, "object is null");
            assert!(matches!(result, Err(ApiError::BadRequest(ref m)) if m == "object is null"));
        }
    }

    #[test]
    fn invalid_model_is_unprocessable() {
        let result: Result<EmployeeForCreation, _> = validated(br#"{"age": 3}"#, "null");
        assert!(matches!(result, Err(ApiError::Unprocessable(_))));
    }

    #[test]
    fn base_url_prefers_configuration() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.example"));

        let mut config = AppConfig::with_secret("x");
        assert_eq!(base_url(&config, &headers), "http://api.example");

        config.base_url = Some("https://roster.example".into());
        assert_eq!(base_url(&config, &headers), "https://roster.example");
    }
}
