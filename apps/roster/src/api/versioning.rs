//! API versioning by `api-version` header or `/api/{v}/...` URL segment.

use super::error::ApiError;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::fmt;

pub const API_VERSION: HeaderName = HeaderName::from_static("api-version");
const SUPPORTED_HEADER: HeaderName = HeaderName::from_static("api-supported-versions");
const DEPRECATED_HEADER: HeaderName = HeaderName::from_static("api-deprecated-versions");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const V1: Self = Self { major: 1, minor: 0 };
    pub const V2: Self = Self { major: 2, minor: 0 };

    /// Accepts `2`, `2.0` and `v2`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        let (major, minor) = match raw.split_once('.') {
            Some((major, minor)) => (major.parse().ok()?, minor.parse().ok()?),
            None => (raw.parse().ok()?, 0),
        };
        Some(Self { major, minor })
    }

    /// Parse and require a supported version.
    pub fn resolve(raw: &str) -> Result<Self, ApiError> {
        Self::parse(raw)
            .filter(|v| *v == Self::V1 || *v == Self::V2)
            .ok_or_else(|| ApiError::UnsupportedApiVersion(raw.trim().to_string()))
    }

    pub fn is_deprecated(&self) -> bool {
        *self == Self::V2
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Middleware: resolve the requested version into a request extension and
/// advertise the supported versions on every response.
pub async fn resolve_version(mut req: Request, next: Next) -> Response {
    let requested = match req.headers().get(API_VERSION) {
        None => Ok(ApiVersion::V1),
        Some(value) => match value.to_str() {
            Ok(raw) => ApiVersion::resolve(raw),
            Err(_) => Err(ApiError::UnsupportedApiVersion(String::new())),
        },
    };

    let mut response = match requested {
        Ok(version) => {
            req.extensions_mut().insert(version);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    };

    let headers = response.headers_mut();
    headers.insert(SUPPORTED_HEADER, HeaderValue::from_static("1.0"));
    headers.insert(DEPRECATED_HEADER, HeaderValue::from_static("2.0"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forms() {
        assert_eq!(ApiVersion::parse("2"), Some(ApiVersion::V2));
        assert_eq!(ApiVersion::parse("2.0"), Some(ApiVersion::V2));
        assert_eq!(ApiVersion::parse("v2"), Some(ApiVersion::V2));
        assert_eq!(ApiVersion::parse(" 1.0 "), Some(ApiVersion::V1));
        assert_eq!(ApiVersion::parse("two"), None);
    }

    #[test]
    fn only_one_and_two_are_supported() {
        assert!(ApiVersion::resolve("1").is_ok());
        assert!(ApiVersion::resolve("2.0").is_ok());
        assert!(matches!(
            ApiVersion::resolve("3.0"),
            Err(ApiError::UnsupportedApiVersion(ref v)) if v == "3.0"
        ));
    }

    #[test]
    fn display_is_major_dot_minor() {
        assert_eq!(ApiVersion::V2.to_string(), "2.0");
        assert!(ApiVersion::V2.is_deprecated());
    }
}
