//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use roster_core::formats::{FormatError, NegotiationError};
use roster_core::{StoreError, ValidationErrors};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// 400 with a plain message.
    BadRequest(String),
    /// 400 with a field -> messages map.
    InvalidRequest(ValidationErrors),
    Unauthorized,
    Forbidden,
    NotFound(String),
    NotAcceptable(String),
    /// 422 with a field -> messages map.
    Unprocessable(ValidationErrors),
    UnsupportedApiVersion(String),
    Internal(String),
}

impl ApiError {
    /// Log `err` and hide it behind a generic 500.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidRequest(_) | Self::UnsupportedApiVersion(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn message_body(status: StatusCode, message: &str) -> Json<serde_json::Value> {
    Json(json!({ "statusCode": status.as_u16(), "message": message }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InvalidRequest(errors) | Self::Unprocessable(errors) => {
                (status, Json(errors)).into_response()
            }
            Self::UnsupportedApiVersion(requested) => {
                let body = json!({
                    "error": {
                        "code": "UnsupportedApiVersion",
                        "message": format!(
                            "The HTTP resource does not support the API version '{requested}'."
                        ),
                    }
                });
                (status, Json(body)).into_response()
            }
            Self::Unauthorized => {
                let mut response = (status, message_body(status, "Unauthorized")).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer"),
                );
                response
            }
            Self::Forbidden => (status, message_body(status, "Forbidden")).into_response(),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (status, message_body(status, "Internal Server Error.")).into_response()
            }
            Self::BadRequest(message) | Self::NotFound(message) | Self::NotAcceptable(message) => {
                (status, message_body(status, &message)).into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            let mut errors = ValidationErrors::new();
            errors.add(err.code(), err.to_string());
            Self::InvalidRequest(errors)
        } else {
            Self::internal(err)
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Malformed => Self::BadRequest(err.to_string()),
            NegotiationError::NotAcceptable(_) => Self::NotAcceptable(err.to_string()),
        }
    }
}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::NotTabular => Self::NotAcceptable(err.to_string()),
            FormatError::Json(_) => Self::internal(err),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(err)
    }
}
