//! Error responses shared by all handlers.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use vocalis_identity::IdentityError;
use vocalis_voice::VoiceError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    /// A single request field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("could not validate credentials")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// A hosted service failed; `error` is its message.
    #[error("{message}: {error}")]
    Upstream { message: String, error: String },
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    pub(crate) fn join(e: tokio::task::JoinError) -> Self {
        ApiError::InternalServerError(format!("task join error: {e}"))
    }

    pub(crate) fn db(e: impl std::fmt::Display) -> Self {
        ApiError::InternalServerError(format!("database error: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message, "field": field }),
            ),
            ApiError::Unauthorized => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "could not validate credentials" })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::Upstream { message, error } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "message": message, "error": error }),
            ),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Unauthenticated(failure) => {
                tracing::debug!(?failure, "authentication failed");
                ApiError::Unauthorized
            }
            IdentityError::InvalidLogin => ApiError::Unauthorized,
            IdentityError::EmailTaken => ApiError::Conflict(e.to_string()),
            IdentityError::InvalidField { field, reason } => ApiError::Validation {
                field,
                message: reason.to_string(),
            },
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::EmptyText => ApiError::Validation {
                field: "text",
                message: e.to_string(),
            },
            VoiceError::TextTooLong { .. } => ApiError::Validation {
                field: "text",
                message: e.to_string(),
            },
            other => {
                tracing::error!(error = %other, "speech synthesis failed");
                ApiError::Upstream {
                    message: "Error al generar el audio".to_string(),
                    error: other.to_string(),
                }
            }
        }
    }
}
