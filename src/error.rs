/*
 * Responsibility
 * - Two-kind error taxonomy: ApiError::Client (caller's fault, safe to detail)
 *   and ApiError::Server (internal, redacted)
 * - IntoResponse: only user-safe fields reach the body; internal context is
 *   handed to the request logger via response extensions
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{AuthError, ValidateError};
use crate::services::claims::ProviderError;

pub const UNAUTHORIZED_REQUEST: &str = "unauthorized_request";
pub const SERVER_ERROR: &str = "server_error";
pub const CLAIMS_PROVIDER_ERROR: &str = "claims_provider_error";
pub const JWKS_DOWNLOAD_ERROR: &str = "jwks_download_error";
pub const STARTUP_ERROR: &str = "startup_error";

/// The wire shape of every error body. Nothing else is ever serialized.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Internal error fields for the request log, carried on the response so the
/// logger middleware can record them without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ErrorLogFields {
    pub code: &'static str,
    pub detail: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller did something wrong. `message` is user-safe; `log_context`
    /// is the specific reason and never leaves the process.
    #[error("{code}: {message}")]
    Client {
        status: StatusCode,
        code: &'static str,
        message: String,
        log_context: Option<String>,
    },
    /// An internal failure. The caller sees a generic message; `detail` is
    /// logged only.
    #[error("{code}")]
    Server {
        code: &'static str,
        message: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// 401 with the fixed safe body; the real reason goes to the log only.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Client {
            status: StatusCode::UNAUTHORIZED,
            code: UNAUTHORIZED_REQUEST,
            message: "Missing, invalid or expired credential".into(),
            log_context: Some(reason.into()),
        }
    }

    pub fn server(code: &'static str, detail: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: "Problem encountered in the API",
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Client { status, .. } => *status,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Client { code, .. } | Self::Server { code, .. } => *code,
        }
    }

    /// The user-safe body for this error.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::Client { code, message, .. } => ErrorBody {
                code: *code,
                message: message.clone(),
            },
            Self::Server { code, message, .. } => ErrorBody {
                code: *code,
                message: (*message).to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let log_fields = match &self {
            ApiError::Client {
                code, log_context, ..
            } => ErrorLogFields {
                code: *code,
                detail: log_context.clone(),
            },
            ApiError::Server { code, detail, .. } => ErrorLogFields {
                code: *code,
                detail: Some(detail.clone()),
            },
        };

        let mut response = (self.status(), Json(self.to_body())).into_response();
        response.extensions_mut().insert(log_fields);
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::unauthorized(e.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::server(CLAIMS_PROVIDER_ERROR, e.to_string())
    }
}

impl From<ValidateError> for ApiError {
    fn from(e: ValidateError) -> Self {
        match e {
            // Caller's fault: generic 401.
            ValidateError::Auth(auth) => auth.into(),
            // Ours: a key download problem is not an authorization failure.
            ValidateError::KeyFetch(jwks) => ApiError::server(JWKS_DOWNLOAD_ERROR, jwks.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_body_is_generic() {
        let err = ApiError::unauthorized("signature verification failed");
        let body = err.to_body();
        assert_eq!(body.code, UNAUTHORIZED_REQUEST);
        assert_eq!(body.message, "Missing, invalid or expired credential");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn server_body_never_contains_detail() {
        let err = ApiError::server(SERVER_ERROR, "stack: secret internal state");
        let body = serde_json::to_string(&err.to_body()).unwrap();
        assert!(!body.contains("secret"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_log_fields_in_extensions() {
        let response = ApiError::unauthorized("expired token").into_response();
        let fields = response.extensions().get::<ErrorLogFields>().unwrap();
        assert_eq!(fields.code, UNAUTHORIZED_REQUEST);
        assert_eq!(fields.detail.as_deref(), Some("expired token"));
    }
}
