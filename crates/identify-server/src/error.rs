use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use identify_identity::IdentityError;
use identify_tokens::TokenError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Application error type
///
/// Every authentication-related failure becomes [`ApiError::Unauthorized`] so a response
/// never tells the caller which check failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::AuthenticationFailure => ApiError::Unauthorized,
            IdentityError::NotFound(what) => ApiError::NotFound(what),
            IdentityError::MalformedInput(msg) => ApiError::InvalidRequest(msg),
            IdentityError::AliasTaken(alias) => {
                ApiError::Conflict(format!("alias already taken: {}", alias))
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::SignatureInvalid
            | TokenError::AlgorithmMismatch { .. }
            | TokenError::Malformed(_)
            | TokenError::TokenExpired
            | TokenError::Revoked => ApiError::Unauthorized,
            TokenError::NotFound(what) => ApiError::NotFound(what),
            TokenError::AuthorizationFailure => {
                ApiError::Forbidden("token belongs to another identity".to_string())
            }
            TokenError::Identity(e) => e.into(),
            other => ApiError::Internal(other.into()),
        }
    }
}
