use axum::{response::Json, Extension};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, middleware::AuthenticatedIdentity};

#[derive(Debug, Deserialize)]
pub struct OpenMessageRequest {
    /// Anonymously sealed message, base64
    pub sealed: String,
}

#[derive(Debug, Serialize)]
pub struct OpenMessageResponse {
    /// Opened message, base64
    pub message: String,
}

/// POST /messages/open
///
/// Opens a message anonymously sealed to the basic-authenticated identity.
pub async fn open_message(
    Extension(AuthenticatedIdentity(private)): Extension<AuthenticatedIdentity>,
    Json(req): Json<OpenMessageRequest>,
) -> Result<Json<OpenMessageResponse>, ApiError> {
    let sealed = STANDARD
        .decode(req.sealed.trim())
        .map_err(|_| ApiError::InvalidRequest("sealed message is not base64".to_string()))?;

    let message = private.open_anonymous(&sealed)?;

    Ok(Json(OpenMessageResponse {
        message: STANDARD.encode(&*message),
    }))
}
