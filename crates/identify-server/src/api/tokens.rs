use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use identify_tokens::{TokenError, TokenStore};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{token_cookie, AuthenticatedIdentity, TokenIdentity},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct NewTokenRequest {
    /// Requested lifetime; capped at the server maximum
    pub max_age_seconds: Option<u64>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NewTokenResponse {
    pub token: String,
    pub jti: Uuid,
    pub identity_id: Uuid,
    pub expires_at: u64,
}

/// POST /tokens
///
/// Issues a token for the basic-authenticated identity and also sets it as the
/// `Authorization` cookie.
pub async fn new_token(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedIdentity(private)): Extension<AuthenticatedIdentity>,
    body: Option<Json<NewTokenRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let max_age = req
        .max_age_seconds
        .map(Duration::from_secs)
        .unwrap_or(state.tokens.config().max_age);

    let token = state
        .tokens
        .new_token_with_permissions(&private, max_age, &req.permissions)
        .await
        .map_err(|e| match e {
            // Only the requested permissions can be malformed here.
            TokenError::Malformed(msg) => ApiError::InvalidRequest(msg),
            other => other.into(),
        })?;

    let claims = token.claims();
    let cookie = token_cookie(token.as_str(), claims.exp.saturating_sub(claims.iat));

    let response = NewTokenResponse {
        token: token.to_string(),
        jti: token.id(),
        identity_id: token.identity(),
        expires_at: claims.exp,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// DELETE /tokens/:jti
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<TokenIdentity>,
    Path(jti): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tokens.delete(auth.identity.id(), jti).await?;
    Ok(StatusCode::NO_CONTENT)
}
