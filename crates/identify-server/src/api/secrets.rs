use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use identify_identity::IdentityStore;
use std::sync::Arc;

use crate::{
    error::ApiError,
    middleware::{AuthenticatedIdentity, TokenIdentity},
    state::AppState,
};

/// PUT /secrets/:key
///
/// Seals the request body to the token's identity. Writing needs no passphrase.
pub async fn put_secret(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<TokenIdentity>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    state
        .identities
        .put_secret(&auth.identity, &key, &body)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /secrets/:key
pub async fn get_secret(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedIdentity(private)): Extension<AuthenticatedIdentity>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let value = state.identities.get_secret(&private, &key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        value.to_vec(),
    ))
}
