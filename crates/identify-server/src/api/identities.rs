use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use identify_identity::{IdentityStore, PublicIdentity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub passphrase: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub signing_public_key: String, // hex
    pub sealing_public_key: String, // hex
    pub created_at: u64,
}

impl From<&PublicIdentity> for IdentityResponse {
    fn from(identity: &PublicIdentity) -> Self {
        IdentityResponse {
            id: identity.id(),
            signing_public_key: hex::encode(identity.signing_public_key()),
            sealing_public_key: hex::encode(identity.sealing_public_key()),
            created_at: identity.created_at(),
        }
    }
}

/// POST /identities
pub async fn create_identity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIdentityRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    if req.passphrase.is_empty() {
        return Err(ApiError::InvalidRequest("passphrase is required".to_string()));
    }

    let (public, _) = state
        .identities
        .new_identity(&req.passphrase, &req.aliases)
        .await?;

    tracing::info!(identity_id = %public.id(), aliases = req.aliases.len(), "Identity created");
    Ok((StatusCode::CREATED, Json(IdentityResponse::from(&public))))
}

/// GET /identities/:id
///
/// `id` may also be an alias.
pub async fn get_identity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let public = state.identities.get_identity(&id).await?;
    Ok(Json(IdentityResponse::from(&public)))
}
