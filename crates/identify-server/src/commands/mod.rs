/*!
 * Command implementations
 *
 * Every command except `listen` works directly on the local database.
 */

pub mod identity;
pub mod listen;
pub mod messages;
pub mod secrets;
pub mod tokens;

use anyhow::{Context, Result};
use identify_identity::{IdentityStore, PrivateIdentity, PublicIdentity};
use identify_tokens::{Token, TokenStore};

use crate::credentials::{load_token, prompt_passphrase};
use crate::state::AppState;

/// Resolve `id` (or alias) and unlock it with a prompted passphrase
async fn unlock(state: &AppState, id: &str) -> Result<PrivateIdentity> {
    let public = state.identities.get_identity(id).await?;
    let passphrase = prompt_passphrase(&format!("Passphrase for {}: ", public.id()))?;
    public
        .authenticate(&passphrase)
        .context("Authentication failed")
}

/// Identity behind the saved token, if the token is still good
async fn token_identity(state: &AppState) -> Result<(PublicIdentity, Token)> {
    let raw = load_token(&state.config.credentials_path)?;
    let token = state
        .tokens
        .verify(&raw)
        .await
        .context("Saved token is no longer valid. Run 'new-token' again.")?;
    let identity = state.identities.get_identity_by_id(token.identity()).await?;
    Ok((identity, token))
}
