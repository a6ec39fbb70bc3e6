/*!
 * Secret commands
 */

use anyhow::Result;
use colored::*;
use identify_identity::IdentityStore;

use super::{token_identity, unlock};
use crate::state::AppState;

/// Store a secret for the identity behind the saved token.
pub async fn put_secret(state: &AppState, key: &str, value: &str) -> Result<()> {
    let (identity, _) = token_identity(state).await?;
    state
        .identities
        .put_secret(&identity, key, value.as_bytes())
        .await?;

    println!("{} {}", "✓ Secret stored:".green(), key);
    Ok(())
}

pub async fn get_secret(state: &AppState, id: &str, key: &str) -> Result<()> {
    let private = unlock(state, id).await?;
    let value = state.identities.get_secret(&private, key).await?;

    println!("{}", String::from_utf8_lossy(&value));
    Ok(())
}
