/*!
 * Token commands
 */

use anyhow::Result;
use colored::*;
use identify_tokens::TokenStore;
use std::time::Duration;
use uuid::Uuid;

use super::{token_identity, unlock};
use crate::credentials::{forget_token, save_token};
use crate::state::AppState;

pub async fn new_token(
    state: &AppState,
    id: &str,
    max_age: Option<u64>,
    permissions: &[String],
) -> Result<()> {
    let private = unlock(state, id).await?;
    let max_age = max_age
        .map(Duration::from_secs)
        .unwrap_or(state.tokens.config().max_age);

    let token = state
        .tokens
        .new_token_with_permissions(&private, max_age, permissions)
        .await?;
    save_token(&state.config.credentials_path, token.as_str())?;

    println!("{}", "✓ Token issued".green());
    println!("  Token ID:   {}", token.id());
    println!("  Expires at: {}", token.claims().exp);
    println!(
        "  {}",
        format!("Saved to {}", state.config.credentials_path.display()).dimmed()
    );
    println!("\n{}", token);
    Ok(())
}

/// Revoke `jti`, or the saved token itself when no id is given.
pub async fn delete_token(state: &AppState, jti: Option<Uuid>) -> Result<()> {
    let (identity, own) = token_identity(state).await?;
    let jti = jti.unwrap_or_else(|| own.id());

    state.tokens.delete(identity.id(), jti).await?;
    if jti == own.id() {
        forget_token(&state.config.credentials_path)?;
    }

    println!("{} {}", "✓ Token deleted:".green(), jti);
    Ok(())
}
