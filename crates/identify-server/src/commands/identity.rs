/*!
 * Identity commands
 */

use anyhow::Result;
use colored::*;
use identify_identity::{IdentityStore, PublicIdentity};

use crate::credentials::prompt_new_passphrase;
use crate::state::AppState;

pub async fn new_identity(state: &AppState, aliases: &[String]) -> Result<()> {
    println!("{}", "=== New Identity ===".bold().cyan());

    let passphrase = prompt_new_passphrase()?;
    let (public, _) = state.identities.new_identity(&passphrase, aliases).await?;

    println!("{}", "✓ Identity created".green());
    print_identity(&public, aliases);
    Ok(())
}

pub async fn get_identity(state: &AppState, id: &str) -> Result<()> {
    let public = state.identities.get_identity(id).await?;
    print_identity(&public, &[]);
    Ok(())
}

fn print_identity(public: &PublicIdentity, aliases: &[String]) {
    println!("  Identity ID:        {}", public.id().to_string().bold());
    if !aliases.is_empty() {
        println!("  Aliases:            {}", aliases.join(", "));
    }
    println!("  Signing key:        {}", hex::encode(public.signing_public_key()));
    println!("  Sealing key:        {}", hex::encode(public.sealing_public_key()));
    println!("  Created at:         {}", public.created_at());
}
