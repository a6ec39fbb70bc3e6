/*!
 * Local credential storage for the CLI
 *
 * `new-token` saves the issued token here; token-authenticated commands read it back.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable consulted before prompting for a passphrase
pub const PASSPHRASE_ENV: &str = "IDENTIFY_PASSPHRASE";

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedCredentials {
    pub token: String,
}

pub fn save_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&SavedCredentials {
        token: token.to_string(),
    })?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write credentials to {}", path.display()))
}

pub fn load_token(path: &Path) -> Result<String> {
    let json = fs::read_to_string(path).with_context(|| {
        format!(
            "No saved credentials at {}. Run 'new-token' first.",
            path.display()
        )
    })?;
    let saved: SavedCredentials =
        serde_json::from_str(&json).context("Failed to parse saved credentials")?;
    Ok(saved.token)
}

pub fn forget_token(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Passphrase from the environment, else prompt without echo
pub fn prompt_passphrase(prompt: &str) -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }
    rpassword::prompt_password(prompt).context("Failed to read passphrase")
}

/// Prompt twice for a new passphrase
pub fn prompt_new_passphrase() -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }

    loop {
        let passphrase = prompt_passphrase("Enter passphrase for the new identity: ")?;
        if passphrase.is_empty() {
            println!("Passphrase must not be empty. Please try again.");
            continue;
        }

        let confirm = prompt_passphrase("Confirm passphrase: ")?;
        if passphrase != confirm {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(passphrase);
    }
}
