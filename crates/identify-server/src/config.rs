use anyhow::{Context, Result};
use identify_tokens::TokenStoreConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server and CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Path to RocksDB database
    pub database_path: PathBuf,

    /// Where the CLI keeps the last issued token
    pub credentials_path: PathBuf,

    /// Realm advertised in `WWW-Authenticate` challenges
    pub realm: String,

    /// Longest token lifetime, in seconds
    pub token_max_age: u64,

    /// Seconds between expired-token sweeps
    pub sweep_interval: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_address = var("IDENTIFY_BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8443".to_string())
            .parse()
            .context("IDENTIFY_BIND_ADDRESS is not a socket address")?;

        let database_path = var("IDENTIFY_DATABASE_PATH")
            .unwrap_or_else(|| "./data/identify.db".to_string())
            .into();

        let credentials_path = var("IDENTIFY_CREDENTIALS_PATH")
            .unwrap_or_else(|| "./data/credentials.json".to_string())
            .into();

        let realm = var("IDENTIFY_REALM").unwrap_or_else(|| "localhost".to_string());

        let token_max_age = var("IDENTIFY_TOKEN_MAX_AGE_SECONDS")
            .unwrap_or_else(|| "300".to_string()) // 5 minutes
            .parse()
            .context("IDENTIFY_TOKEN_MAX_AGE_SECONDS must be a number of seconds")?;

        let sweep_interval = var("IDENTIFY_SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("IDENTIFY_SWEEP_INTERVAL_SECONDS must be a number of seconds")?;

        if sweep_interval == 0 {
            anyhow::bail!("IDENTIFY_SWEEP_INTERVAL_SECONDS must be greater than zero");
        }

        Ok(Config {
            bind_address,
            database_path,
            credentials_path,
            realm,
            token_max_age,
            sweep_interval,
        })
    }

    /// Token store settings derived from this configuration
    pub fn token_store(&self) -> TokenStoreConfig {
        TokenStoreConfig {
            max_age: Duration::from_secs(self.token_max_age),
            sweep_interval: Duration::from_secs(self.sweep_interval),
        }
    }
}
