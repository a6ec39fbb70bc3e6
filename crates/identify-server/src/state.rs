use anyhow::Result;
use identify_identity::{IdentityStore, LocalIdentityStore};
use identify_storage::RocksDbStorage;
use identify_tokens::{LocalTokenStore, TokenStore};
use std::sync::Arc;

use crate::config::Config;

pub type Identities = LocalIdentityStore<RocksDbStorage>;
pub type Tokens = LocalTokenStore<RocksDbStorage, Identities>;

/// Stores shared by every handler and CLI command
///
/// Both stores live in one RocksDB instance, each in its own buckets.
pub struct AppState {
    pub config: Config,
    pub identities: Arc<Identities>,
    pub tokens: Arc<Tokens>,
}

impl AppState {
    /// Open the database at `config.database_path` and start the token sweeper
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(RocksDbStorage::open(&config.database_path)?);
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Arc<RocksDbStorage>) -> Self {
        let identities = Arc::new(LocalIdentityStore::new(Arc::clone(&storage)));
        let tokens = Arc::new(LocalTokenStore::open(
            storage,
            Arc::clone(&identities),
            config.token_store(),
        ));

        AppState {
            config,
            identities,
            tokens,
        }
    }

    /// Stop the sweeper after a final pass, then flush.
    pub async fn close(&self) -> Result<()> {
        self.tokens.close().await?;
        self.identities.close().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
    use std::path::PathBuf;

    let (storage, dir) = RocksDbStorage::open_temporary().expect("temporary database");
    let config = Config {
        bind_address: "127.0.0.1:0".parse().expect("socket address"),
        database_path: dir.path().join("db"),
        credentials_path: PathBuf::from("unused"),
        realm: "test".to_string(),
        token_max_age: 300,
        sweep_interval: 3600,
    };

    (Arc::new(AppState::with_storage(config, Arc::new(storage))), dir)
}
