//! Token store over the embedded key-value engine.
//!
//! Two buckets:
//!
//! - `token`: jti → identity id. Existence means "not revoked".
//! - `token-ttl`: time key → jti, where the time key is the issue time in nanoseconds
//!   (big-endian) followed by the jti, so keys sort chronologically and never collide.
//!
//! Deleting a token only removes its `token` entry; the orphaned `token-ttl` entry goes
//! away with the next sweep.

use crate::{
    errors::{Result, TokenError},
    token::{lifetime_secs, Token},
    traits::TokenStore,
};
use async_trait::async_trait;
use identify_crypto::current_timestamp_nanos;
use identify_identity::{IdentityStore, PrivateIdentity};
use identify_storage::{BatchExt, Storage, CF_TOKEN, CF_TOKEN_TTL};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default maximum token age (5 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Default interval between background sweeps (1 minute)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Token store configuration
#[derive(Debug, Clone, Copy)]
pub struct TokenStoreConfig {
    /// Longest lifetime a token can be issued with. Sweeps remove tokens issued more than
    /// this (rounded up to whole seconds) plus one second ago.
    pub max_age: Duration,
    /// Time between background sweeps
    pub sweep_interval: Duration,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Build a time-index key: issued_at_nanos (big-endian) || jti
pub fn time_key(issued_at_nanos: u64, jti: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&issued_at_nanos.to_be_bytes());
    key[8..].copy_from_slice(jti.as_bytes());
    key
}

struct Inner<S: Storage, I: IdentityStore> {
    storage: Arc<S>,
    identities: Arc<I>,
    config: TokenStoreConfig,
}

impl<S: Storage, I: IdentityStore> Inner<S, I> {
    async fn persist(&self, token: &Token, issued_at_nanos: u64) -> Result<()> {
        let jti = token.id();

        let mut batch = self.storage.begin_transaction().await?;
        batch.put(CF_TOKEN, &jti, &token.identity())?;
        batch.put(CF_TOKEN_TTL, &time_key(issued_at_nanos, jti), &jti)?;
        batch.commit().await?;

        Ok(())
    }

    /// Scan phase: time-index entries older than the sweep horizon, read from a snapshot.
    ///
    /// A token stays valid through its `exp` second, up to one second past its rounded-up
    /// lifetime, so the horizon adds that second.
    async fn expired(&self) -> Result<Vec<(Vec<u8>, Uuid)>> {
        let horizon_secs = lifetime_secs(self.config.max_age).saturating_add(1);
        let horizon_nanos = horizon_secs.saturating_mul(1_000_000_000);
        let cutoff = current_timestamp_nanos().saturating_sub(horizon_nanos);

        debug!("Scanning for expired tokens");
        self.storage
            .scan_until(CF_TOKEN_TTL, &cutoff.to_be_bytes())
            .await
            .map_err(Into::into)
    }

    /// Delete phase: one write transaction over both indices.
    async fn remove(&self, expired: Vec<(Vec<u8>, Uuid)>) -> Result<usize> {
        if expired.is_empty() {
            return Ok(0);
        }

        let count = expired.len();
        let mut batch = self.storage.begin_transaction().await?;
        for (ttl_key, jti) in expired {
            batch.delete_raw(CF_TOKEN_TTL, ttl_key)?;
            batch.delete(CF_TOKEN, &jti)?;
        }
        batch.commit().await?;

        info!(count, "Deleted expired tokens");
        Ok(count)
    }

    async fn sweep(&self) -> Result<usize> {
        let expired = self.expired().await?;
        self.remove(expired).await
    }
}

struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// [`TokenStore`] backed by a [`Storage`] engine, with a background sweeper.
pub struct LocalTokenStore<S: Storage, I: IdentityStore> {
    inner: Arc<Inner<S, I>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<S, I> LocalTokenStore<S, I>
where
    S: Storage + 'static,
    I: IdentityStore + 'static,
{
    /// Open the store and start its sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(storage: Arc<S>, identities: Arc<I>, config: TokenStoreConfig) -> Self {
        let inner = Arc::new(Inner {
            storage,
            identities,
            config,
        });

        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(run_sweeper(Arc::clone(&inner), receiver));

        info!(
            max_age_secs = config.max_age.as_secs(),
            sweep_interval_secs = config.sweep_interval.as_secs(),
            "Token store opened"
        );

        Self {
            inner,
            sweeper: Mutex::new(Some(Sweeper { shutdown, handle })),
        }
    }

    /// Store configuration
    pub fn config(&self) -> &TokenStoreConfig {
        &self.inner.config
    }

    async fn issue(
        &self,
        identity: &PrivateIdentity,
        max_age: Duration,
        permissions: &[String],
    ) -> Result<Token> {
        let max_age = if max_age > self.inner.config.max_age {
            debug!(
                requested_secs = max_age.as_secs(),
                "Requested token age above store maximum, clamping"
            );
            self.inner.config.max_age
        } else {
            max_age
        };

        let token = Token::issue_with_permissions(identity, max_age, permissions)?;
        self.inner.persist(&token, current_timestamp_nanos()).await?;

        info!(identity_id = %identity.id(), jti = %token.id(), "Token issued");
        Ok(token)
    }
}

async fn run_sweeper<S, I>(inner: Arc<Inner<S, I>>, mut shutdown: watch::Receiver<bool>)
where
    S: Storage,
    I: IdentityStore,
{
    let mut ticker = tokio::time::interval(inner.config.sweep_interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = inner.sweep().await {
                    warn!(error = %e, "Token sweep failed");
                }
            }
            _ = shutdown.changed() => {
                debug!("Token sweeper stopping");
                break;
            }
        }
    }
}

#[async_trait]
impl<S, I> TokenStore for LocalTokenStore<S, I>
where
    S: Storage + 'static,
    I: IdentityStore + 'static,
{
    async fn new_token(&self, identity: &PrivateIdentity, max_age: Duration) -> Result<Token> {
        self.issue(identity, max_age, &[]).await
    }

    async fn new_token_with_permissions(
        &self,
        identity: &PrivateIdentity,
        max_age: Duration,
        permissions: &[String],
    ) -> Result<Token> {
        self.issue(identity, max_age, permissions).await
    }

    async fn parse(&self, raw: &str) -> Result<Token> {
        let identities = &self.inner.identities;

        Token::parse(raw, |id| async move {
            identities
                .get_identity_by_id(id)
                .await
                .map(|identity| *identity.signing_public_key())
                .map_err(TokenError::from)
        })
        .await
    }

    async fn verify(&self, raw: &str) -> Result<Token> {
        let token = self.parse(raw).await?;
        token.ensure_valid()?;

        if !self.inner.storage.exists(CF_TOKEN, &token.id()).await? {
            return Err(TokenError::Revoked);
        }

        Ok(token)
    }

    async fn delete(&self, identity_id: Uuid, jti: Uuid) -> Result<()> {
        let mut batch = self.inner.storage.begin_transaction().await?;

        let owner: Option<Uuid> = batch.get(CF_TOKEN, &jti)?;
        match owner {
            None => {
                batch.rollback();
                Err(TokenError::NotFound(format!("token {}", jti)))
            }
            Some(owner) if owner != identity_id => {
                batch.rollback();
                warn!(%jti, requested_by = %identity_id, "Refusing to delete another identity's token");
                Err(TokenError::AuthorizationFailure)
            }
            Some(_) => {
                batch.delete(CF_TOKEN, &jti)?;
                batch.commit().await?;

                info!(identity_id = %identity_id, %jti, "Token deleted");
                Ok(())
            }
        }
    }

    async fn sweep(&self) -> Result<usize> {
        self.inner.sweep().await
    }

    async fn close(&self) -> Result<()> {
        let sweeper = self.sweeper.lock().take();
        let Some(Sweeper { shutdown, handle }) = sweeper else {
            return Ok(());
        };

        // Receiver gone means the task already exited.
        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            warn!(error = %e, "Token sweeper task ended abnormally");
        }

        self.inner.sweep().await?;
        self.inner.storage.flush().await?;

        info!("Token store closed");
        Ok(())
    }
}

impl<S: Storage, I: IdentityStore> Drop for LocalTokenStore<S, I> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            let _ = sweeper.shutdown.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identify_identity::{LocalIdentityStore, PublicIdentity};
    use identify_storage::{MemoryStorage, RocksDbStorage};

    type MemoryTokenStore = LocalTokenStore<MemoryStorage, LocalIdentityStore<MemoryStorage>>;

    struct Fixture {
        storage: Arc<MemoryStorage>,
        identities: Arc<LocalIdentityStore<MemoryStorage>>,
        tokens: MemoryTokenStore,
    }

    fn fixture(config: TokenStoreConfig) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let identities = Arc::new(LocalIdentityStore::new(Arc::clone(&storage)));
        let tokens = LocalTokenStore::open(Arc::clone(&storage), Arc::clone(&identities), config);

        Fixture {
            storage,
            identities,
            tokens,
        }
    }

    fn quiet_config() -> TokenStoreConfig {
        TokenStoreConfig {
            max_age: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(3600),
        }
    }

    async fn new_identity(fixture: &Fixture) -> (PublicIdentity, PrivateIdentity) {
        fixture.identities.new_identity("pw", &[]).await.unwrap()
    }

    async fn ttl_entries(storage: &MemoryStorage) -> Vec<(Vec<u8>, Uuid)> {
        storage
            .scan_until(CF_TOKEN_TTL, &u64::MAX.to_be_bytes())
            .await
            .unwrap()
    }

    #[test]
    fn test_time_keys_sort_chronologically() {
        let late_jti = Uuid::from_bytes([0x00; 16]);
        let early_jti = Uuid::from_bytes([0xff; 16]);

        let early = time_key(1_000, early_jti);
        let late = time_key(1_001, late_jti);

        assert!(early < late);
        assert_eq!(&early[8..], early_jti.as_bytes());
    }

    #[tokio::test]
    async fn test_new_token_writes_both_indices() {
        let f = fixture(quiet_config());
        let (public, private) = new_identity(&f).await;

        let token = f.tokens.new_token(&private, Duration::from_secs(30)).await.unwrap();

        let owner: Option<Uuid> = f.storage.get(CF_TOKEN, &token.id()).await.unwrap();
        assert_eq!(owner, Some(public.id()));

        let entries = ttl_entries(&f.storage).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, token.id());
    }

    #[tokio::test]
    async fn test_verify_issued_token() {
        let f = fixture(quiet_config());
        let (public, private) = new_identity(&f).await;

        let token = f.tokens.new_token(&private, Duration::from_secs(30)).await.unwrap();
        let verified = f.tokens.verify(token.as_str()).await.unwrap();

        assert_eq!(verified.identity(), public.id());
        assert!(verified.valid());
    }

    #[tokio::test]
    async fn test_max_age_is_clamped() {
        let f = fixture(quiet_config());
        let (_, private) = new_identity(&f).await;

        let token = f.tokens.new_token(&private, Duration::from_secs(86_400)).await.unwrap();
        let claims = token.claims();

        assert!(claims.exp - claims.iat <= 60);
    }

    #[tokio::test]
    async fn test_parse_unknown_identity() {
        let f = fixture(quiet_config());
        let (_, stranger) = PublicIdentity::create("pw").unwrap();
        let token = Token::issue(&stranger, Duration::from_secs(30)).unwrap();

        assert!(matches!(
            f.tokens.parse(token.as_str()).await,
            Err(TokenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_owner_revokes() {
        let f = fixture(quiet_config());
        let (public, private) = new_identity(&f).await;
        let token = f.tokens.new_token(&private, Duration::from_secs(30)).await.unwrap();

        f.tokens.delete(public.id(), token.id()).await.unwrap();

        assert!(matches!(
            f.tokens.verify(token.as_str()).await,
            Err(TokenError::Revoked)
        ));
        // Signature and expiry alone still check out.
        assert!(f.tokens.parse(token.as_str()).await.unwrap().valid());
        // The time-index entry is left for the sweeper.
        assert_eq!(ttl_entries(&f.storage).await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_other_identity_is_refused() {
        let f = fixture(quiet_config());
        let (_, owner) = new_identity(&f).await;
        let (intruder, _) = new_identity(&f).await;
        let token = f.tokens.new_token(&owner, Duration::from_secs(30)).await.unwrap();

        assert!(matches!(
            f.tokens.delete(intruder.id(), token.id()).await,
            Err(TokenError::AuthorizationFailure)
        ));

        let verified = f.tokens.verify(token.as_str()).await.unwrap();
        assert!(verified.valid());
    }

    #[tokio::test]
    async fn test_delete_unknown_token() {
        let f = fixture(quiet_config());
        let (public, _) = new_identity(&f).await;

        assert!(matches!(
            f.tokens.delete(public.id(), Uuid::new_v4()).await,
            Err(TokenError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_tokens() {
        let f = fixture(quiet_config());
        let (_, private) = new_identity(&f).await;

        let old = Token::issue(&private, Duration::from_secs(60)).unwrap();
        let two_minutes_ago = current_timestamp_nanos() - 120 * 1_000_000_000;
        f.tokens.inner.persist(&old, two_minutes_ago).await.unwrap();

        let fresh = f.tokens.new_token(&private, Duration::from_secs(60)).await.unwrap();

        assert_eq!(f.tokens.sweep().await.unwrap(), 1);

        assert!(!f.storage.exists(CF_TOKEN, &old.id()).await.unwrap());
        assert!(f.storage.exists(CF_TOKEN, &fresh.id()).await.unwrap());

        let entries = ttl_entries(&f.storage).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, fresh.id());

        assert!(f.tokens.verify(fresh.as_str()).await.is_ok());
        assert_eq!(f.tokens.sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_leaves_entries_committed_after_scan() {
        let f = fixture(quiet_config());
        let (_, private) = new_identity(&f).await;
        let two_minutes_ago = current_timestamp_nanos() - 120 * 1_000_000_000;

        let old = Token::issue(&private, Duration::from_secs(60)).unwrap();
        f.tokens.inner.persist(&old, two_minutes_ago).await.unwrap();

        let expired = f.tokens.inner.expired().await.unwrap();
        assert_eq!(expired.len(), 1);

        // Both land between the scan and the delete; the late one is also past the horizon.
        let fresh = f.tokens.new_token(&private, Duration::from_secs(60)).await.unwrap();
        let late = Token::issue(&private, Duration::from_secs(60)).unwrap();
        f.tokens.inner.persist(&late, two_minutes_ago + 1).await.unwrap();

        assert_eq!(f.tokens.inner.remove(expired).await.unwrap(), 1);

        assert!(!f.storage.exists(CF_TOKEN, &old.id()).await.unwrap());
        for survivor in [&fresh, &late] {
            assert!(f.storage.exists(CF_TOKEN, &survivor.id()).await.unwrap());
        }

        let remaining: Vec<Uuid> = ttl_entries(&f.storage)
            .await
            .into_iter()
            .map(|(_, jti)| jti)
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&fresh.id()));
        assert!(remaining.contains(&late.id()));
    }

    #[tokio::test]
    async fn test_sweep_keeps_token_inside_horizon() {
        let f = fixture(quiet_config());
        let (_, private) = new_identity(&f).await;

        // Issued exactly max_age ago; still valid through its exp second.
        let token = Token::issue(&private, Duration::from_secs(60)).unwrap();
        let max_age_ago = current_timestamp_nanos() - 60 * 1_000_000_000;
        f.tokens.inner.persist(&token, max_age_ago).await.unwrap();

        assert_eq!(f.tokens.sweep().await.unwrap(), 0);
        assert!(f.storage.exists(CF_TOKEN, &token.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_clears_orphaned_time_entries() {
        let f = fixture(quiet_config());
        let (public, private) = new_identity(&f).await;

        let old = Token::issue(&private, Duration::from_secs(60)).unwrap();
        let two_minutes_ago = current_timestamp_nanos() - 120 * 1_000_000_000;
        f.tokens.inner.persist(&old, two_minutes_ago).await.unwrap();
        f.tokens.delete(public.id(), old.id()).await.unwrap();

        assert_eq!(f.tokens.sweep().await.unwrap(), 1);
        assert!(ttl_entries(&f.storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_background_sweeper_runs() {
        let f = fixture(TokenStoreConfig {
            max_age: Duration::from_secs(60),
            sweep_interval: Duration::from_millis(50),
        });
        let (_, private) = new_identity(&f).await;

        let old = Token::issue(&private, Duration::from_secs(60)).unwrap();
        let two_minutes_ago = current_timestamp_nanos() - 120 * 1_000_000_000;
        f.tokens.inner.persist(&old, two_minutes_ago).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!f.storage.exists(CF_TOKEN, &old.id()).await.unwrap());
        f.tokens.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_runs_final_sweep_and_stops_sweeper() {
        let f = fixture(quiet_config());
        let (_, private) = new_identity(&f).await;

        let old = Token::issue(&private, Duration::from_secs(60)).unwrap();
        let two_minutes_ago = current_timestamp_nanos() - 120 * 1_000_000_000;
        f.tokens.inner.persist(&old, two_minutes_ago).await.unwrap();

        f.tokens.close().await.unwrap();

        assert!(f.tokens.sweeper.lock().is_none());
        assert!(!f.storage.exists(CF_TOKEN, &old.id()).await.unwrap());
        assert!(ttl_entries(&f.storage).await.is_empty());

        // Second close is a no-op.
        f.tokens.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_tokens_survive_reopen_on_rocksdb() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db");
        let raw;

        {
            let storage = Arc::new(RocksDbStorage::open(&path).unwrap());
            let identities = Arc::new(LocalIdentityStore::new(Arc::clone(&storage)));
            let tokens = LocalTokenStore::open(Arc::clone(&storage), Arc::clone(&identities), quiet_config());

            let (_, private) = identities.new_identity("pw", &[]).await.unwrap();
            raw = tokens
                .new_token(&private, Duration::from_secs(30))
                .await
                .unwrap()
                .to_string();

            tokens.close().await.unwrap();
            identities.close().await.unwrap();
        }

        let storage = Arc::new(RocksDbStorage::open(&path).unwrap());
        let identities = Arc::new(LocalIdentityStore::new(Arc::clone(&storage)));
        let tokens = LocalTokenStore::open(storage, identities, quiet_config());

        assert!(tokens.verify(&raw).await.unwrap().valid());
        tokens.close().await.unwrap();
    }
}
