//! Identity store over the embedded key-value engine.

use crate::{
    errors::{IdentityError, Result},
    identity::{PrivateIdentity, PublicIdentity},
    traits::IdentityStore,
};
use async_trait::async_trait;
use identify_storage::{BatchExt, Storage, CF_ALIAS, CF_IDENTITY, CF_SECRET};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

/// [`IdentityStore`] backed by a [`Storage`] engine
pub struct LocalIdentityStore<S: Storage> {
    storage: Arc<S>,
    closed: AtomicBool,
}

impl<S: Storage> LocalIdentityStore<S> {
    /// Create a store over `storage`
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            closed: AtomicBool::new(false),
        }
    }

    fn validate_aliases(aliases: &[String]) -> Result<()> {
        let mut seen = HashSet::with_capacity(aliases.len());

        for alias in aliases {
            if alias.trim().is_empty() {
                return Err(IdentityError::MalformedInput("empty alias".to_string()));
            }
            // Would shadow the id lookup in get_identity.
            if Uuid::parse_str(alias).is_ok() {
                return Err(IdentityError::MalformedInput(format!(
                    "alias looks like an identity id: {}",
                    alias
                )));
            }
            if !seen.insert(alias.as_str()) {
                return Err(IdentityError::MalformedInput(format!(
                    "duplicate alias: {}",
                    alias
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<S: Storage + 'static> IdentityStore for LocalIdentityStore<S> {
    async fn new_identity(
        &self,
        passphrase: &str,
        aliases: &[String],
    ) -> Result<(PublicIdentity, PrivateIdentity)> {
        Self::validate_aliases(aliases)?;

        let (public, private) = PublicIdentity::create(passphrase)?;
        let id = public.id();

        let mut batch = self.storage.begin_transaction().await?;

        for alias in aliases {
            let existing: Option<Uuid> = batch.get(CF_ALIAS, alias)?;
            if let Some(owner) = existing {
                warn!(alias = %alias, owner = %owner, "Alias already taken");
                batch.rollback();
                return Err(IdentityError::AliasTaken(alias.clone()));
            }
        }

        batch.put(CF_IDENTITY, &id, &public)?;
        for alias in aliases {
            batch.put(CF_ALIAS, alias, &id)?;
        }
        batch.commit().await?;

        info!(identity_id = %id, aliases = aliases.len(), "Identity created");
        Ok((public, private))
    }

    async fn get_identity(&self, id_or_alias: &str) -> Result<PublicIdentity> {
        if let Ok(id) = Uuid::parse_str(id_or_alias) {
            return self.get_identity_by_id(id).await;
        }

        let alias = id_or_alias.to_string();
        let id: Uuid = self
            .storage
            .get(CF_ALIAS, &alias)
            .await?
            .ok_or_else(|| IdentityError::NotFound(format!("identity {}", id_or_alias)))?;

        self.get_identity_by_id(id).await
    }

    async fn get_identity_by_id(&self, id: Uuid) -> Result<PublicIdentity> {
        self.storage
            .get(CF_IDENTITY, &id)
            .await?
            .ok_or_else(|| IdentityError::NotFound(format!("identity {}", id)))
    }

    async fn put_secret(&self, owner: &PublicIdentity, key: &str, value: &[u8]) -> Result<()> {
        let sealed = owner.seal_anonymous(value)?;

        self.storage.put(CF_SECRET, &key.to_string(), &sealed).await?;

        debug!(owner = %owner.id(), key, "Secret stored");
        Ok(())
    }

    async fn get_secret(&self, caller: &PrivateIdentity, key: &str) -> Result<Zeroizing<Vec<u8>>> {
        let sealed: Vec<u8> = self
            .storage
            .get(CF_SECRET, &key.to_string())
            .await?
            .ok_or_else(|| IdentityError::NotFound(format!("secret {}", key)))?;

        caller.open_anonymous(&sealed).map_err(|_| {
            debug!(caller = %caller.id(), key, "Secret not sealed to caller");
            IdentityError::AuthenticationFailure
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.storage.flush().await?;
        info!("Identity store closed");
        Ok(())
    }
}
