//! Identity store trait definitions.

use crate::{
    errors::Result,
    identity::{PrivateIdentity, PublicIdentity},
};
use async_trait::async_trait;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Persistent store of identities, aliases and sealed secrets
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an identity and persist it with its aliases in one transaction.
    ///
    /// Fails with `AliasTaken` if any alias already resolves to an identity; nothing is
    /// written in that case.
    async fn new_identity(
        &self,
        passphrase: &str,
        aliases: &[String],
    ) -> Result<(PublicIdentity, PrivateIdentity)>;

    /// Look up an identity by id, falling back to the alias index.
    async fn get_identity(&self, id_or_alias: &str) -> Result<PublicIdentity>;

    /// Look up an identity by id only
    async fn get_identity_by_id(&self, id: Uuid) -> Result<PublicIdentity>;

    /// Seal `value` to `owner` and store it under `key`, replacing any previous value.
    async fn put_secret(&self, owner: &PublicIdentity, key: &str, value: &[u8]) -> Result<()>;

    /// Read and open the secret under `key`.
    ///
    /// `NotFound` if nothing is stored, `AuthenticationFailure` if it was sealed to
    /// another identity.
    async fn get_secret(&self, caller: &PrivateIdentity, key: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Flush the underlying engine. Later calls do nothing.
    async fn close(&self) -> Result<()>;
}
