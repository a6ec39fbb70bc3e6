//! Token store trait definitions.

use crate::{errors::Result, token::Token};
use async_trait::async_trait;
use identify_identity::PrivateIdentity;
use std::time::Duration;
use uuid::Uuid;

/// Persistent record of issued tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Issue a token for `identity` and record it.
    ///
    /// `max_age` is capped at the store's configured maximum.
    async fn new_token(&self, identity: &PrivateIdentity, max_age: Duration) -> Result<Token>;

    /// Like [`new_token`](TokenStore::new_token), granting `permissions`
    async fn new_token_with_permissions(
        &self,
        identity: &PrivateIdentity,
        max_age: Duration,
        permissions: &[String],
    ) -> Result<Token>;

    /// Parse and verify the signature of `raw` against the claimed identity's key.
    ///
    /// Does not check expiry or revocation.
    async fn parse(&self, raw: &str) -> Result<Token>;

    /// Parse `raw` and require it to be unexpired and still recorded.
    async fn verify(&self, raw: &str) -> Result<Token>;

    /// Revoke a token. Only the identity it was issued to may do this.
    async fn delete(&self, identity_id: Uuid, jti: Uuid) -> Result<()>;

    /// Remove every token issued more than the store's maximum age, plus one second, ago.
    ///
    /// Returns the number of tokens removed.
    async fn sweep(&self) -> Result<usize>;

    /// Stop the background sweeper, run a final sweep and flush. Later calls do nothing.
    async fn close(&self) -> Result<()>;
}
