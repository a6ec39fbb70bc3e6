//! Bucket (column family) definitions.
//!
//! The bucket names and key encodings are the persisted-state contract other tooling can
//! rely on. Keys and values are bincode encoded.

/// Public identity records: identity_id → PublicIdentity
pub const CF_IDENTITY: &str = "identity";

/// Alias index: alias → identity_id
pub const CF_ALIAS: &str = "alias";

/// Sealed secrets: key → anonymous box sealed to the owner
pub const CF_SECRET: &str = "secret";

/// Token primary index: jti → identity_id
pub const CF_TOKEN: &str = "token";

/// Token time index: issued_at_nanos (big-endian u64) || jti → jti
pub const CF_TOKEN_TTL: &str = "token-ttl";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![CF_IDENTITY, CF_ALIAS, CF_SECRET, CF_TOKEN, CF_TOKEN_TTL]
}
