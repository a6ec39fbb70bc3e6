//! Cryptographic constants and domain separation strings.
//!
//! Sizes and domain strings are part of the persisted format: sealed secrets and private
//! bundles written under one set of values cannot be opened under another.

/// Size of public keys (Ed25519 and X25519) in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of X25519 secret keys and Ed25519 seeds in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of an Ed25519 keypair encoding (seed || public key) in bytes
pub const SIGNING_KEYPAIR_SIZE: usize = 64;

/// Size of Ed25519 signatures in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Size of XChaCha20-Poly1305 nonces in bytes (192 bits)
pub const NONCE_SIZE: usize = 24;

/// Size of XChaCha20-Poly1305 authentication tags in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of symmetric keys in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Bytes an anonymous box adds to its plaintext: ephemeral public key and tag
pub const ANONYMOUS_OVERHEAD: usize = PUBLIC_KEY_SIZE + TAG_SIZE;

/// Bytes a nonce-prefixed box adds to its plaintext: nonce and tag
pub const PREFIXED_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Domain separation for authenticated box keys
/// Format: HKDF(X25519(sender, recipient), "identify:box:v1")
pub const DOMAIN_BOX: &str = "identify:box:v1";

/// Domain separation for anonymous box keys
/// Format: HKDF(X25519(ephemeral, recipient), "identify:anonymous-box:v1")
pub const DOMAIN_ANONYMOUS_BOX: &str = "identify:anonymous-box:v1";

/// Associated data for private bundles sealed under a passphrase key
pub const DOMAIN_PRIVATE_BUNDLE: &str = "identify:private-bundle:v1";
