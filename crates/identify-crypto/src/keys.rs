//! Key generation and management.
//!
//! Identities carry two keypairs: an Ed25519 pair for signatures (tokens, detached
//! signatures) and an X25519 pair for sealing. Both are generated from fresh random seeds
//! and can be exported to fixed-size byte arrays for the private bundle.

use crate::{constants::*, errors::*};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;
use std::fmt;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret as X25519PrivateKey};
use zeroize::Zeroizing;

/// Fill a fixed-size array from the thread RNG.
///
/// An RNG failure is fatal to the operation that asked for randomness and is reported as
/// [`CryptoError::RandomGenerationFailed`].
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    rand::thread_rng()
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(bytes)
}

/// Generate a random 24-byte XChaCha20 nonce
pub fn generate_nonce() -> Result<[u8; NONCE_SIZE]> {
    random_bytes::<NONCE_SIZE>()
}

/// Ed25519 signing key pair
#[derive(Clone)]
pub struct Ed25519KeyPair {
    /// Private signing key (32-byte seed)
    private_key: SigningKey,
    /// Public verification key (32 bytes)
    public_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new key pair from a random seed
    pub fn generate() -> Result<Self> {
        let seed = Zeroizing::new(random_bytes::<PRIVATE_KEY_SIZE>()?);
        Ok(Self::from_seed(&seed))
    }

    /// Build a key pair from a 32-byte seed
    pub fn from_seed(seed: &[u8; PRIVATE_KEY_SIZE]) -> Self {
        let private_key = SigningKey::from_bytes(seed);
        let public_key = private_key.verifying_key();

        Self {
            private_key,
            public_key,
        }
    }

    /// Rebuild a key pair from its 64-byte encoding (seed || public key).
    ///
    /// Fails if the public half does not match the seed.
    pub fn from_keypair_bytes(bytes: &[u8; SIGNING_KEYPAIR_SIZE]) -> Result<Self> {
        let private_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| CryptoError::InvalidInput("inconsistent Ed25519 keypair".to_string()))?;
        let public_key = private_key.verifying_key();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Export the 64-byte private key encoding (seed || public key)
    ///
    /// # Security
    ///
    /// Never log or persist the returned bytes unencrypted.
    pub fn to_keypair_bytes(&self) -> Zeroizing<[u8; SIGNING_KEYPAIR_SIZE]> {
        Zeroizing::new(self.private_key.to_keypair_bytes())
    }

    /// Export the 32-byte seed
    pub fn seed_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        Zeroizing::new(self.private_key.to_bytes())
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.to_bytes()
    }

    /// Get a reference to the private key
    pub fn private_key(&self) -> &SigningKey {
        &self.private_key
    }

    /// Get a reference to the public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }
}

impl PartialEq for Ed25519KeyPair {
    fn eq(&self, other: &Self) -> bool {
        crate::constant_time_compare(&self.seed_bytes()[..], &other.seed_bytes()[..])
    }
}

impl Eq for Ed25519KeyPair {}

impl fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("public_key", &crate::hex_fingerprint(&self.public_key_bytes()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// X25519 sealing key pair
#[derive(Clone)]
pub struct X25519KeyPair {
    /// Private sealing key (32 bytes)
    private_key: X25519PrivateKey,
    /// Public sealing key (32 bytes)
    public_key: X25519PublicKey,
}

impl X25519KeyPair {
    /// Generate a new key pair from a random secret
    pub fn generate() -> Result<Self> {
        let secret = Zeroizing::new(random_bytes::<PRIVATE_KEY_SIZE>()?);
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Build a key pair from a 32-byte secret
    pub fn from_secret_bytes(secret: &[u8; PRIVATE_KEY_SIZE]) -> Self {
        let private_key = X25519PrivateKey::from(*secret);
        let public_key = X25519PublicKey::from(&private_key);

        Self {
            private_key,
            public_key,
        }
    }

    /// Export the 32-byte secret
    ///
    /// # Security
    ///
    /// Never log or persist the returned bytes unencrypted.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        Zeroizing::new(self.private_key.to_bytes())
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public_key.as_bytes()
    }

    /// Get a reference to the public key
    pub fn public_key(&self) -> &X25519PublicKey {
        &self.public_key
    }

    /// Perform Diffie-Hellman key agreement
    pub fn diffie_hellman(&self, their_public: &[u8; PUBLIC_KEY_SIZE]) -> Zeroizing<[u8; 32]> {
        let shared_secret = self
            .private_key
            .diffie_hellman(&X25519PublicKey::from(*their_public));
        Zeroizing::new(*shared_secret.as_bytes())
    }
}

impl PartialEq for X25519KeyPair {
    fn eq(&self, other: &Self) -> bool {
        crate::constant_time_compare(&self.secret_bytes()[..], &other.secret_bytes()[..])
    }
}

impl Eq for X25519KeyPair {}

impl fmt::Debug for X25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X25519KeyPair")
            .field("public_key", &crate::hex_fingerprint(&self.public_key_bytes()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}
