//! Public and private identity views.

use crate::{
    bundle::{self, SEALED_BUNDLE_LEN},
    errors::{IdentityError, Result},
};
use identify_crypto::{
    current_timestamp, generate_nonce, hex_fingerprint, open, open_anonymous, passphrase_key,
    seal, seal_anonymous, sign_message, split_nonce_prefix, symmetric_open, symmetric_seal,
    verify_signature, Ed25519KeyPair, X25519KeyPair, NONCE_SIZE, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

// Stands in for a bundle too short to split, so it fails after the same amount of work.
static DECOY_SEALED_BUNDLE: [u8; SEALED_BUNDLE_LEN] = [0u8; SEALED_BUNDLE_LEN];

/// Public view of an identity.
///
/// Safe to store and share. Holds the two public keys and the private bundle sealed
/// under the passphrase key (`nonce(24) || ciphertext`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    id: Uuid,
    signing_public_key: [u8; PUBLIC_KEY_SIZE],
    sealing_public_key: [u8; PUBLIC_KEY_SIZE],
    encrypted_private_bundle: Vec<u8>,
    created_at: u64,
}

impl PublicIdentity {
    /// Create a new identity protected by `passphrase`.
    ///
    /// Generates fresh signing and sealing keypairs and seals them into the public record.
    /// Fails only if the random source fails.
    pub fn create(passphrase: &str) -> Result<(PublicIdentity, PrivateIdentity)> {
        let signing = Ed25519KeyPair::generate()?;
        let sealing = X25519KeyPair::generate()?;

        let key = passphrase_key(passphrase.as_bytes());
        let nonce = generate_nonce()?;
        let plaintext = bundle::encode(&signing, &sealing);
        let ciphertext = symmetric_seal(&plaintext, &key, &nonce)?;

        let mut encrypted_private_bundle = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        encrypted_private_bundle.extend_from_slice(&nonce);
        encrypted_private_bundle.extend_from_slice(&ciphertext);

        let public = PublicIdentity {
            id: Uuid::new_v4(),
            signing_public_key: signing.public_key_bytes(),
            sealing_public_key: sealing.public_key_bytes(),
            encrypted_private_bundle,
            created_at: current_timestamp(),
        };

        debug!(identity_id = %public.id, "Generated identity keys");

        let private = PrivateIdentity {
            public: public.clone(),
            signing,
            sealing,
        };

        Ok((public, private))
    }

    /// Unlock the private view with `passphrase`.
    ///
    /// Every failure (wrong passphrase, truncated or corrupt bundle) is reported as
    /// [`IdentityError::AuthenticationFailure`].
    pub fn authenticate(&self, passphrase: &str) -> Result<PrivateIdentity> {
        let key = passphrase_key(passphrase.as_bytes());

        let (nonce, ciphertext) = split_nonce_prefix(&self.encrypted_private_bundle)
            .unwrap_or(([0u8; NONCE_SIZE], &DECOY_SEALED_BUNDLE[..]));

        let plaintext = symmetric_open(ciphertext, &key, &nonce)?;
        let (signing, sealing) = bundle::decode(&plaintext)?;

        if signing.public_key_bytes() != self.signing_public_key
            || sealing.public_key_bytes() != self.sealing_public_key
        {
            return Err(IdentityError::AuthenticationFailure);
        }

        Ok(PrivateIdentity {
            public: self.clone(),
            signing,
            sealing,
        })
    }

    /// A stand-in record that no passphrase unlocks.
    ///
    /// Its sealed bundle has the same length as a real one, so authenticating against it
    /// costs the same as a wrong passphrase on a real identity. Use it when a lookup fails
    /// so the failure does not reveal whether the identity exists.
    pub fn decoy() -> PublicIdentity {
        PublicIdentity {
            id: Uuid::nil(),
            signing_public_key: [0u8; PUBLIC_KEY_SIZE],
            sealing_public_key: [0u8; PUBLIC_KEY_SIZE],
            encrypted_private_bundle: vec![0u8; NONCE_SIZE + SEALED_BUNDLE_LEN],
            created_at: 0,
        }
    }

    /// Seal `plaintext` so that only this identity can open it.
    ///
    /// Needs no credentials: any party may seal data to an identity.
    pub fn seal_anonymous(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(seal_anonymous(plaintext, &self.sealing_public_key)?)
    }

    /// Verify a detached signature made by this identity
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> Result<()> {
        Ok(verify_signature(&self.signing_public_key, message, signature)?)
    }

    /// Identity id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ed25519 public key used to verify this identity's signatures and tokens
    pub fn signing_public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.signing_public_key
    }

    /// X25519 public key used to seal data to this identity
    pub fn sealing_public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.sealing_public_key
    }

    /// The sealed private bundle (`nonce || ciphertext`)
    pub fn encrypted_private_bundle(&self) -> &[u8] {
        &self.encrypted_private_bundle
    }

    /// Creation time, Unix seconds
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

impl fmt::Display for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicIdentity")
            .field("id", &self.id)
            .field("signing_public_key", &hex_fingerprint(&self.signing_public_key))
            .field("sealing_public_key", &hex_fingerprint(&self.sealing_public_key))
            .field("encrypted_private_bundle_len", &self.encrypted_private_bundle.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Private view of an identity.
///
/// Produced by [`PublicIdentity::create`] or [`PublicIdentity::authenticate`]. Holds
/// cleartext private keys for the duration of one request or command; do not cache it.
#[derive(Clone)]
pub struct PrivateIdentity {
    public: PublicIdentity,
    signing: Ed25519KeyPair,
    sealing: X25519KeyPair,
}

impl PrivateIdentity {
    /// The public view this was unlocked from
    pub fn public(&self) -> &PublicIdentity {
        &self.public
    }

    /// Identity id
    pub fn id(&self) -> Uuid {
        self.public.id
    }

    /// Signing keypair, used to issue tokens
    pub fn signing_keypair(&self) -> &Ed25519KeyPair {
        &self.signing
    }

    /// Sealing keypair
    pub fn sealing_keypair(&self) -> &X25519KeyPair {
        &self.sealing
    }

    /// Sign `message` with this identity's Ed25519 key
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        sign_message(&self.signing, message)
    }

    /// Seal `plaintext` from this identity to `recipient`.
    ///
    /// Output format: `nonce(24) || ciphertext || tag(16)`
    pub fn seal_message(&self, recipient: &PublicIdentity, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = generate_nonce()?;
        let ciphertext = seal(plaintext, &recipient.sealing_public_key, &self.sealing, &nonce)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a message `sender` sealed to this identity with [`seal_message`](Self::seal_message)
    pub fn open_message(
        &self,
        sender: &PublicIdentity,
        sealed: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let (nonce, ciphertext) =
            split_nonce_prefix(sealed).ok_or(IdentityError::AuthenticationFailure)?;

        Ok(open(ciphertext, &sender.sealing_public_key, &self.sealing, &nonce)?)
    }

    /// Seal `plaintext` to this identity without sender authentication
    pub fn seal_anonymous(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.public.seal_anonymous(plaintext)
    }

    /// Open data sealed to this identity with [`PublicIdentity::seal_anonymous`]
    pub fn open_anonymous(&self, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Ok(open_anonymous(sealed, &self.sealing)?)
    }
}

impl fmt::Debug for PrivateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateIdentity")
            .field("id", &self.public.id)
            .field("keys", &"<redacted>")
            .finish()
    }
}
