//! Private key bundle encoding.
//!
//! Layout (97 bytes):
//!
//! ```text
//! version(1) || ed25519 keypair(64) || x25519 secret(32)
//! ```
//!
//! The bundle is only ever stored sealed under the passphrase key. Decoding failures are
//! reported as [`IdentityError::AuthenticationFailure`] so a caller cannot tell a corrupt
//! bundle from a wrong passphrase.

use crate::errors::{IdentityError, Result};
use identify_crypto::{
    Ed25519KeyPair, X25519KeyPair, PRIVATE_KEY_SIZE, SIGNING_KEYPAIR_SIZE, TAG_SIZE,
};
use zeroize::Zeroizing;

/// Current bundle format version
pub const BUNDLE_VERSION: u8 = 0x01;

/// Length of an encoded bundle
pub const BUNDLE_LEN: usize = 1 + SIGNING_KEYPAIR_SIZE + PRIVATE_KEY_SIZE;

/// Length of a sealed bundle, excluding the nonce prefix
pub const SEALED_BUNDLE_LEN: usize = BUNDLE_LEN + TAG_SIZE;

/// Encode both private keys into a bundle
pub fn encode(signing: &Ed25519KeyPair, sealing: &X25519KeyPair) -> Zeroizing<Vec<u8>> {
    let mut bundle = Zeroizing::new(Vec::with_capacity(BUNDLE_LEN));
    bundle.push(BUNDLE_VERSION);
    bundle.extend_from_slice(&signing.to_keypair_bytes()[..]);
    bundle.extend_from_slice(&sealing.secret_bytes()[..]);
    bundle
}

/// Decode a bundle produced by [`encode`]
pub fn decode(bundle: &[u8]) -> Result<(Ed25519KeyPair, X25519KeyPair)> {
    if bundle.len() != BUNDLE_LEN || bundle[0] != BUNDLE_VERSION {
        return Err(IdentityError::AuthenticationFailure);
    }

    let signing_end = 1 + SIGNING_KEYPAIR_SIZE;

    let mut signing_bytes = Zeroizing::new([0u8; SIGNING_KEYPAIR_SIZE]);
    signing_bytes.copy_from_slice(&bundle[1..signing_end]);
    let signing = Ed25519KeyPair::from_keypair_bytes(&signing_bytes)
        .map_err(|_| IdentityError::AuthenticationFailure)?;

    let mut sealing_bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
    sealing_bytes.copy_from_slice(&bundle[signing_end..]);
    let sealing = X25519KeyPair::from_secret_bytes(&sealing_bytes);

    Ok((signing, sealing))
}
