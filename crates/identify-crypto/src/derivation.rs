//! Key derivation.
//!
//! Box keys come from HKDF-SHA256 over an X25519 shared secret. Passphrase keys are a single
//! SHA-256 over the passphrase bytes, which is fast to brute-force; see `passphrase_key`.

use crate::{constants::*, errors::*, hashing::sha256};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Derive a key using HKDF-SHA256
///
/// # Arguments
///
/// * `ikm` - Input key material
/// * `info` - Domain separation string and context
/// * `output_len` - Length of output key material
pub fn hkdf_derive(ikm: &[u8], info: &[u8], output_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut output = Zeroizing::new(vec![0u8; output_len]);

    hkdf.expand(info, &mut output)
        .map_err(|_| CryptoError::HkdfError)?;

    Ok(output)
}

/// Derive a 32-byte key using HKDF-SHA256
pub fn hkdf_derive_32(ikm: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let output = hkdf_derive(ikm, info, 32)?;
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&output);
    Ok(key)
}

/// Derive the symmetric key protecting a private bundle from a passphrase.
///
/// One round of SHA-256, no salt. Every identity with the same passphrase gets the same
/// key, and offline guessing costs one hash per attempt. Replacing this with a salted,
/// memory-hard KDF changes the on-disk bundle format.
pub fn passphrase_key(passphrase: &[u8]) -> Zeroizing<[u8; SYMMETRIC_KEY_SIZE]> {
    Zeroizing::new(sha256(passphrase))
}
