//! Digital signature operations using Ed25519.

use crate::{constants::*, errors::*, keys::Ed25519KeyPair};
use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

/// Sign a message with Ed25519
///
/// # Returns
///
/// 64-byte detached Ed25519 signature
pub fn sign_message(keypair: &Ed25519KeyPair, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let signature = keypair.private_key().sign(message);
    signature.to_bytes()
}

/// Verify a detached Ed25519 signature
///
/// # Returns
///
/// `Ok(())` if signature is valid, `Err` otherwise
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> Result<()> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|_| CryptoError::SignatureVerificationFailed)?;

    let sig = Signature::from_bytes(signature);

    verifying_key
        .verify_strict(message, &sig)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Boolean form of [`verify_signature`]
pub fn is_valid_signature(
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> bool {
    verify_signature(public_key, message, signature).is_ok()
}
