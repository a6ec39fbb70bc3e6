//! Authenticated encryption using XChaCha20-Poly1305.
//!
//! Three constructions share the same AEAD:
//!
//! - symmetric sealing under a caller-held key (private bundles at rest)
//! - authenticated boxes: key = HKDF(X25519(sender, recipient))
//! - anonymous boxes: a fresh ephemeral sender per message, output `ephemeral_pk || ciphertext`
//!
//! Every open path reports failure as [`CryptoError::AuthenticationFailure`] and never returns
//! partial plaintext.

use crate::{
    constants::*,
    derivation::hkdf_derive_32,
    errors::*,
    hashing::blake3_hash,
    keys::X25519KeyPair,
};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroizing;

/// Encrypt data using XChaCha20-Poly1305 AEAD
///
/// # Arguments
///
/// * `key` - 32-byte encryption key
/// * `plaintext` - Data to encrypt
/// * `nonce` - 24-byte nonce (MUST be unique per key)
/// * `aad` - Associated authenticated data (not encrypted, but authenticated)
///
/// # Returns
///
/// Ciphertext with 16-byte authentication tag appended
pub fn encrypt(
    key: &[u8; SYMMETRIC_KEY_SIZE],
    plaintext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let xnonce = XNonce::from_slice(nonce);

    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(xnonce, payload)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Decrypt data using XChaCha20-Poly1305 AEAD
///
/// The tag comparison inside the AEAD is constant time.
pub fn decrypt(
    key: &[u8; SYMMETRIC_KEY_SIZE],
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let xnonce = XNonce::from_slice(nonce);

    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(xnonce, payload)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// Seal `plaintext` under a symmetric key.
pub fn symmetric_seal(
    plaintext: &[u8],
    key: &[u8; SYMMETRIC_KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Vec<u8>> {
    encrypt(key, plaintext, nonce, DOMAIN_PRIVATE_BUNDLE.as_bytes())
}

/// Open a ciphertext produced by [`symmetric_seal`].
pub fn symmetric_open(
    ciphertext: &[u8],
    key: &[u8; SYMMETRIC_KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Zeroizing<Vec<u8>>> {
    decrypt(key, ciphertext, nonce, DOMAIN_PRIVATE_BUNDLE.as_bytes())
}

fn box_key(
    local: &X25519KeyPair,
    remote_public: &[u8; PUBLIC_KEY_SIZE],
    domain: &str,
) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>> {
    let shared = local.diffie_hellman(remote_public);
    hkdf_derive_32(&shared[..], domain.as_bytes())
}

/// Seal `plaintext` from `sender` to the holder of `recipient_public`.
///
/// Only the recipient's private key opens the result, and opening it requires the sender's
/// public key, which authenticates the sender. The caller supplies a fresh random nonce and
/// usually prepends it to the returned ciphertext.
pub fn seal(
    plaintext: &[u8],
    recipient_public: &[u8; PUBLIC_KEY_SIZE],
    sender: &X25519KeyPair,
    nonce: &[u8; NONCE_SIZE],
) -> Result<Vec<u8>> {
    let key = box_key(sender, recipient_public, DOMAIN_BOX)?;
    encrypt(&key, plaintext, nonce, DOMAIN_BOX.as_bytes())
}

/// Open a ciphertext produced by [`seal`].
pub fn open(
    ciphertext: &[u8],
    sender_public: &[u8; PUBLIC_KEY_SIZE],
    recipient: &X25519KeyPair,
    nonce: &[u8; NONCE_SIZE],
) -> Result<Zeroizing<Vec<u8>>> {
    let key = box_key(recipient, sender_public, DOMAIN_BOX)?;
    decrypt(&key, ciphertext, nonce, DOMAIN_BOX.as_bytes())
}

fn anonymous_nonce(
    ephemeral_public: &[u8; PUBLIC_KEY_SIZE],
    recipient_public: &[u8; PUBLIC_KEY_SIZE],
) -> [u8; NONCE_SIZE] {
    let mut input = [0u8; PUBLIC_KEY_SIZE * 2];
    input[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public);
    input[PUBLIC_KEY_SIZE..].copy_from_slice(recipient_public);

    let digest = blake3_hash(&input);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&digest[..NONCE_SIZE]);
    nonce
}

/// Seal `plaintext` to `recipient_public` without authenticating the sender.
///
/// A fresh ephemeral keypair is generated per call and dropped before returning.
///
/// Output format: `ephemeral_public(32) || ciphertext || tag(16)`
pub fn seal_anonymous(plaintext: &[u8], recipient_public: &[u8; PUBLIC_KEY_SIZE]) -> Result<Vec<u8>> {
    let ephemeral = X25519KeyPair::generate()?;
    let ephemeral_public = ephemeral.public_key_bytes();

    let key = box_key(&ephemeral, recipient_public, DOMAIN_ANONYMOUS_BOX)?;
    let nonce = anonymous_nonce(&ephemeral_public, recipient_public);
    let ciphertext = encrypt(&key, plaintext, &nonce, DOMAIN_ANONYMOUS_BOX.as_bytes())?;

    let mut sealed = Vec::with_capacity(PUBLIC_KEY_SIZE + ciphertext.len());
    sealed.extend_from_slice(&ephemeral_public);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a ciphertext produced by [`seal_anonymous`] with the recipient's keypair.
pub fn open_anonymous(sealed: &[u8], recipient: &X25519KeyPair) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < ANONYMOUS_OVERHEAD {
        return Err(CryptoError::AuthenticationFailure);
    }

    let (ephemeral, ciphertext) = sealed.split_at(PUBLIC_KEY_SIZE);
    let mut ephemeral_public = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_public.copy_from_slice(ephemeral);

    let key = box_key(recipient, &ephemeral_public, DOMAIN_ANONYMOUS_BOX)?;
    let nonce = anonymous_nonce(&ephemeral_public, &recipient.public_key_bytes());
    decrypt(&key, ciphertext, &nonce, DOMAIN_ANONYMOUS_BOX.as_bytes())
}

/// Split a `nonce || ciphertext` blob.
///
/// Returns `None` when the blob cannot hold a nonce and a tag.
pub fn split_nonce_prefix(blob: &[u8]) -> Option<([u8; NONCE_SIZE], &[u8])> {
    if blob.len() < PREFIXED_OVERHEAD {
        return None;
    }

    let (prefix, ciphertext) = blob.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(prefix);
    Some((nonce, ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_nonce;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [42u8; 32];
        let plaintext = b"secret message";
        let nonce = generate_nonce().unwrap();
        let aad = b"additional authenticated data";

        let ciphertext = encrypt(&key, plaintext, &nonce, aad).unwrap();
        let decrypted = decrypt(&key, &ciphertext, &nonce, aad).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn test_symmetric_open_with_wrong_key() {
        let nonce = generate_nonce().unwrap();
        let ciphertext = symmetric_seal(b"bundle", &[1u8; 32], &nonce).unwrap();

        let result = symmetric_open(&ciphertext, &[2u8; 32], &nonce);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_symmetric_open_with_tampered_ciphertext() {
        let key = [9u8; 32];
        let nonce = generate_nonce().unwrap();
        let mut ciphertext = symmetric_seal(b"bundle", &key, &nonce).unwrap();
        ciphertext[0] ^= 0x01;

        assert!(symmetric_open(&ciphertext, &key, &nonce).is_err());
    }

    #[test]
    fn test_box_roundtrip_between_two_parties() {
        let alice = X25519KeyPair::generate().unwrap();
        let bob = X25519KeyPair::generate().unwrap();
        let nonce = generate_nonce().unwrap();

        let ciphertext = seal(b"hello bob", &bob.public_key_bytes(), &alice, &nonce).unwrap();
        let plaintext = open(&ciphertext, &alice.public_key_bytes(), &bob, &nonce).unwrap();

        assert_eq!(plaintext.as_slice(), b"hello bob");
    }

    #[test]
    fn test_box_rejects_third_party() {
        let alice = X25519KeyPair::generate().unwrap();
        let bob = X25519KeyPair::generate().unwrap();
        let carol = X25519KeyPair::generate().unwrap();
        let nonce = generate_nonce().unwrap();

        let ciphertext = seal(b"hello bob", &bob.public_key_bytes(), &alice, &nonce).unwrap();

        let result = open(&ciphertext, &alice.public_key_bytes(), &carol, &nonce);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_box_rejects_wrong_sender() {
        let alice = X25519KeyPair::generate().unwrap();
        let bob = X25519KeyPair::generate().unwrap();
        let mallory = X25519KeyPair::generate().unwrap();
        let nonce = generate_nonce().unwrap();

        let ciphertext = seal(b"hello bob", &bob.public_key_bytes(), &alice, &nonce).unwrap();

        assert!(open(&ciphertext, &mallory.public_key_bytes(), &bob, &nonce).is_err());
    }

    #[test]
    fn test_anonymous_roundtrip() {
        let recipient = X25519KeyPair::generate().unwrap();

        let sealed = seal_anonymous(b"v1", &recipient.public_key_bytes()).unwrap();
        assert_eq!(sealed.len(), 2 + ANONYMOUS_OVERHEAD);

        let opened = open_anonymous(&sealed, &recipient).unwrap();
        assert_eq!(opened.as_slice(), b"v1");
    }

    #[test]
    fn test_anonymous_uses_fresh_ephemeral_key() {
        let recipient = X25519KeyPair::generate().unwrap();

        let first = seal_anonymous(b"same", &recipient.public_key_bytes()).unwrap();
        let second = seal_anonymous(b"same", &recipient.public_key_bytes()).unwrap();

        assert_ne!(first, second);
        assert_ne!(first[..PUBLIC_KEY_SIZE], second[..PUBLIC_KEY_SIZE]);
    }

    #[test]
    fn test_anonymous_rejects_other_recipient() {
        let recipient = X25519KeyPair::generate().unwrap();
        let other = X25519KeyPair::generate().unwrap();

        let sealed = seal_anonymous(b"v1", &recipient.public_key_bytes()).unwrap();

        let result = open_anonymous(&sealed, &other);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_anonymous_rejects_truncated_input() {
        let recipient = X25519KeyPair::generate().unwrap();

        let result = open_anonymous(&[0u8; ANONYMOUS_OVERHEAD - 1], &recipient);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_split_nonce_prefix() {
        let mut blob = vec![7u8; NONCE_SIZE];
        blob.extend_from_slice(&[1u8; TAG_SIZE + 3]);

        let (nonce, rest) = split_nonce_prefix(&blob).unwrap();
        assert_eq!(nonce, [7u8; NONCE_SIZE]);
        assert_eq!(rest.len(), TAG_SIZE + 3);

        assert!(split_nonce_prefix(&blob[..PREFIXED_OVERHEAD - 1]).is_none());
    }
}
