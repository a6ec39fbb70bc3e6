//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authenticated decryption failed.
    ///
    /// Wrong key, wrong sender, tampered ciphertext and truncated input all map here.
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// Invalid input data
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    /// Random number generation failed
    #[error("Random number generation failed: {0}")]
    RandomGenerationFailed(String),

    /// HKDF error
    #[error("HKDF error: insufficient output length")]
    HkdfError,
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
