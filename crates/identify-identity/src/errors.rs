//! Identity error types.

use identify_crypto::CryptoError;
use identify_storage::StorageError;
use thiserror::Error;

/// Identity and identity store errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong passphrase, wrong recipient or tampered ciphertext.
    ///
    /// Carries no detail on purpose.
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// Unknown identity, alias or secret
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unparsable or rejected input
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Alias already points at an identity
    #[error("Alias already taken: {0}")]
    AliasTaken(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cryptographic failure other than authentication (RNG, KDF)
    #[error("Crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for IdentityError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AuthenticationFailure | CryptoError::SignatureVerificationFailed => {
                IdentityError::AuthenticationFailure
            }
            other => IdentityError::Crypto(other),
        }
    }
}

/// Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
